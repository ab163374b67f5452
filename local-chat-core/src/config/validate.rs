//! Configuration validation rules.

use super::schema::Config;

/// Validate configuration and return aggregated validation errors.
pub fn validate_config(config: &Config) -> crate::Result<()> {
    let mut errors = Vec::new();

    let api_base = config.provider.api_base.trim();
    if api_base.is_empty() {
        errors.push("provider.api_base must not be empty".to_string());
    } else if !(api_base.starts_with("http://") || api_base.starts_with("https://")) {
        errors.push("provider.api_base must start with http:// or https://".to_string());
    }

    if config.session.store_path.trim().is_empty() {
        errors.push("session.store_path must not be empty".to_string());
    }
    if config.session.placeholder_title.is_empty() {
        errors.push("session.placeholder_title must not be empty".to_string());
    }

    if !["text", "json"].contains(&config.logging.format.to_lowercase().as_str()) {
        errors.push("logging.format must be one of: text, json".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(crate::Error::Validation(errors.join("; ")))
    }
}
