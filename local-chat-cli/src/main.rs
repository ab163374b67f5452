//! CLI entry point for local-chat

use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use dialoguer::{Input, Select};
use local_chat_agent::{
    Command, CommandResponse, SessionController, SessionState, TitleOutcome, TurnOutcome,
};
use local_chat_core::config::{Config, ConfigLoader};
use local_chat_core::logging::init_logging;
use local_chat_core::session::{ConversationStore, Message, PersistenceGateway, Role};
use local_chat_providers::{ChatProvider, GuardedProvider, OllamaClient};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "local-chat")]
#[command(about = "Chat with local Ollama models from the terminal")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration directory
    #[arg(short, long, global = true)]
    config_dir: Option<PathBuf>,

    /// Conversation store file
    #[arg(long, global = true)]
    store: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init,
    /// Start an interactive chat session
    Chat {
        /// Model to use
        #[arg(short, long)]
        model: Option<String>,
    },
    /// Send a single message and print the reply
    Send {
        /// Message to send
        #[arg(short = 'M', long)]
        message: String,
        /// Model to use
        #[arg(short, long)]
        model: Option<String>,
        /// Continue a stored conversation
        #[arg(long)]
        conversation: Option<String>,
    },
    /// List the models offered by the service
    Models,
    /// List stored conversations
    Conversations,
    /// Print a stored conversation
    Show {
        /// Conversation title
        title: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loader = if let Some(dir) = &cli.config_dir {
        ConfigLoader::with_dir(dir)
    } else {
        ConfigLoader::new()
    };

    if let Commands::Init = cli.command {
        return run_init(&loader);
    }

    let mut config = loader.load()?;
    if let Some(store) = &cli.store {
        config.session.store_path = store.display().to_string();
    }

    let log_dir = loader.log_dir(&config);
    let _guard = init_logging(&config.logging, &log_dir);

    match cli.command {
        Commands::Init => {}
        Commands::Chat { model } => {
            info!("Starting interactive chat");
            run_chat(&config, model).await?;
        }
        Commands::Send {
            message,
            model,
            conversation,
        } => {
            run_send(&config, &message, model, conversation).await?;
        }
        Commands::Models => {
            run_models(&config).await?;
        }
        Commands::Conversations => {
            run_conversations(&config)?;
        }
        Commands::Show { title } => {
            run_show(&config, &title)?;
        }
    }

    Ok(())
}

fn run_init(loader: &ConfigLoader) -> Result<()> {
    let path = loader.config_dir().join("config.json");
    if path.exists() {
        println!(
            "{} already exists, leaving it untouched",
            style(path.display()).cyan()
        );
        return Ok(());
    }

    loader.save(&Config::default())?;
    println!(
        "{} {}",
        style("Configuration written to").green().bold(),
        path.display()
    );
    Ok(())
}

fn build_provider(config: &Config) -> Arc<GuardedProvider> {
    let client = OllamaClient::from_config(&config.provider);
    Arc::new(GuardedProvider::with_timeout_secs(
        Arc::new(client),
        config.provider.request_timeout_secs,
    ))
}

fn open_store(config: &Config) -> Result<ConversationStore> {
    let gateway = PersistenceGateway::new(&config.session.store_path);
    let snapshot = gateway.load()?;
    Ok(ConversationStore::from_snapshot(
        snapshot,
        config.session.title_collision,
    ))
}

/// Build a controller and bring the session to `Ready`. With `open_new`
/// a fresh placeholder conversation becomes current.
async fn start_session(
    config: &Config,
    provider: Arc<GuardedProvider>,
    model: Option<String>,
    open_new: bool,
) -> Result<(SessionController, SessionState)> {
    let gateway = PersistenceGateway::new(&config.session.store_path);
    let mut controller = SessionController::new(provider, gateway, &config.session)?;
    let mut state = SessionState::new();

    let started = if open_new {
        controller.start(&mut state).await
    } else {
        controller.connect(&mut state).await
    };
    if let Err(e) = started {
        error!("Could not reach the completion service: {}", e);
        anyhow::bail!(
            "Could not reach the completion service at {}: {}",
            config.provider.api_base,
            e
        );
    }

    if let Some(model) = model {
        controller.select_model(&mut state, &model)?;
    }

    Ok((controller, state))
}

/// Send one message; Ctrl+C cancels the request in flight
async fn send_interruptible(
    controller: &mut SessionController,
    state: &mut SessionState,
    provider: &Arc<GuardedProvider>,
    text: &str,
) -> Result<CommandResponse> {
    let watcher = {
        let provider = provider.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                provider.cancel_pending();
            }
        })
    };

    let response = controller
        .dispatch(state, Command::SendMessage(text.to_string()))
        .await;
    watcher.abort();
    Ok(response?)
}

async fn run_send(
    config: &Config,
    message: &str,
    model: Option<String>,
    conversation: Option<String>,
) -> Result<()> {
    let provider = build_provider(config);
    let (mut controller, mut state) =
        start_session(config, provider.clone(), model, conversation.is_none()).await?;

    if let Some(title) = conversation {
        controller.select_conversation(&mut state, &title)?;
    }

    match send_interruptible(&mut controller, &mut state, &provider, message).await? {
        CommandResponse::Turn(Some(outcome)) => {
            print_turn(&outcome);
            if outcome.is_fallback() {
                anyhow::bail!("The completion service did not answer");
            }
        }
        _ => anyhow::bail!("Nothing to send: the message is empty"),
    }

    Ok(())
}

async fn run_models(config: &Config) -> Result<()> {
    let provider = build_provider(config);
    let models = provider.list_models().await?;

    if models.is_empty() {
        println!("{}", style("No models installed").yellow());
    }
    for (i, model) in models.iter().enumerate() {
        if i == 0 {
            println!("{} {}", model, style("(default)").dim());
        } else {
            println!("{}", model);
        }
    }
    Ok(())
}

fn run_conversations(config: &Config) -> Result<()> {
    let store = open_store(config)?;
    for title in store.list() {
        println!("{}", title);
    }
    Ok(())
}

fn run_show(config: &Config, title: &str) -> Result<()> {
    let store = open_store(config)?;
    let messages = store.get(title)?;
    println!("{}", style(title).bold().cyan());
    for message in messages {
        print_message(message);
    }
    Ok(())
}

async fn run_chat(config: &Config, model: Option<String>) -> Result<()> {
    let provider = build_provider(config);
    let (mut controller, mut state) = start_session(config, provider.clone(), model, true).await?;

    println!("{}", style("local-chat").bold().cyan());
    println!(
        "Model: {}  |  /help for commands",
        style(state.current_model().unwrap_or("<none>")).green()
    );

    loop {
        let line = match Input::<String>::new()
            .with_prompt(style("you").cyan().bold().to_string())
            .allow_empty(true)
            .interact_text()
        {
            Ok(line) => line,
            Err(e) => {
                warn!("Input closed: {}", e);
                break;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let result = if let Some(rest) = line.strip_prefix('/') {
            let (name, arg) = match rest.split_once(char::is_whitespace) {
                Some((name, arg)) => (name, Some(arg.trim()).filter(|a| !a.is_empty())),
                None => (rest, None),
            };
            match name {
                "quit" | "exit" => break,
                _ => run_slash_command(&mut controller, &mut state, name, arg).await,
            }
        } else {
            send_interruptible(&mut controller, &mut state, &provider, line)
                .await
                .map(|response| {
                    if let CommandResponse::Turn(Some(outcome)) = response {
                        print_turn(&outcome);
                    }
                })
        };

        if let Err(e) = result {
            eprintln!("{} {}", style("error:").red().bold(), e);
        }
    }

    println!("{}", style("Goodbye!").dim());
    Ok(())
}

async fn run_slash_command(
    controller: &mut SessionController,
    state: &mut SessionState,
    name: &str,
    arg: Option<&str>,
) -> Result<()> {
    match name {
        "new" => {
            if let CommandResponse::ConversationStarted { title } =
                controller.dispatch(state, Command::StartConversation).await?
            {
                println!("{} {}", style("Started").green(), title);
            }
        }
        "models" => {
            if let CommandResponse::Models(models) =
                controller.dispatch(state, Command::ListModels).await?
            {
                for model in models {
                    let marker = if state.current_model() == Some(model.as_str()) {
                        "*"
                    } else {
                        " "
                    };
                    println!("{} {}", style(marker).green(), model);
                }
            }
        }
        "model" => {
            let model = match arg {
                Some(model) => model.to_string(),
                None => match pick(
                    "Select model",
                    state.models(),
                    state.current_model(),
                )? {
                    Some(model) => model,
                    None => return Ok(()),
                },
            };
            if let CommandResponse::ModelSelected { model } =
                controller.dispatch(state, Command::SelectModel(model)).await?
            {
                println!("{} {}", style("Using model").green(), model);
            }
        }
        "list" => {
            let current = controller
                .current_conversation(state)
                .map(|c| c.title().to_string());
            if let CommandResponse::Conversations(titles) =
                controller.dispatch(state, Command::ListConversations).await?
            {
                for title in titles {
                    let marker = if current.as_deref() == Some(title.as_str()) {
                        "*"
                    } else {
                        " "
                    };
                    println!("{} {}", style(marker).green(), title);
                }
            }
        }
        "switch" => {
            let title = match arg {
                Some(title) => title.to_string(),
                None => {
                    let titles = controller.list_conversations(state)?;
                    let current = controller
                        .current_conversation(state)
                        .map(|c| c.title().to_string());
                    match pick("Select conversation", &titles, current.as_deref())? {
                        Some(title) => title,
                        None => return Ok(()),
                    }
                }
            };
            if let CommandResponse::ConversationSelected { title, messages } = controller
                .dispatch(state, Command::SelectConversation(title))
                .await?
            {
                println!("{}", style(&title).bold().cyan());
                for message in &messages {
                    print_message(message);
                }
            }
        }
        "history" => {
            for message in controller.current_messages(state) {
                print_message(message);
            }
        }
        "help" => print_help(),
        other => {
            println!("Unknown command /{} (try /help)", other);
        }
    }
    Ok(())
}

/// Interactive picker over `items`; `None` when there is nothing to pick
fn pick(prompt: &str, items: &[String], current: Option<&str>) -> Result<Option<String>> {
    if items.is_empty() {
        println!("{}", style("Nothing to choose from").yellow());
        return Ok(None);
    }

    let default = current
        .and_then(|c| items.iter().position(|i| i == c))
        .unwrap_or(0);
    let idx = Select::new()
        .with_prompt(prompt)
        .items(items)
        .default(default)
        .interact()?;
    Ok(items.get(idx).cloned())
}

fn print_message(message: &Message) {
    let label = match message.role() {
        Role::User => style("you>").cyan().bold(),
        Role::Assistant => style("assistant>").green().bold(),
    };
    println!("{} {}", label, message.content());
}

fn print_turn(outcome: &TurnOutcome) {
    if let Some(e) = &outcome.completion_error {
        eprintln!("{} {}", style("completion failed:").red().bold(), e);
    }
    print_message(&outcome.reply);

    match &outcome.title {
        TitleOutcome::Renamed { to, .. } => {
            println!("{}", style(format!("Conversation titled '{}'", to)).dim());
        }
        TitleOutcome::Failed(e) => {
            eprintln!("{}", style(format!("Could not title conversation: {}", e)).dim());
        }
        TitleOutcome::Skipped => {}
    }
}

fn print_help() {
    println!("{}", style("Commands").bold());
    println!("  /new             start a new conversation");
    println!("  /models          list available models");
    println!("  /model [NAME]    switch model (picker when no name)");
    println!("  /list            list conversations");
    println!("  /switch [TITLE]  open a conversation (picker when no title)");
    println!("  /history         show the current conversation");
    println!("  /help            show this help");
    println!("  /quit            leave");
}
