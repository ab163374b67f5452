//! Durable storage of all conversations as a single JSON document
//!
//! The document is one object mapping conversation title to an array of
//! `{role, content}` objects. Keys are written in display order, so
//! reloading and re-saving a document reproduces it byte for byte.

use super::store::Message;
use crate::{Error, Result};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Ordered title -> history pairs, the unit of persistence
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationSnapshot {
    entries: Vec<(String, Vec<Message>)>,
}

impl ConversationSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry. A replaced title keeps its position.
    pub fn insert(&mut self, title: String, messages: Vec<Message>) {
        match self.entries.iter_mut().find(|(t, _)| *t == title) {
            Some(entry) => entry.1 = messages,
            None => self.entries.push((title, messages)),
        }
    }

    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(t, _)| t.as_str())
    }

    pub fn get(&self, title: &str) -> Option<&[Message]> {
        self.entries
            .iter()
            .find(|(t, _)| t == title)
            .map(|(_, m)| m.as_slice())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<(String, Vec<Message>)> {
        self.entries
    }
}

impl Serialize for ConversationSnapshot {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (title, messages) in &self.entries {
            map.serialize_entry(title, messages)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ConversationSnapshot {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SnapshotVisitor;

        impl<'de> Visitor<'de> for SnapshotVisitor {
            type Value = ConversationSnapshot;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping conversation titles to message arrays")
            }

            fn visit_map<A>(self, mut access: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut snapshot = ConversationSnapshot::new();
                while let Some((title, messages)) = access.next_entry::<String, Vec<Message>>()? {
                    snapshot.insert(title, messages);
                }
                Ok(snapshot)
            }
        }

        deserializer.deserialize_map(SnapshotVisitor)
    }
}

/// Reads and writes the conversation document. Holds no conversation state.
#[derive(Debug, Clone)]
pub struct PersistenceGateway {
    path: PathBuf,
}

impl PersistenceGateway {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot. A missing document is an empty first-run state.
    pub fn load(&self) -> Result<ConversationSnapshot> {
        if !self.path.exists() {
            info!("No conversation document at {:?}, starting empty", self.path);
            return Ok(ConversationSnapshot::new());
        }

        let content = std::fs::read(&self.path)?;
        let snapshot: ConversationSnapshot = serde_json::from_slice(&content).map_err(|e| {
            Error::CorruptState(format!("{}: {}", self.path.display(), e))
        })?;

        debug!(
            "Loaded {} conversations from {:?}",
            snapshot.len(),
            self.path
        );
        Ok(snapshot)
    }

    /// Replace the document with `snapshot`.
    ///
    /// The bytes go to a sibling temp file first and are renamed over the
    /// target once synced.
    pub fn save(&self, snapshot: &ConversationSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let bytes = serde_json::to_vec(snapshot)?;
        let tmp_path = self.temp_path();

        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(&bytes)?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        if let Err(e) = std::fs::rename(&tmp_path, &self.path) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        debug!("Saved {} conversations to {:?}", snapshot.len(), self.path);
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "conversations.json".to_string());
        self.path
            .with_file_name(format!(".{}.tmp-{}", file_name, std::process::id()))
    }
}
