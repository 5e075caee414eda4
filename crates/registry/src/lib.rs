//! mcpdesk server registry adapter.
//!
//! Implements [`domain::ServerStore`] over a single JSON document: an array
//! of `{id, name, host, port, protocol?}` objects in insertion order.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** File I/O, serialisation, and the degrade-to-empty read
//! policy live here. The connection manager and the bridge see only
//! [`domain::ServerStore`].
//!
//! ## Persistence
//!
//! - Every mutation re-reads the whole document, applies one change, and
//!   rewrites the whole document.
//! - Writes go to a sibling `*.tmp` file which is then renamed over the
//!   document, so a concurrent reader sees either the old or the new registry.
//! - Mutations are serialised within the process. Writers in *other*
//!   processes are not detected: last writer wins.
//! - A missing or corrupt document reads as an empty registry. Individual
//!   entries that fail to parse are skipped on read and preserved on write.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use domain::{RegistryError, ServerDescriptor, ServerId, ServerStore};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Why the registry document could not be loaded. Never leaves this crate.
#[derive(Debug, Error)]
enum LoadError {
    #[error("server list does not exist")]
    Missing,
    #[error("failed to read server list: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse server list: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One element of the document.
///
/// Elements that do not describe a usable server are hidden from callers but
/// written back unchanged, so a single odd entry never costs the others.
#[derive(Debug, Clone)]
enum Entry {
    Server(ServerDescriptor),
    Unrecognised(Value),
}

impl Entry {
    fn from_value(value: Value) -> Self {
        match serde_json::from_value(value.clone()) {
            Ok(server) => Entry::Server(server),
            Err(e) => {
                warn!(error = %e, "Ignoring unrecognised server list entry");
                Entry::Unrecognised(value)
            }
        }
    }

    fn id(&self) -> Option<&str> {
        match self {
            Entry::Server(server) => Some(server.id.as_str()),
            Entry::Unrecognised(value) => value.get("id").and_then(Value::as_str),
        }
    }

    fn to_value(&self) -> Result<Value, serde_json::Error> {
        match self {
            Entry::Server(server) => serde_json::to_value(server),
            Entry::Unrecognised(value) => Ok(value.clone()),
        }
    }
}

/// A [`ServerStore`] backed by one JSON file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    // Held across read-modify-write so two mutations from this process never
    // interleave.
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Creates a store for the document at `path`. The file need not exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the path of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Vec<Entry> {
        match read_document(&self.path).await {
            Ok(entries) => entries,
            Err(LoadError::Missing) => {
                debug!(path = %self.path.display(), "Server list not found; starting empty");
                Vec::new()
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Server list unreadable; treating as empty");
                Vec::new()
            }
        }
    }

    async fn save(&self, entries: &[Entry]) -> Result<(), RegistryError> {
        let document = entries
            .iter()
            .map(Entry::to_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(write_error)?;
        let body = serde_json::to_string_pretty(&document).map_err(write_error)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(write_error)?;
        }

        let tmp = temp_path(&self.path);
        tokio::fs::write(&tmp, body).await.map_err(write_error)?;
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(write_error(e));
        }

        debug!(path = %self.path.display(), count = entries.len(), "Server list written");
        Ok(())
    }
}

#[async_trait]
impl ServerStore for JsonFileStore {
    async fn list(&self) -> Vec<ServerDescriptor> {
        self.load()
            .await
            .into_iter()
            .filter_map(|entry| match entry {
                Entry::Server(server) => Some(server),
                Entry::Unrecognised(_) => None,
            })
            .collect()
    }

    async fn add(&self, descriptor: ServerDescriptor) -> Result<(), RegistryError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await;

        if entries.iter().any(|e| e.id() == Some(descriptor.id.as_str())) {
            return Err(RegistryError::DuplicateId { id: descriptor.id });
        }

        info!(server_id = %descriptor.id, protocol = %descriptor.protocol, "Adding server");
        entries.push(Entry::Server(descriptor));
        self.save(&entries).await
    }

    async fn update(&self, descriptor: ServerDescriptor) -> Result<(), RegistryError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await;

        let Some(slot) = entries
            .iter_mut()
            .find(|e| e.id() == Some(descriptor.id.as_str()))
        else {
            return Err(RegistryError::NotFound { id: descriptor.id });
        };

        info!(server_id = %descriptor.id, "Updating server");
        *slot = Entry::Server(descriptor);
        self.save(&entries).await
    }

    async fn remove(&self, id: &ServerId) -> Result<(), RegistryError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await;

        let before = entries.len();
        entries.retain(|e| e.id() != Some(id.as_str()));
        if entries.len() == before {
            debug!(server_id = %id, "Remove of unknown server");
        } else {
            info!(server_id = %id, "Removing server");
        }
        self.save(&entries).await
    }
}

async fn read_document(path: &Path) -> Result<Vec<Entry>, LoadError> {
    let data = match tokio::fs::read_to_string(path).await {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(LoadError::Missing),
        Err(e) => return Err(e.into()),
    };
    let values: Vec<Value> = serde_json::from_str(&data)?;
    Ok(values.into_iter().map(Entry::from_value).collect())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

fn write_error(e: impl std::fmt::Display) -> RegistryError {
    RegistryError::Write {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{Port, TransportKind};
    use tempfile::TempDir;

    fn descriptor(id: &str, port: u16) -> ServerDescriptor {
        ServerDescriptor::new(
            ServerId::new(id).unwrap(),
            format!("Server {id}"),
            "127.0.0.1",
            Port::new(port).unwrap(),
        )
    }

    fn store(dir: &TempDir) -> JsonFileStore {
        JsonFileStore::new(dir.path().join("mcp-server-list.json"))
    }

    #[tokio::test]
    async fn missing_file_lists_empty() {
        let dir = TempDir::new().unwrap();
        assert!(store(&dir).list().await.is_empty());
    }

    #[tokio::test]
    async fn corrupt_file_lists_empty() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        std::fs::write(store.path(), "{ not json").unwrap();
        assert!(store.list().await.is_empty());
    }

    #[tokio::test]
    async fn add_persists_in_insertion_order() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.add(descriptor("b", 9001)).await.unwrap();
        store.add(descriptor("a", 9002)).await.unwrap();

        let ids: Vec<_> = store.list().await.into_iter().map(|d| d.id.to_string()).collect();
        assert_eq!(ids, ["b", "a"]);

        // A fresh store over the same file sees the same registry.
        let reopened = JsonFileStore::new(store.path());
        assert_eq!(reopened.list().await.len(), 2);
    }

    #[tokio::test]
    async fn duplicate_add_leaves_registry_unchanged() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.add(descriptor("s1", 9000)).await.unwrap();
        let before = std::fs::read_to_string(store.path()).unwrap();

        let err = store.add(descriptor("s1", 9999)).await.unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateId { .. }));
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), before);
    }

    #[tokio::test]
    async fn update_replaces_in_place() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.add(descriptor("a", 9000)).await.unwrap();
        store.add(descriptor("b", 9001)).await.unwrap();
        store.add(descriptor("c", 9002)).await.unwrap();

        let updated = descriptor("b", 7000).with_protocol(TransportKind::Http);
        store.update(updated.clone()).await.unwrap();

        let servers = store.list().await;
        assert_eq!(servers, vec![descriptor("a", 9000), updated, descriptor("c", 9002)]);
    }

    #[tokio::test]
    async fn update_unknown_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let err = store.update(descriptor("ghost", 9000)).await.unwrap_err();
        assert!(matches!(err, RegistryError::NotFound { .. }));
        assert!(store.list().await.is_empty());
    }

    #[tokio::test]
    async fn remove_unknown_succeeds_without_change() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.add(descriptor("s1", 9000)).await.unwrap();

        store.remove(&ServerId::new("ghost").unwrap()).await.unwrap();
        assert_eq!(store.list().await, vec![descriptor("s1", 9000)]);

        store.remove(&ServerId::new("s1").unwrap()).await.unwrap();
        assert!(store.list().await.is_empty());
    }

    #[tokio::test]
    async fn reads_documents_without_protocol() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        std::fs::write(
            store.path(),
            r#"[{"id":"s1","name":"Local","host":"127.0.0.1","port":9000}]"#,
        )
        .unwrap();

        let servers = store.list().await;
        assert_eq!(servers.len(), 1);
        assert_eq!(servers[0].protocol, TransportKind::Socket);
        assert_eq!(store.get(&ServerId::new("s1").unwrap()).await, Some(servers[0].clone()));
    }

    #[tokio::test]
    async fn creates_missing_parent_directory() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("servers.json"));
        store.add(descriptor("s1", 9000)).await.unwrap();
        assert_eq!(store.list().await.len(), 1);
        assert!(!temp_path(store.path()).exists());
    }

    #[tokio::test]
    async fn unrecognised_entries_survive_mutations() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        std::fs::write(
            store.path(),
            r#"[
                {"id":"keep","name":"Keep","host":"127.0.0.1","port":9000,"protocol":"tcp"},
                {"id":"odd","name":"Odd","host":"127.0.0.1","port":9001,"protocol":"https"},
                {"id":"zero","name":"Zero","host":"127.0.0.1","port":0}
            ]"#,
        )
        .unwrap();

        let ids: Vec<_> = store.list().await.into_iter().map(|d| d.id.to_string()).collect();
        assert_eq!(ids, ["keep", "odd"]);

        store.add(descriptor("new", 9002)).await.unwrap();
        let err = store.add(descriptor("zero", 9003)).await.unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateId { .. }));

        let ids: Vec<_> = store.list().await.into_iter().map(|d| d.id.to_string()).collect();
        assert_eq!(ids, ["keep", "odd", "new"]);

        let document: Vec<serde_json::Value> =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(document.len(), 4);
        assert_eq!(document[2]["id"], "zero");
        assert_eq!(document[2]["port"], 0);

        // Updating a broken entry replaces it with a valid one.
        store.update(descriptor("zero", 9004)).await.unwrap();
        assert_eq!(store.list().await.len(), 4);
    }
}
