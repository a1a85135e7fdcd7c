use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use log::{debug, warn};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::broadcast;

use super::ServiceResult;
use crate::utilities::constants::LOCAL_STORAGE_PREFIX;

#[derive(Debug, Clone, PartialEq)]
pub struct StorageEvent {
    pub key: String,
    pub new_value: Option<String>,
}

/// Last used deck tags, remembered between sessions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TagState {
    #[serde(default)]
    pub all: Vec<String>,
    #[serde(default)]
    pub current: Option<String>,
}

/// Prefixed key/value store for UI preferences, optionally backed by a JSON file.
#[derive(Debug)]
pub struct PreferenceStore {
    prefix: String,
    items: Mutex<HashMap<String, String>>,
    path: Option<PathBuf>,
    events: broadcast::Sender<StorageEvent>,
}

impl PreferenceStore {
    pub fn in_memory() -> Self {
        Self::build(HashMap::new(), None)
    }

    /// Opens the store at `path`, starting empty if the file does not exist yet.
    pub fn open<P: AsRef<Path>>(path: P) -> ServiceResult<Self> {
        let path = path.as_ref().to_path_buf();
        let items = if path.is_file() {
            serde_json::from_str(&fs::read_to_string(&path)?)?
        } else {
            HashMap::new()
        };
        debug!("Opened preference store {:?} with {} items", path, items.len());
        Ok(Self::build(items, Some(path)))
    }

    fn build(items: HashMap<String, String>, path: Option<PathBuf>) -> Self {
        let (events, _) = broadcast::channel(64);
        PreferenceStore {
            prefix: LOCAL_STORAGE_PREFIX.to_string(),
            items: Mutex::new(items),
            path,
            events,
        }
    }

    pub fn get_item(&self, key: &str) -> Option<String> {
        self.lock().get(&self.make_key(key)).cloned()
    }

    /// `None` when the key is missing or holds something that is not a `T`.
    pub fn get_object<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let item = self.get_item(key)?;
        match serde_json::from_str(&item) {
            Ok(object) => Some(object),
            Err(e) => {
                warn!("Stored value for '{}' could not be read: {}", key, e);
                None
            }
        }
    }

    pub fn set_item(&self, key: &str, value: &str) -> ServiceResult<()> {
        self.write_item(key, Some(value.to_string()))
    }

    pub fn set_object<T: Serialize>(&self, key: &str, object: &T) -> ServiceResult<()> {
        let item = serde_json::to_string(object)?;
        self.set_item(key, &item)
    }

    pub fn remove_item(&self, key: &str) -> ServiceResult<()> {
        self.write_item(key, None)
    }

    /// Follows changes of one key made after this call.
    pub fn watch_item(&self, key: &str) -> ItemWatcher {
        ItemWatcher {
            key: self.make_key(key),
            receiver: self.events.subscribe(),
            last: None,
        }
    }

    /// The file is written before the change becomes visible, so a failed
    /// write leaves the store as it was.
    fn write_item(&self, key: &str, value: Option<String>) -> ServiceResult<()> {
        let prefixed_key = self.make_key(key);
        {
            let mut items = self.lock();
            let mut next = items.clone();
            match &value {
                Some(value) => next.insert(prefixed_key.clone(), value.clone()),
                None => next.remove(&prefixed_key),
            };
            self.save(&next)?;
            *items = next;
        }
        self.notify(prefixed_key, value);
        Ok(())
    }

    fn notify(&self, key: String, new_value: Option<String>) {
        // No receivers is fine, nobody is watching.
        let _ = self.events.send(StorageEvent { key, new_value });
    }

    fn save(&self, items: &HashMap<String, String>) -> ServiceResult<()> {
        if let Some(path) = &self.path {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, serde_json::to_string_pretty(items)?)?;
        }
        Ok(())
    }

    fn make_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.items
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub struct ItemWatcher {
    key: String,
    receiver: broadcast::Receiver<StorageEvent>,
    last: Option<Option<String>>,
}

impl ItemWatcher {
    /// Waits for the next distinct value of the watched key.
    /// Returns `None` once the store is gone.
    pub async fn changed(&mut self) -> Option<Option<String>> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if event.key == self.key => {
                    if self.last.as_ref() == Some(&event.new_value) {
                        continue;
                    }
                    self.last = Some(event.new_value.clone());
                    return Some(event.new_value);
                }
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Preference watcher for '{}' skipped {} events", self.key, skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
