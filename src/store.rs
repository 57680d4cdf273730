//! JSON persistence for tags and autoresponses, plus the blacklist file.

use crate::error::StoreError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, warn};

pub const TAGS_FILE: &str = "tags.json";
pub const RESPONSES_FILE: &str = "responses.json";
pub const BLACKLIST_FILE: &str = "blacklist.txt";

/// Tag name to tag text
pub type TagMap = BTreeMap<String, String>;
/// Channel id to (trigger substring to response)
pub type ResponseMap = BTreeMap<String, BTreeMap<String, String>>;

/// Files under the config directory. Saves are not serialized here;
/// callers writing the same file concurrently must order their writes.
#[derive(Debug, Clone)]
pub struct Store {
    dir: PathBuf,
}

impl Store {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub async fn load_tags(&self) -> Result<TagMap, StoreError> {
        self.load(TAGS_FILE).await
    }

    pub async fn save_tags(&self, tags: &TagMap) -> Result<(), StoreError> {
        self.save(TAGS_FILE, tags).await
    }

    pub async fn load_responses(&self) -> Result<ResponseMap, StoreError> {
        self.load(RESPONSES_FILE).await
    }

    pub async fn save_responses(&self, responses: &ResponseMap) -> Result<(), StoreError> {
        self.save(RESPONSES_FILE, responses).await
    }

    /// User ids from `blacklist.txt`, one per line. Blank lines and `#`
    /// comments are skipped; a missing file means nobody is blacklisted.
    pub async fn load_blacklist(&self) -> HashSet<u64> {
        let path = self.dir.join(BLACKLIST_FILE);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) => {
                if e.kind() != ErrorKind::NotFound {
                    warn!("Error loading {}: {}", path.display(), e);
                }
                return HashSet::new();
            }
        };

        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| match line.parse() {
                Ok(id) => Some(id),
                Err(_) => {
                    warn!("Ignoring invalid blacklist entry `{}`", line);
                    None
                }
            })
            .collect()
    }

    async fn load<T: DeserializeOwned + Default>(&self, file: &str) -> Result<T, StoreError> {
        let path = self.dir.join(file);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("Failed loading JSON: {}", path.display());
                return Ok(T::default());
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        serde_json::from_str(&content).map_err(|source| StoreError::Json { path, source })
    }

    /// Rewrites the whole document through a temporary file and a rename.
    async fn save<T: Serialize>(&self, file: &str, value: &T) -> Result<(), StoreError> {
        let path = self.dir.join(file);
        let json = serde_json::to_string_pretty(value).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;

        fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| StoreError::Io {
                path: self.dir.clone(),
                source,
            })?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).await.map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
        debug!("Saved {}", path.display());
        Ok(())
    }
}
