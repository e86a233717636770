//! Flat-file JSON stores: provider configs, exclusion list, collection.
//!
//! Each store is one self-contained JSON array, rewritten in full on every
//! mutation. Reads are authoritative against the on-disk state at call time;
//! there is no in-memory cache. A missing or corrupt file degrades to an
//! empty collection rather than failing the request. Concurrent writers can
//! race and the later write wins — acceptable for a single-user tool.

use std::fs;
use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::search::{CanonicalArticle, ProviderConfig};

pub const CONFIGS_FILE: &str = "api_configs.json";
pub const EXCLUDED_FILE: &str = "excluded_news.json";
pub const COLLECTED_FILE: &str = "collected_news.json";

/// A saved article plus the time it entered the collection.
#[derive(Debug, Clone, Serialize, serde::Deserialize, PartialEq)]
pub struct CollectionEntry {
    #[serde(flatten)]
    pub article: CanonicalArticle,
    #[serde(rename = "collectedAt")]
    pub collected_at: String,
}

/// Whole-document store for one JSON array file.
#[derive(Debug, Clone)]
struct JsonStore<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: Serialize + DeserializeOwned> JsonStore<T> {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    fn read(&self) -> Vec<T> {
        match fs::read_to_string(&self.path) {
            Ok(s) => serde_json::from_str(&s).unwrap_or_default(),
            Err(_) => Vec::new(),
        }
    }

    /// Atomic whole-file replace (tmp + rename).
    fn write(&self, items: &[T]) -> std::io::Result<()> {
        if let Some(dir) = self.path.parent() {
            let _ = fs::create_dir_all(dir);
        }
        let json = serde_json::to_string_pretty(items).unwrap_or_else(|_| "[]".to_string());
        let tmp = self.path.with_extension("json.tmp");
        let mut f = fs::File::create(&tmp)?;
        f.write_all(json.as_bytes())?;
        fs::rename(tmp, &self.path)?;
        Ok(())
    }
}

/// Provider configurations, seeded with the builtin Naver entry on first use.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    inner: JsonStore<ProviderConfig>,
}

impl ConfigStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            inner: JsonStore::new(data_dir.join(CONFIGS_FILE)),
        }
    }

    pub fn all(&self) -> Vec<ProviderConfig> {
        let configs = self.inner.read();
        if configs.is_empty() {
            let seed = vec![ProviderConfig::builtin_seed()];
            let _ = self.inner.write(&seed);
            return seed;
        }
        configs
    }

    /// Upsert keyed on `id`: a matching id replaces in place, anything else
    /// is appended under a freshly generated id.
    pub fn upsert(&self, mut config: ProviderConfig) -> Vec<ProviderConfig> {
        let mut configs = self.all();
        match configs.iter_mut().find(|c| !config.id.is_empty() && c.id == config.id) {
            Some(slot) => *slot = config,
            None => {
                config.id = Utc::now().timestamp_millis().to_string();
                configs.push(config);
            }
        }
        let _ = self.inner.write(&configs);
        configs
    }

    pub fn remove(&self, id: &str) {
        let configs: Vec<ProviderConfig> =
            self.all().into_iter().filter(|c| c.id != id).collect();
        let _ = self.inner.write(&configs);
    }
}

/// Links the user has hidden from future searches. Append-only.
#[derive(Debug, Clone)]
pub struct ExclusionStore {
    inner: JsonStore<String>,
}

impl ExclusionStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            inner: JsonStore::new(data_dir.join(EXCLUDED_FILE)),
        }
    }

    pub fn all(&self) -> Vec<String> {
        self.inner.read()
    }

    /// Idempotent add.
    pub fn add(&self, link: &str) {
        let mut links = self.inner.read();
        if !links.iter().any(|l| l == link) {
            links.push(link.to_string());
            let _ = self.inner.write(&links);
        }
    }
}

/// The user's working set of saved articles, unique by `link`.
#[derive(Debug, Clone)]
pub struct CollectionStore {
    inner: JsonStore<CollectionEntry>,
}

impl CollectionStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            inner: JsonStore::new(data_dir.join(COLLECTED_FILE)),
        }
    }

    pub fn all(&self) -> Vec<CollectionEntry> {
        self.inner.read()
    }

    /// Idempotent by link: a duplicate insert is a no-op.
    pub fn add(&self, article: CanonicalArticle) {
        let mut entries = self.inner.read();
        if entries.iter().any(|e| e.article.link == article.link) {
            return;
        }
        entries.push(CollectionEntry {
            article,
            collected_at: Utc::now().to_rfc3339(),
        });
        let _ = self.inner.write(&entries);
    }

    /// Remove by link; returns the number of remaining entries.
    pub fn remove(&self, link: &str) -> usize {
        let entries: Vec<CollectionEntry> = self
            .inner
            .read()
            .into_iter()
            .filter(|e| e.article.link != link)
            .collect();
        let _ = self.inner.write(&entries);
        entries.len()
    }
}
