//! Persistent symbol → baseline mapping.
//!
//! The on-disk format is a single JSON object keyed by symbol:
//!
//! ```json
//! { "PEPE_USDT": { "price": 0.0000123, "time": "2026-10-19T08:00:00.123456+00:00" } }
//! ```
//!
//! Every mutation rewrites the whole snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::TrackerResult;

/// Baseline recorded when a symbol is first tracked. Never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedToken {
    #[serde(rename = "price")]
    pub baseline_price: f64,
    #[serde(rename = "time")]
    pub discovery_time: DateTime<Utc>,
}

pub type TokenMap = BTreeMap<String, TrackedToken>;

/// Single-writer key-value store for tracked tokens.
pub trait TokenStore: Send {
    /// Replaces the in-memory set with the durable one. Problems with the
    /// backing medium are logged and leave the store empty.
    fn load(&mut self);

    /// Inserts or replaces `symbol` and persists the full set.
    fn upsert(&mut self, symbol: &str, token: TrackedToken) -> TrackerResult<()>;

    /// Removes `symbol` and persists the full set. Returns whether it was present.
    fn remove(&mut self, symbol: &str) -> TrackerResult<bool>;

    fn get(&self, symbol: &str) -> Option<&TrackedToken>;

    fn all(&self) -> Box<dyn Iterator<Item = (&str, &TrackedToken)> + '_>;

    fn len(&self) -> usize;

    fn contains(&self, symbol: &str) -> bool {
        self.get(symbol).is_some()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// JSON file backed store.
pub struct JsonFileStore {
    path: PathBuf,
    tokens: TokenMap,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            tokens: TokenMap::new(),
        }
    }

    /// Convenience for `new` followed by `load`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let mut store = Self::new(path);
        store.load();
        store
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_snapshot(&self) -> TrackerResult<TokenMap> {
        let content = fs::read_to_string(&self.path)?;
        let content = content.trim();
        if content.is_empty() {
            return Ok(TokenMap::new());
        }
        Ok(serde_json::from_str(content)?)
    }

    fn persist(&self) -> TrackerResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(&self.tokens)?;

        // write beside the target, then swap it in
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;

        tracing::debug!(
            "💾 Saved {} tracked tokens to {}",
            self.tokens.len(),
            self.path.display()
        );
        Ok(())
    }
}

impl TokenStore for JsonFileStore {
    fn load(&mut self) {
        self.tokens = match self.read_snapshot() {
            Ok(tokens) => {
                tracing::info!(
                    "📂 Loaded {} tracked tokens from {}",
                    tokens.len(),
                    self.path.display()
                );
                tokens
            }
            Err(e) => {
                tracing::warn!(
                    "Error loading tracked tokens from {}: {}",
                    self.path.display(),
                    e
                );
                TokenMap::new()
            }
        };
    }

    fn upsert(&mut self, symbol: &str, token: TrackedToken) -> TrackerResult<()> {
        self.tokens.insert(symbol.to_string(), token);
        self.persist()
    }

    fn remove(&mut self, symbol: &str) -> TrackerResult<bool> {
        if self.tokens.remove(symbol).is_none() {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    fn get(&self, symbol: &str) -> Option<&TrackedToken> {
        self.tokens.get(symbol)
    }

    fn all(&self) -> Box<dyn Iterator<Item = (&str, &TrackedToken)> + '_> {
        Box::new(self.tokens.iter().map(|(k, v)| (k.as_str(), v)))
    }

    fn len(&self) -> usize {
        self.tokens.len()
    }
}

/// Non-durable store, for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: TokenMap,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&mut self) {}

    fn upsert(&mut self, symbol: &str, token: TrackedToken) -> TrackerResult<()> {
        self.tokens.insert(symbol.to_string(), token);
        Ok(())
    }

    fn remove(&mut self, symbol: &str) -> TrackerResult<bool> {
        Ok(self.tokens.remove(symbol).is_some())
    }

    fn get(&self, symbol: &str) -> Option<&TrackedToken> {
        self.tokens.get(symbol)
    }

    fn all(&self) -> Box<dyn Iterator<Item = (&str, &TrackedToken)> + '_> {
        Box::new(self.tokens.iter().map(|(k, v)| (k.as_str(), v)))
    }

    fn len(&self) -> usize {
        self.tokens.len()
    }
}
