//! Keyed persistence for statement corpora.
//!
//! A [`CorpusStore`] maps keys to JSON files under one root directory. The
//! support graph round-trips intact because [`RelatedStatements`] stores
//! integer adjacency rather than object back-references; shared agents are
//! serialized once per owning statement.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::info;

use crate::corpus::RelatedStatements;
use crate::error::{StoreError, StoreResult};
use crate::statement::Statement;

static KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._-]+$").expect("valid regex"));

/// File-backed store of statement lists and support graphs.
pub struct CorpusStore {
    root: PathBuf,
}

impl CorpusStore {
    /// Open a store rooted at the given directory, creating it if needed.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|source| StoreError::Io { source })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> StoreResult<PathBuf> {
        if !KEY_RE.is_match(key) {
            return Err(StoreError::InvalidKey { key: key.to_owned() });
        }
        Ok(self.root.join(format!("{key}.json")))
    }

    fn write(&self, key: &str, payload: String) -> StoreResult<()> {
        let path = self.path_for(key)?;
        std::fs::write(&path, payload).map_err(|source| StoreError::Io { source })?;
        info!(key, path = %path.display(), "stored corpus");
        Ok(())
    }

    fn read(&self, key: &str) -> StoreResult<String> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StoreError::NotFound { key: key.to_owned() })
            }
            Err(source) => Err(StoreError::Io { source }),
        }
    }

    /// Store a plain statement list under a key.
    pub fn store_statements(&self, key: &str, stmts: &[Statement]) -> StoreResult<()> {
        let payload = serde_json::to_string_pretty(stmts).map_err(|e| StoreError::Serialization {
            message: e.to_string(),
        })?;
        self.write(key, payload)
    }

    /// Load a plain statement list.
    pub fn load_statements(&self, key: &str) -> StoreResult<Vec<Statement>> {
        let text = self.read(key)?;
        let stmts = serde_json::from_str(&text).map_err(|e| StoreError::Serialization {
            message: e.to_string(),
        })?;
        Ok(stmts)
    }

    /// Store a support graph under a key.
    pub fn store_related(&self, key: &str, related: &RelatedStatements) -> StoreResult<()> {
        let payload =
            serde_json::to_string_pretty(related).map_err(|e| StoreError::Serialization {
                message: e.to_string(),
            })?;
        self.write(key, payload)
    }

    /// Load a support graph.
    pub fn load_related(&self, key: &str) -> StoreResult<RelatedStatements> {
        let text = self.read(key)?;
        let related = serde_json::from_str(&text).map_err(|e| StoreError::Serialization {
            message: e.to_string(),
        })?;
        Ok(related)
    }
}
