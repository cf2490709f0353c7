use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use docmap_filestore::FileBackend;
use docmap_hybrid::{HybridBackend, VectorLayout};
use docmap_schema::Model;
use docmap_store::{Backend, MemoryBackend, Namespace};

use crate::collection::Collection;
use crate::error::{DocmapError, DocmapResult};

/// Which backend a session talks to, plus its backend-specific settings.
///
/// A tagged sum over the three backend kinds, matched exactly once when the
/// session is opened; after that, all dispatch goes through the [`Backend`]
/// trait with no type inspection at call time.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendConfig {
    /// In-memory document database.
    Memory,
    /// Flat-file JSON store rooted at a client folder.
    File { root: PathBuf },
    /// Hybrid relational+vector store. `vector_fields` maps collection name
    /// to the fields routed to the embedding table.
    Hybrid {
        #[serde(default)]
        vector_fields: HashMap<String, Vec<String>>,
    },
}

/// Session configuration: a database name and a backend choice.
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub database: String,
    pub backend: BackendConfig,
}

impl Config {
    /// In-memory configuration, mainly for tests and examples.
    pub fn memory(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            backend: BackendConfig::Memory,
        }
    }

    /// Parse a TOML configuration string.
    pub fn from_toml(s: &str) -> DocmapResult<Self> {
        toml::from_str(s).map_err(|e| DocmapError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    pub fn from_path(path: impl AsRef<Path>) -> DocmapResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())
            .map_err(|e| DocmapError::Config(format!("{}: {e}", path.as_ref().display())))?;
        Self::from_toml(&raw)
    }
}

/// An open handle to one database on one backend.
///
/// Every session exclusively owns its backend; there is no process-global
/// connection state, and dropping the session drops the backend with it.
pub struct Session {
    database: String,
    backend: Box<dyn Backend>,
}

impl Session {
    /// Open a session, constructing the configured backend.
    pub fn open(config: Config) -> DocmapResult<Self> {
        let backend: Box<dyn Backend> = match config.backend {
            BackendConfig::Memory => Box::new(MemoryBackend::new()),
            BackendConfig::File { root } => Box::new(FileBackend::new(root)),
            BackendConfig::Hybrid { vector_fields } => {
                let mut layout = VectorLayout::new();
                for (collection, fields) in vector_fields {
                    layout = layout.vector_fields(collection, fields);
                }
                Box::new(HybridBackend::new(layout))
            }
        };
        debug!(database = %config.database, backend = backend.name(), "session opened");
        Ok(Self {
            database: config.database,
            backend,
        })
    }

    /// Run a closure against a temporary session that owns its backend for
    /// the duration of the call.
    pub fn scoped<T>(
        config: Config,
        f: impl FnOnce(&Session) -> DocmapResult<T>,
    ) -> DocmapResult<T> {
        let session = Self::open(config)?;
        f(&session)
    }

    /// The database name this session is scoped to.
    pub fn database(&self) -> &str {
        &self.database
    }

    /// The backend's diagnostic name.
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// A typed collection handle for a model. Declares the schema's indexes
    /// on the backend (best-effort, idempotent) before returning.
    pub fn collection<M: Model>(&self) -> Collection<'_, M> {
        let ns = Namespace::new(self.database.clone(), M::collection_name());
        let collection = Collection::new(self.backend.as_ref(), ns);
        collection.ensure_indexes();
        collection
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("database", &self.database)
            .field("backend", &self.backend.name())
            .finish()
    }
}
