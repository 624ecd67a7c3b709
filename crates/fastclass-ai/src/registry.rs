//! Named model registry.
//!
//! Maps model names to engine handles. Lookups take a read lock for a single
//! map lookup and never wait on engine I/O: a load runs the engine outside any
//! map lock and only takes the write lock to swap the finished handle in.
//! Loads are serialised per name; different names load in parallel.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use fastclass_core::{ClassifyError, Result};
use parking_lot::{Mutex, RwLock};
use tracing::{info, warn};

use crate::engine::InferenceEngine;

/// A model resident in the engine.
///
/// Shared read-only by every prediction that resolved it. Replacing the
/// model under the same name leaves existing holders on this handle.
pub struct LoadedModel<M> {
    name: String,
    path: PathBuf,
    loaded_at: SystemTime,
    model: M,
}

impl<M> LoadedModel<M> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn loaded_at(&self) -> SystemTime {
        self.loaded_at
    }

    pub(crate) fn model(&self) -> &M {
        &self.model
    }
}

/// Registry of loaded models, keyed by name.
pub struct ModelRegistry<E: InferenceEngine> {
    engine: Arc<E>,
    models: RwLock<HashMap<String, Arc<LoadedModel<E::Model>>>>,
    loading: Mutex<HashSet<String>>,
}

impl<E: InferenceEngine> ModelRegistry<E> {
    /// An empty registry over `engine`.
    pub fn new(engine: Arc<E>) -> Self {
        Self {
            engine,
            models: RwLock::new(HashMap::new()),
            loading: Mutex::new(HashSet::new()),
        }
    }

    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }

    /// Load the model at `path` and register it as `name`.
    ///
    /// Blocks for the duration of the engine load. All-or-nothing: on failure
    /// any model already registered under `name` stays in place. A second
    /// load of a name that is still loading fails with
    /// [`ClassifyError::ModelBusy`].
    pub fn load(&self, name: &str, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let _guard = LoadGuard::acquire(&self.loading, name)?;

        let model = self.engine.load_model(name, path).map_err(|e| {
            warn!(model = name, path = %path.display(), error = %e, "model load failed");
            ClassifyError::ModelLoadFailed {
                name: name.to_string(),
                path: path.to_path_buf(),
                reason: format!("{e:#}"),
            }
        })?;

        let loaded = Arc::new(LoadedModel {
            name: name.to_string(),
            path: path.to_path_buf(),
            loaded_at: SystemTime::now(),
            model,
        });
        let previous = self.models.write().insert(name.to_string(), loaded);

        match previous {
            Some(old) => info!(
                model = name,
                path = %path.display(),
                previous = %old.path().display(),
                "replaced model"
            ),
            None => info!(model = name, path = %path.display(), "loaded model"),
        }
        Ok(())
    }

    /// Look up a loaded model.
    pub fn resolve(&self, name: &str) -> Result<Arc<LoadedModel<E::Model>>> {
        self.models
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| ClassifyError::ModelNotFound {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.models.read().contains_key(name)
    }

    /// Names of all loaded models, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.models.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.models.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.read().is_empty()
    }
}

/// Marks a name as loading; unmarks it on drop, including on panic.
struct LoadGuard<'a> {
    loading: &'a Mutex<HashSet<String>>,
    name: String,
}

impl<'a> LoadGuard<'a> {
    fn acquire(loading: &'a Mutex<HashSet<String>>, name: &str) -> Result<Self> {
        if !loading.lock().insert(name.to_string()) {
            warn!(model = name, "rejected concurrent load");
            return Err(ClassifyError::ModelBusy {
                name: name.to_string(),
            });
        }
        Ok(Self {
            loading,
            name: name.to_string(),
        })
    }
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        self.loading.lock().remove(&self.name);
    }
}
