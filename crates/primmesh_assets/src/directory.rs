//! # Directory Asset Source
//!
//! Serves assets from a directory laid out like an exported region archive:
//!
//! ```text
//! assets/
//! ├── 89556747-24cb-43ed-920b-47caed15465f_texture.png
//! ├── 0bd9a4b1-4fa4-4b6a-9e39-2f4c52d6d1a3_mesh.llmesh
//! └── ...
//! ```
//!
//! The directory is indexed once at open. Reads and texture decodes run on
//! a small pool of worker threads fed through a channel, so `fetch_*` never
//! blocks the caller.
//!
//! ## Shutdown
//!
//! Dropping the source closes the job queue. Workers finish every fetch
//! already queued, then exit and are joined.

use std::collections::HashMap;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};
use primmesh_core::{Deferred, Uuid};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{FetchError, SourceError};
use crate::handle::EntityHandle;
use crate::source::{AssetSource, SourceStats, TextureAsset, TextureDecoder};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Directory source settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorySourceConfig {
    /// Directory holding `<uuid>_<kind>.<ext>` files.
    pub directory: PathBuf,
    /// Fetch worker threads.
    pub workers: usize,
    /// File suffixes tried, in order, when fetching a texture.
    pub texture_suffixes: Vec<String>,
}

impl Default for DirectorySourceConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./assets"),
            workers: 2,
            texture_suffixes: vec![
                "_texture.jp2".to_owned(),
                "_texture.png".to_owned(),
                "_texture.tga".to_owned(),
            ],
        }
    }
}

impl DirectorySourceConfig {
    /// Config for `directory` with default settings otherwise.
    #[must_use]
    pub fn for_directory(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            ..Self::default()
        }
    }

    /// Checks the settings are usable.
    ///
    /// # Errors
    ///
    /// [`SourceError::InvalidConfig`] describing the first bad field.
    pub fn validate(&self) -> Result<(), SourceError> {
        if self.workers == 0 {
            return Err(SourceError::InvalidConfig(
                "workers must be at least 1".into(),
            ));
        }
        if let Some(bad) = self.texture_suffixes.iter().find(|s| !s.starts_with('_')) {
            return Err(SourceError::InvalidConfig(format!(
                "texture suffix '{bad}' must start with '_'"
            )));
        }
        Ok(())
    }
}

/// One indexed file.
#[derive(Clone, Debug)]
struct IndexedFile {
    /// Everything from the first `_` on, e.g. `_texture.png`.
    suffix: String,
    path: PathBuf,
}

/// Asset source over a directory of exported assets.
pub struct DirectoryAssetSource {
    root: PathBuf,
    index: HashMap<Uuid, Vec<IndexedFile>>,
    texture_suffixes: Vec<String>,
    decoder: Arc<dyn TextureDecoder>,
    stats: Arc<SourceStats>,
    jobs: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl DirectoryAssetSource {
    /// Indexes `config.directory` and starts the fetch workers.
    ///
    /// # Errors
    ///
    /// Invalid config, unreadable directory, or a worker that failed to
    /// start.
    pub fn open(
        config: &DirectorySourceConfig,
        decoder: Arc<dyn TextureDecoder>,
    ) -> Result<Self, SourceError> {
        config.validate()?;
        let index = index_directory(&config.directory)?;
        info!(
            directory = %config.directory.display(),
            assets = index.len(),
            workers = config.workers,
            "indexed asset directory"
        );

        let (tx, rx) = crossbeam_channel::unbounded::<Job>();
        let mut source = Self {
            root: config.directory.clone(),
            index,
            texture_suffixes: config.texture_suffixes.clone(),
            decoder,
            stats: Arc::new(SourceStats::default()),
            jobs: Some(tx),
            workers: Vec::with_capacity(config.workers),
        };

        for id in 0..config.workers {
            let rx = rx.clone();
            // On error `source` drops here, which joins the workers already started.
            let handle = thread::Builder::new()
                .name(format!("primmesh-fetch-{id}"))
                .spawn(move || worker_loop(&rx))
                .map_err(SourceError::Spawn)?;
            source.workers.push(handle);
        }

        Ok(source)
    }

    /// Directory being served.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of distinct asset ids indexed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// True if the directory held no asset files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// True if any file is indexed for `handle`.
    #[must_use]
    pub fn contains(&self, handle: &EntityHandle) -> bool {
        self.index.contains_key(&handle.id())
    }

    /// Request counters.
    #[must_use]
    pub fn stats(&self) -> &SourceStats {
        &self.stats
    }

    fn texture_path(&self, handle: &EntityHandle) -> Option<PathBuf> {
        let files = self.index.get(&handle.id())?;
        self.texture_suffixes.iter().find_map(|suffix| {
            files
                .iter()
                .find(|f| f.suffix == *suffix)
                .map(|f| f.path.clone())
        })
    }

    fn raw_path(&self, handle: &EntityHandle) -> Option<PathBuf> {
        let files = self.index.get(&handle.id())?;
        files
            .iter()
            .find(|f| !self.texture_suffixes.contains(&f.suffix))
            .or_else(|| files.first())
            .map(|f| f.path.clone())
    }

    fn submit<T, F>(&self, deferred: &Deferred<T, FetchError>, job: F)
    where
        T: Send + 'static,
        F: FnOnce() + Send + 'static,
    {
        let sent = self
            .jobs
            .as_ref()
            .is_some_and(|tx| tx.send(Box::new(job)).is_ok());
        if !sent {
            self.stats.record_failure();
            deferred.reject(FetchError::Closed);
        }
    }

    fn not_found<T: Send + 'static>(&self, handle: &EntityHandle) -> Deferred<T, FetchError> {
        debug!(%handle, "asset not in directory index");
        self.stats.record_failure();
        Deferred::failed(FetchError::NotFound(*handle))
    }
}

impl AssetSource for DirectoryAssetSource {
    fn fetch_texture(&self, handle: &EntityHandle) -> Deferred<TextureAsset, FetchError> {
        self.stats.record_texture();
        let Some(path) = self.texture_path(handle) else {
            return self.not_found(handle);
        };

        let deferred = Deferred::new();
        let result = deferred.clone();
        let decoder = Arc::clone(&self.decoder);
        let stats = Arc::clone(&self.stats);
        let handle = *handle;

        self.submit(&deferred, move || {
            let outcome = read_file(handle, &path).and_then(|bytes| {
                match panic::catch_unwind(AssertUnwindSafe(|| decoder.decode(&bytes))) {
                    Ok(Ok(bitmap)) => Ok(TextureAsset {
                        handle,
                        bitmap: Arc::new(bitmap),
                    }),
                    Ok(Err(e)) => Err(FetchError::Decode {
                        handle,
                        reason: e.to_string(),
                    }),
                    Err(_) => Err(FetchError::Decode {
                        handle,
                        reason: "texture decoder panicked".into(),
                    }),
                }
            });
            settle(&result, outcome, &stats);
        });
        deferred
    }

    fn fetch_raw_asset(&self, handle: &EntityHandle) -> Deferred<Vec<u8>, FetchError> {
        self.stats.record_raw();
        let Some(path) = self.raw_path(handle) else {
            return self.not_found(handle);
        };

        let deferred = Deferred::new();
        let result = deferred.clone();
        let stats = Arc::clone(&self.stats);
        let handle = *handle;

        self.submit(&deferred, move || {
            settle(&result, read_file(handle, &path), &stats);
        });
        deferred
    }
}

impl Drop for DirectoryAssetSource {
    fn drop(&mut self) {
        // Closing the queue lets workers drain what is left and exit.
        drop(self.jobs.take());
        let current = thread::current().id();
        for handle in self.workers.drain(..) {
            // Released from a completion callback: this worker exits on its
            // own once the queue is empty.
            if handle.thread().id() == current {
                continue;
            }
            if handle.join().is_err() {
                warn!("fetch worker panicked");
            }
        }
        debug!(directory = %self.root.display(), "asset directory source closed");
    }
}

impl std::fmt::Debug for DirectoryAssetSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryAssetSource")
            .field("root", &self.root)
            .field("assets", &self.index.len())
            .field("workers", &self.workers.len())
            .finish_non_exhaustive()
    }
}

fn worker_loop(jobs: &Receiver<Job>) {
    for job in jobs.iter() {
        job();
    }
}

fn settle<T: Send + 'static>(
    deferred: &Deferred<T, FetchError>,
    outcome: Result<T, FetchError>,
    stats: &SourceStats,
) {
    match outcome {
        Ok(value) => deferred.resolve(value),
        Err(e) => {
            warn!(error = %e, "asset fetch failed");
            stats.record_failure();
            deferred.reject(e);
        }
    }
}

fn read_file(handle: EntityHandle, path: &Path) -> Result<Vec<u8>, FetchError> {
    fs::read(path).map_err(|e| FetchError::Io {
        handle,
        reason: e.to_string(),
    })
}

fn index_directory(root: &Path) -> Result<HashMap<Uuid, Vec<IndexedFile>>, SourceError> {
    let index_error = |source| SourceError::Index {
        path: root.to_path_buf(),
        source,
    };

    let mut index: HashMap<Uuid, Vec<IndexedFile>> = HashMap::new();
    for entry in fs::read_dir(root).map_err(index_error)? {
        let entry = entry.map_err(index_error)?;
        if !entry.file_type().map_err(index_error)?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let Some((id, suffix)) = name
            .find('_')
            .map(|split| name.split_at(split))
            .and_then(|(id, suffix)| Uuid::parse_str(id).ok().map(|id| (id, suffix)))
        else {
            debug!(file = name, "ignoring file without an asset id prefix");
            continue;
        };
        index.entry(id).or_default().push(IndexedFile {
            suffix: suffix.to_owned(),
            path: entry.path(),
        });
    }

    for files in index.values_mut() {
        files.sort_by(|a, b| a.path.cmp(&b.path));
    }
    Ok(index)
}
