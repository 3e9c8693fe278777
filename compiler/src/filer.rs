// filer.rs — Output writer for generated sources and resources
//
// Every artifact the compiler produces goes through `Filer`. Writes are
// single-attempt: a failure is returned to the caller, who reports it against
// the originating declaration and abandons that declaration's remaining
// outputs. Nothing is retried or cleaned up.
//
// Preconditions: paths are relative, `/`-separated, without `..`.
// Postconditions: each path is created at most once per build.
// Failure modes: `OutputError`.
// Side effects: `DirFiler` writes to the filesystem.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("`{0}` was already created in this build")]
    AlreadyCreated(String),
    #[error("`{0}` is not a relative output path")]
    InvalidPath(String),
    #[error("cannot write `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("write to `{0}` rejected")]
    Rejected(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OutputKind {
    Source,
    Resource,
}

pub trait Filer {
    fn create_source(&self, relative_path: &str, contents: &str) -> Result<(), OutputError>;
    fn create_resource(&self, relative_path: &str, contents: &str) -> Result<(), OutputError>;
}

fn check_relative(relative_path: &str) -> Result<(), OutputError> {
    let path = Path::new(relative_path);
    let ok = !relative_path.is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if ok {
        Ok(())
    } else {
        Err(OutputError::InvalidPath(relative_path.to_string()))
    }
}

// ── Directory filer ─────────────────────────────────────────────────────────

/// Writes sources under `<out>/src` and resources under `<out>/resources`.
#[derive(Debug)]
pub struct DirFiler {
    src_root: PathBuf,
    resource_root: PathBuf,
    created: RefCell<HashSet<PathBuf>>,
}

impl DirFiler {
    pub fn new(out_dir: impl AsRef<Path>) -> Self {
        let out_dir = out_dir.as_ref();
        Self {
            src_root: out_dir.join("src"),
            resource_root: out_dir.join("resources"),
            created: RefCell::new(HashSet::new()),
        }
    }

    fn write(&self, root: &Path, relative_path: &str, contents: &str) -> Result<(), OutputError> {
        check_relative(relative_path)?;
        let path = root.join(relative_path);
        if !self.created.borrow_mut().insert(path.clone()) {
            return Err(OutputError::AlreadyCreated(relative_path.to_string()));
        }
        let io_err = |source| OutputError::Io {
            path: path.clone(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(&path, contents).map_err(io_err)?;
        tracing::trace!(path = %path.display(), bytes = contents.len(), "wrote output");
        Ok(())
    }
}

impl Filer for DirFiler {
    fn create_source(&self, relative_path: &str, contents: &str) -> Result<(), OutputError> {
        self.write(&self.src_root, relative_path, contents)
    }

    fn create_resource(&self, relative_path: &str, contents: &str) -> Result<(), OutputError> {
        self.write(&self.resource_root, relative_path, contents)
    }
}

// ── In-memory filer ─────────────────────────────────────────────────────────

/// Keeps outputs in memory. Paths registered with `fail_on` are rejected.
#[derive(Debug, Default)]
pub struct MemoryFiler {
    files: RefCell<BTreeMap<(OutputKind, String), String>>,
    failing: HashSet<String>,
}

impl MemoryFiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(mut self, relative_path: impl Into<String>) -> Self {
        self.failing.insert(relative_path.into());
        self
    }

    pub fn get(&self, kind: OutputKind, relative_path: &str) -> Option<String> {
        self.files
            .borrow()
            .get(&(kind, relative_path.to_string()))
            .cloned()
    }

    /// Paths of one kind, sorted.
    pub fn paths(&self, kind: OutputKind) -> Vec<String> {
        self.files
            .borrow()
            .keys()
            .filter(|(k, _)| *k == kind)
            .map(|(_, p)| p.clone())
            .collect()
    }

    fn write(&self, kind: OutputKind, relative_path: &str, contents: &str) -> Result<(), OutputError> {
        check_relative(relative_path)?;
        if self.failing.contains(relative_path) {
            return Err(OutputError::Rejected(relative_path.to_string()));
        }
        let mut files = self.files.borrow_mut();
        let key = (kind, relative_path.to_string());
        if files.contains_key(&key) {
            return Err(OutputError::AlreadyCreated(relative_path.to_string()));
        }
        files.insert(key, contents.to_string());
        Ok(())
    }
}

impl Filer for MemoryFiler {
    fn create_source(&self, relative_path: &str, contents: &str) -> Result<(), OutputError> {
        self.write(OutputKind::Source, relative_path, contents)
    }

    fn create_resource(&self, relative_path: &str, contents: &str) -> Result<(), OutputError> {
        self.write(OutputKind::Resource, relative_path, contents)
    }
}
