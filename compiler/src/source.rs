// source.rs — Source files, locations, and input discovery
//
// Owns the text of every compilation unit seen during a build (user inputs,
// the embedded prelude, and stubs generated by earlier rounds) so that
// diagnostics can be rendered as `path:line:col`.
//
// Preconditions: inputs are UTF-8 text files.
// Postconditions: every added file gets a stable `FileId` in insertion order.
// Failure modes: unreadable paths and bad glob patterns produce `SourceError`.
// Side effects: `discover` and `SourceMap::load` read the filesystem.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::ast::Span;
use crate::diag::Diagnostic;

/// File extension of declaration sources.
pub const SOURCE_EXTENSION: &str = "orbit";

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid input pattern: {0}")]
    Pattern(#[from] glob::PatternError),
    #[error("cannot scan input directory: {0}")]
    Glob(#[from] glob::GlobError),
}

// ── Files and locations ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub u32);

/// A span inside a specific file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub file: FileId,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub text: String,
    /// Package inferred from the file's directory, used when the unit has no
    /// `package` declaration.
    pub package_hint: Option<String>,
}

/// A discovered input: its path plus the package implied by its location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub path: PathBuf,
    pub package_hint: Option<String>,
}

#[derive(Debug, Default)]
pub struct SourceMap {
    files: Vec<SourceFile>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        path: impl Into<PathBuf>,
        text: impl Into<String>,
        package_hint: Option<String>,
    ) -> FileId {
        let id = FileId(self.files.len() as u32);
        self.files.push(SourceFile {
            path: path.into(),
            text: text.into(),
            package_hint,
        });
        id
    }

    /// Read a discovered input from disk.
    pub fn load(&mut self, input: &InputFile) -> Result<FileId, SourceError> {
        let text = std::fs::read_to_string(&input.path).map_err(|e| SourceError::Io {
            path: input.path.clone(),
            source: e,
        })?;
        Ok(self.add(input.path.clone(), text, input.package_hint.clone()))
    }

    pub fn file(&self, id: FileId) -> &SourceFile {
        &self.files[id.0 as usize]
    }

    pub fn files(&self) -> impl Iterator<Item = (FileId, &SourceFile)> {
        self.files
            .iter()
            .enumerate()
            .map(|(i, f)| (FileId(i as u32), f))
    }

    /// 1-based line and column of a byte offset.
    pub fn line_col(&self, id: FileId, offset: usize) -> (usize, usize) {
        let text = &self.file(id).text;
        let offset = offset.min(text.len());
        let before = &text[..offset];
        let line = before.matches('\n').count() + 1;
        let col = before
            .rfind('\n')
            .map_or(before.chars().count(), |nl| before[nl + 1..].chars().count())
            + 1;
        (line, col)
    }

    /// Render a diagnostic with its `path:line:col` prefix when located.
    pub fn render(&self, diagnostic: &Diagnostic) -> String {
        match diagnostic.location {
            Some(loc) => {
                let (line, col) = self.line_col(loc.file, loc.span.start);
                format!(
                    "{}:{}:{}: {}",
                    self.file(loc.file).path.display(),
                    line,
                    col,
                    diagnostic
                )
            }
            None => diagnostic.to_string(),
        }
    }
}

// ── Input discovery ─────────────────────────────────────────────────────────

/// Expand command-line inputs into source files.
///
/// Files are taken as given (unnamed package unless they declare one).
/// Directories are searched recursively for `*.orbit`; each file found gets
/// the package named by its directory relative to the searched directory.
/// Results are sorted by path so rounds see a deterministic order.
pub fn discover(inputs: &[PathBuf]) -> Result<Vec<InputFile>, SourceError> {
    let mut found = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let pattern = input.join("**").join(format!("*.{}", SOURCE_EXTENSION));
            for entry in glob::glob(&pattern.to_string_lossy())? {
                let path = entry?;
                let package_hint = package_from_path(input, &path);
                found.push(InputFile { path, package_hint });
            }
        } else if input.exists() {
            found.push(InputFile {
                path: input.clone(),
                package_hint: None,
            });
        } else {
            return Err(SourceError::Io {
                path: input.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            });
        }
    }
    found.sort_by(|a, b| a.path.cmp(&b.path));
    found.dedup_by(|a, b| a.path == b.path);
    Ok(found)
}

/// `root/a/b/X.orbit` → `a.b`; a file directly under `root` has no package.
pub fn package_from_path(root: &Path, file: &Path) -> Option<String> {
    let relative = file.strip_prefix(root).ok()?;
    let parent = relative.parent()?;
    let segments: Vec<String> = parent
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if segments.is_empty() {
        None
    } else {
        Some(segments.join("."))
    }
}
