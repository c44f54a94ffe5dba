//! Memoized filesystem access for one verification run
//!
//! A review can contain hundreds of findings pointing at a handful of files.
//! The cache reads each file at most once and remembers negative lookups too.
//! Entries are keyed on the resolved absolute path, so `src/a.rs` and
//! `./src/../src/a.rs` share one entry.
//!
//! Create one cache per run and drop it afterwards: the working tree can change
//! between runs, and nothing here is invalidated. The cache is deliberately
//! `!Send` so it cannot be shared across concurrent runs.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::paths::{normalize_lexically, resolve_within};
use crate::{Error, Result};

/// Counters describing how much I/O a cache performed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Distinct paths whose existence was checked
    pub files_checked: usize,
    /// Distinct files whose contents were read
    pub files_loaded: usize,
}

#[derive(Debug)]
enum Entry {
    Missing,
    Present,
    Loaded { content: Rc<str>, lines: Rc<[String]> },
    Unreadable { kind: io::ErrorKind, message: String },
}

/// Lazy, memoized view of the files under one working directory
#[derive(Debug)]
pub struct FileCache {
    root: PathBuf,
    entries: HashMap<PathBuf, Entry>,
    stats: CacheStats,
}

impl FileCache {
    /// Create a cache rooted at `root`
    ///
    /// The root is canonicalized when possible so symlinked temp directories
    /// compare correctly.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let root = fs::canonicalize(root).unwrap_or_else(|_| normalize_lexically(root));
        Self {
            root,
            entries: HashMap::new(),
            stats: CacheStats::default(),
        }
    }

    /// Resolve a claimed path, or `None` if it escapes the working root
    ///
    /// This never touches the filesystem.
    pub fn resolve(&self, path: &str) -> Option<PathBuf> {
        resolve_within(&self.root, path)
    }

    /// Whether `path` exists under the working root
    pub fn exists(&mut self, path: &str) -> bool {
        let Some(key) = self.resolve(path) else {
            return false;
        };
        !matches!(self.check(&key), Entry::Missing)
    }

    /// Full contents of `path`, or `None` if it does not exist
    pub fn content(&mut self, path: &str) -> Result<Option<Rc<str>>> {
        Ok(self.load(path)?.map(|(content, _)| content))
    }

    /// Lines of `path` split on `\n`, or `None` if it does not exist
    ///
    /// A trailing newline yields a final empty line, so a three-line file
    /// ending in `\n` has four entries.
    pub fn lines(&mut self, path: &str) -> Result<Option<Rc<[String]>>> {
        Ok(self.load(path)?.map(|(_, lines)| lines))
    }

    /// Number of lines in `path` as counted by [`FileCache::lines`]
    pub fn line_count(&mut self, path: &str) -> Result<Option<usize>> {
        Ok(self.lines(path)?.map(|lines| lines.len()))
    }

    /// I/O counters for this cache
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    fn check(&mut self, key: &Path) -> &Entry {
        if !self.entries.contains_key(key) {
            self.stats.files_checked += 1;
            let entry = match key.try_exists() {
                Ok(true) => Entry::Present,
                Ok(false) => Entry::Missing,
                Err(e) => Entry::Unreadable {
                    kind: e.kind(),
                    message: e.to_string(),
                },
            };
            debug!(path = %key.display(), ?entry, "Cache miss");
            self.entries.insert(key.to_path_buf(), entry);
        }
        &self.entries[key]
    }

    fn load(&mut self, path: &str) -> Result<Option<(Rc<str>, Rc<[String]>)>> {
        let Some(key) = self.resolve(path) else {
            return Ok(None);
        };

        match self.check(&key) {
            Entry::Missing => return Ok(None),
            Entry::Loaded { content, lines } => {
                return Ok(Some((Rc::clone(content), Rc::clone(lines))));
            }
            Entry::Unreadable { kind, message } => {
                return Err(Error::Io(io::Error::new(*kind, message.clone())));
            }
            Entry::Present => {}
        }

        let entry = match fs::read_to_string(&key) {
            Ok(text) => {
                self.stats.files_loaded += 1;
                let lines: Rc<[String]> = text.split('\n').map(str::to_string).collect();
                debug!(path = %key.display(), lines = lines.len(), "Loaded file");
                Entry::Loaded {
                    content: Rc::from(text),
                    lines,
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Entry::Missing,
            Err(e) => Entry::Unreadable {
                kind: e.kind(),
                message: e.to_string(),
            },
        };
        self.entries.insert(key.clone(), entry);
        self.load(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn workdir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/lib.rs"), "fn a() {}\nfn b() {}\nfn c() {}\n").unwrap();
        fs::write(dir.path().join("README.md"), "no trailing newline").unwrap();
        dir
    }

    #[test]
    fn test_line_count_with_trailing_newline() {
        let dir = workdir();
        let mut cache = FileCache::new(dir.path());

        assert_eq!(cache.line_count("src/lib.rs").unwrap(), Some(4));
        assert_eq!(cache.line_count("README.md").unwrap(), Some(1));
    }

    #[test]
    fn test_lines_content() {
        let dir = workdir();
        let mut cache = FileCache::new(dir.path());

        let lines = cache.lines("src/lib.rs").unwrap().unwrap();
        assert_eq!(lines[1], "fn b() {}");
        assert_eq!(lines[3], "");
        let content = cache.content("src/lib.rs").unwrap().unwrap();
        assert!(content.starts_with("fn a()"));
    }

    #[test]
    fn test_missing_file() {
        let dir = workdir();
        let mut cache = FileCache::new(dir.path());

        assert!(!cache.exists("src/missing.rs"));
        assert!(cache.content("src/missing.rs").unwrap().is_none());
        assert!(cache.line_count("src/missing.rs").unwrap().is_none());
        // negative lookups are cached
        assert_eq!(cache.stats().files_checked, 1);
        assert_eq!(cache.stats().files_loaded, 0);
    }

    #[test]
    fn test_equivalent_paths_share_entry() {
        let dir = workdir();
        let mut cache = FileCache::new(dir.path());

        assert!(cache.exists("src/lib.rs"));
        assert!(cache.exists("./src/../src/lib.rs"));
        cache.lines("src/lib.rs").unwrap();
        cache.lines("./src/lib.rs").unwrap();

        let stats = cache.stats();
        assert_eq!(stats.files_checked, 1);
        assert_eq!(stats.files_loaded, 1);
    }

    #[test]
    fn test_escaping_paths_are_never_read() {
        let dir = workdir();
        let mut cache = FileCache::new(dir.path().join("src"));

        assert!(cache.resolve("../README.md").is_none());
        assert!(!cache.exists("../README.md"));
        assert!(cache.content("../README.md").unwrap().is_none());
        assert_eq!(cache.stats().files_checked, 0);
    }

    #[test]
    fn test_unreadable_file_is_an_error() {
        let dir = workdir();
        fs::write(dir.path().join("blob.bin"), [0xff, 0xfe, 0x00, 0xc3]).unwrap();
        let mut cache = FileCache::new(dir.path());

        assert!(cache.exists("blob.bin"));
        assert!(cache.lines("blob.bin").is_err());
        // the failure is remembered rather than retried
        assert!(cache.lines("blob.bin").is_err());
        assert_eq!(cache.stats().files_loaded, 0);
    }
}
