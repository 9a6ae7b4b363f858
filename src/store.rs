use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::normalize::{compare_ignore_case, contains_ignore_case, is_alphanumeric_only, trim};

/// Payload bytes per line that the fixed-size reader of the legacy tool could hold.
pub const LEGACY_LINE_LIMIT: usize = 255;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Cannot insert empty word")]
    EmptyEntry,
    #[error("Cannot insert purely alphanumeric word: {0}")]
    AlphanumericOnly(String),
    #[error("Invalid occurrence number {0}")]
    InvalidOccurrence(i64),
    #[error("Invalid number of words {0}")]
    InvalidCount(i64),
    #[error("Invalid filename")]
    InvalidPath,
    #[error("Cannot open file '{}'", path.display())]
    FileOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read from '{}'", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write to '{}'", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreOptions {
    pub reject_alphanumeric_only: bool,
    /// Upper bound on the bytes kept from each loaded line. `None` reads lines of any length.
    pub max_line_bytes: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Found<'a> {
    pub index: usize,
    pub value: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ranked<'a> {
    pub rank: usize,
    pub value: &'a str,
}

/// Append-only list of trimmed, non-empty entries in insertion order.
#[derive(Debug, Default)]
pub struct WordStore {
    entries: Vec<String>,
    options: StoreOptions,
}

impl WordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: StoreOptions) -> Self {
        Self {
            entries: Vec::new(),
            options,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Trims `word` and appends it, returning the stored form.
    pub fn insert(&mut self, word: &str) -> Result<&str, StoreError> {
        let trimmed = self.validate(word)?;

        self.entries.push(trimmed.to_string());
        tracing::debug!("stored entry #{}: {}", self.entries.len() - 1, trimmed);
        Ok(self.entries[self.entries.len() - 1].as_str())
    }

    fn validate<'w>(&self, word: &'w str) -> Result<&'w str, StoreError> {
        let trimmed = trim(word);
        if trimmed.is_empty() {
            return Err(StoreError::EmptyEntry);
        }
        if self.options.reject_alphanumeric_only && is_alphanumeric_only(trimmed) {
            return Err(StoreError::AlphanumericOnly(trimmed.to_string()));
        }
        Ok(trimmed)
    }

    /// The `n`th entry (1-based) containing `pattern`, scanning from the front.
    pub fn find_forward(&self, pattern: &str, n: i64) -> Result<Option<Found<'_>>, StoreError> {
        let target = occurrence(n)?;
        Ok(nth_match(self.entries.iter().enumerate(), pattern, target))
    }

    /// The `n`th entry (1-based) containing `pattern`, scanning from the back.
    pub fn find_reverse(&self, pattern: &str, n: i64) -> Result<Option<Found<'_>>, StoreError> {
        let target = occurrence(n)?;
        Ok(nth_match(self.entries.iter().enumerate().rev(), pattern, target))
    }

    /// The most recent `n` entries, ordered from greatest to least ignoring ASCII case.
    pub fn top_n_reverse_sorted(&self, n: i64) -> Result<Vec<Ranked<'_>>, StoreError> {
        if n <= 0 {
            return Err(StoreError::InvalidCount(n));
        }
        let take = usize::try_from(n).unwrap_or(usize::MAX).min(self.entries.len());

        let mut recent: Vec<&str> = self.entries[self.entries.len() - take..]
            .iter()
            .map(String::as_str)
            .collect();
        recent.sort_by(|a, b| compare_ignore_case(b, a));

        Ok(recent
            .into_iter()
            .enumerate()
            .map(|(idx, value)| Ranked {
                rank: idx + 1,
                value,
            })
            .collect())
    }

    /// Appends every non-blank line of the file at `path` (trimmed first).
    /// Returns how many entries were added.
    pub fn load(&mut self, path: &str) -> Result<usize, StoreError> {
        let path = checked_path(path)?;
        self.load_path(path)
    }

    /// Like [`WordStore::load`], but opens `path` exactly as given.
    pub fn load_path(&mut self, path: &Path) -> Result<usize, StoreError> {
        let file = File::open(path).map_err(|source| StoreError::FileOpen {
            path: path.to_path_buf(),
            source,
        })?;
        self.load_from(BufReader::new(file), path)
    }

    /// Nothing is appended unless the whole input is read successfully.
    fn load_from<R: BufRead>(&mut self, mut reader: R, path: &Path) -> Result<usize, StoreError> {
        let mut pending = Vec::new();
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let read = reader
                .read_until(b'\n', &mut buf)
                .map_err(|source| StoreError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
            if read == 0 {
                break;
            }
            if buf.last() == Some(&b'\n') {
                buf.pop();
            }

            let text = String::from_utf8_lossy(&buf);
            let line = match self.options.max_line_bytes {
                Some(limit) => truncate_at_boundary(&text, limit),
                None => text.as_ref(),
            };
            if trim(line).is_empty() {
                continue;
            }

            match self.validate(line) {
                Ok(entry) => pending.push(entry.to_string()),
                Err(err) => tracing::warn!("Skipping line from {}: {}", path.display(), err),
            }
        }

        let inserted = pending.len();
        self.entries.extend(pending);
        tracing::debug!("Loaded {} entries from {}", inserted, path.display());
        Ok(inserted)
    }

    /// Writes every entry to `path`, one per line, replacing any existing content.
    pub fn save(&self, path: &str) -> Result<usize, StoreError> {
        let path = checked_path(path)?;
        let file = File::create(path).map_err(|source| StoreError::FileOpen {
            path: path.to_path_buf(),
            source,
        })?;
        let write_err = |source: io::Error| StoreError::Write {
            path: path.to_path_buf(),
            source,
        };

        let mut writer = BufWriter::new(file);
        for entry in &self.entries {
            writeln!(writer, "{entry}").map_err(write_err)?;
        }
        writer.flush().map_err(write_err)?;

        tracing::debug!("Saved {} entries to {}", self.entries.len(), path.display());
        Ok(self.entries.len())
    }
}

fn occurrence(n: i64) -> Result<usize, StoreError> {
    if n <= 0 {
        return Err(StoreError::InvalidOccurrence(n));
    }
    Ok(usize::try_from(n).unwrap_or(usize::MAX))
}

fn nth_match<'a, I>(candidates: I, pattern: &str, target: usize) -> Option<Found<'a>>
where
    I: Iterator<Item = (usize, &'a String)>,
{
    candidates
        .filter(|(_, entry)| contains_ignore_case(entry, pattern))
        .nth(target - 1)
        .map(|(index, entry)| Found {
            index,
            value: entry.as_str(),
        })
}

fn checked_path(raw: &str) -> Result<&Path, StoreError> {
    let trimmed = trim(raw);
    if trimmed.is_empty() {
        return Err(StoreError::InvalidPath);
    }
    Ok(Path::new(trimmed))
}

fn truncate_at_boundary(line: &str, limit: usize) -> &str {
    if line.len() <= limit {
        return line;
    }
    let mut end = limit;
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    &line[..end]
}
