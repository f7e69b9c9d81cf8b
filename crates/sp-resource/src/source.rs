//! Source file ingestion.
//!
//! A simplate source file is a sequence of pages separated by the form-feed
//! character. Content is decoded as UTF-8 here and handled as text everywhere
//! else.

use std::path::{Path, PathBuf};

use crate::error::SourceError;

/// Page-break marker between pages.
pub const PAGE_BREAK: char = '\x0c';

/// A source file split into pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    path: PathBuf,
    pages: Vec<String>,
}

impl SourceFile {
    /// Read and split a file from disk.
    pub fn read(path: impl Into<PathBuf>) -> Result<Self, SourceError> {
        let path = path.into();
        let raw = std::fs::read(&path).map_err(|source| SourceError::Io {
            path: path.clone(),
            source,
        })?;
        Self::from_bytes(path, &raw)
    }

    /// Decode and split raw file content.
    pub fn from_bytes(path: impl Into<PathBuf>, raw: &[u8]) -> Result<Self, SourceError> {
        let path = path.into();
        let text = std::str::from_utf8(raw).map_err(|err| SourceError::Encoding {
            page: count_breaks(&raw[..err.valid_up_to()]),
            path: path.clone(),
        })?;
        let pages = text.split(PAGE_BREAK).map(str::to_owned).collect();
        Ok(Self { path, pages })
    }

    /// Decode pages already split by the host.
    pub fn from_raw_pages(path: impl Into<PathBuf>, raw: Vec<Vec<u8>>) -> Result<Self, SourceError> {
        let path = path.into();
        let pages = raw
            .into_iter()
            .enumerate()
            .map(|(page, bytes)| {
                String::from_utf8(bytes).map_err(|_| SourceError::Encoding {
                    path: path.clone(),
                    page,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { path, pages })
    }

    /// Build from pages already split and decoded.
    #[must_use]
    pub fn from_pages(path: impl Into<PathBuf>, pages: Vec<String>) -> Self {
        Self {
            path: path.into(),
            pages,
        }
    }

    /// Filesystem path of the source.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Pages in declaration order.
    #[must_use]
    pub fn pages(&self) -> &[String] {
        &self.pages
    }

    /// Number of pages.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

fn count_breaks(bytes: &[u8]) -> usize {
    bytes.iter().filter(|&&b| b == b'\x0c').count()
}
