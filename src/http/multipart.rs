// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Multipart form description

use std::path::{Path, PathBuf};

/// A named file part. The file is opened by the transport at send time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    field: String,
    path: PathBuf,
}

impl FilePart {
    /// Form field name
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Path of the file to upload
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Ordered collection of file parts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    parts: Vec<FilePart>,
}

impl MultipartForm {
    /// Create an empty form
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a file part
    pub fn add_file(&mut self, field: impl Into<String>, path: impl Into<PathBuf>) {
        self.parts.push(FilePart {
            field: field.into(),
            path: path.into(),
        });
    }

    /// Parts in insertion order
    pub fn parts(&self) -> &[FilePart] {
        &self.parts
    }

    /// Number of file parts
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Whether no file part has been added
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}
