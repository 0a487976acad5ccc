// ABOUTME: Utility functions for the vocab-slides application
// ABOUTME: Provides various helper functions for validation and path handling

use crate::errors::{Result, VocabError};
use std::path::Path;

/// Validate that a path exists and points to a regular file
pub fn validate_file_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(VocabError::PathNotFoundError(path.to_path_buf()));
    }
    if !path.is_file() {
        return Err(VocabError::ValidationError(format!(
            "Not a regular file: {:?}",
            path
        )));
    }
    Ok(())
}

/// Create a directory (and any missing ancestors) unless it already exists
pub fn ensure_directory_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    } else if !path.is_dir() {
        return Err(VocabError::ValidationError(format!(
            "Not a directory: {:?}",
            path
        )));
    }
    Ok(())
}

/// Create the parent directory of a file path when it has one
pub fn ensure_parent_directory_exists(file_path: &Path) -> Result<()> {
    if let Some(parent) = file_path.parent() {
        // A bare filename has an empty parent; nothing to create there
        if !parent.as_os_str().is_empty() {
            ensure_directory_exists(parent)?;
        }
    }
    Ok(())
}
