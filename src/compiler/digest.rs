// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipedef contributors

//! Content digests of compiled workflows
//!
//! Uses BLAKE3 so identical compiled output is recognised cheaply.

use blake3::Hasher;
use std::path::Path;

use crate::errors::PipedefError;

/// Compute the digest of a string
pub fn hash_string(s: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(s.as_bytes());
    hasher.finalize().to_hex().to_string()
}

/// Compute the digest of a file's contents
pub fn hash_file(path: &Path) -> Result<String, PipedefError> {
    let content = std::fs::read(path).map_err(|e| PipedefError::FileReadError {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;

    let mut hasher = Hasher::new();
    hasher.update(&content);
    Ok(hasher.finalize().to_hex().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_string() {
        let hash1 = hash_string("hello");
        let hash2 = hash_string("hello");
        let hash3 = hash_string("world");

        assert_eq!(hash1, hash2);
        assert_ne!(hash1, hash3);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_file_and_string_agree() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workflow.yaml");
        std::fs::write(&path, "pipelineInfo: {}\n").unwrap();

        assert_eq!(hash_file(&path).unwrap(), hash_string("pipelineInfo: {}\n"));
    }
}
