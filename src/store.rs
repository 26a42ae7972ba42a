//! Artifact persistence: the public tree summary file and the per-voter
//! path store.
//!
//! Path documents are written one JSON file per voter, named by canonical
//! email. Serialization always completes in memory before any file is
//! created, so a failed write never leaves a truncated artifact behind.

use crate::allowlist::canonicalize_email;
use crate::error::{BallotError, BallotResult};
use crate::pipeline::TreeBuild;
use crate::types::{PathArtifact, TreeArtifact};
use log::debug;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

// Emails become filenames, so path separators are replaced before use.
fn file_name_for(email: &str) -> String {
    let safe: String = email
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    format!("{safe}.json")
}

/// Directory of per-voter path documents.
#[derive(Debug, Clone)]
pub struct PathStore {
    root_dir: PathBuf,
}

impl PathStore {
    /// Creates the store directory (and parents) if missing.
    ///
    /// # Errors
    /// Returns [`BallotError::Io`] if the directory cannot be created.
    pub fn create<P: AsRef<Path>>(root_dir: P) -> BallotResult<Self> {
        fs::create_dir_all(&root_dir)?;
        Ok(Self {
            root_dir: root_dir.as_ref().to_path_buf(),
        })
    }

    /// Opens an existing store directory without touching the filesystem.
    /// Missing files surface on [`PathStore::load`].
    pub fn open<P: AsRef<Path>>(root_dir: P) -> Self {
        Self {
            root_dir: root_dir.as_ref().to_path_buf(),
        }
    }

    /// The directory this store reads and writes.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.root_dir
    }

    fn artifact_path(&self, canonical_email: &str) -> PathBuf {
        self.root_dir.join(file_name_for(canonical_email))
    }

    /// Writes one voter's path document, returning the file path.
    ///
    /// The email is canonicalized before it names the file, so lookups with
    /// any casing of the same address find the same document.
    ///
    /// # Errors
    /// Returns [`BallotError::Serialization`] or [`BallotError::Io`].
    pub fn save(&self, email: &str, artifact: &PathArtifact) -> BallotResult<PathBuf> {
        let canonical = canonicalize_email(email);
        let path = self.artifact_path(&canonical);
        let json = serde_json::to_string_pretty(artifact)?;
        fs::write(&path, json)?;
        debug!("Saved path artifact to {}", path.display());
        Ok(path)
    }

    /// Loads one voter's path document.
    ///
    /// # Errors
    /// Returns [`BallotError::MissingArtifact`] when no document exists for
    /// the canonical email, [`BallotError::Io`] for other filesystem errors,
    /// and [`BallotError::Serialization`] for unparseable JSON.
    pub fn load(&self, email: &str) -> BallotResult<PathArtifact> {
        let canonical = canonicalize_email(email);
        let path = self.artifact_path(&canonical);
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(BallotError::MissingArtifact(canonical));
            }
            Err(e) => return Err(BallotError::Io(e)),
        };
        let artifact: PathArtifact = serde_json::from_str(&json)?;
        Ok(artifact)
    }
}

/// Writes the public tree summary document.
///
/// # Errors
/// Returns [`BallotError::Serialization`] or [`BallotError::Io`].
pub fn write_tree<P: AsRef<Path>>(path: P, artifact: &TreeArtifact) -> BallotResult<()> {
    let json = serde_json::to_string_pretty(artifact)?;
    fs::write(&path, json)?;
    debug!("Saved tree artifact to {}", path.as_ref().display());
    Ok(())
}

/// Loads and validates the public tree summary document.
///
/// # Errors
/// Returns [`BallotError::Io`] or [`BallotError::Serialization`] for
/// unreadable files, and [`BallotError::MalformedInput`] when the stored
/// numbers do not parse as field elements.
pub fn load_tree<P: AsRef<Path>>(path: P) -> BallotResult<TreeArtifact> {
    let json = fs::read_to_string(&path)?;
    let artifact: TreeArtifact = serde_json::from_str(&json)?;
    artifact.validate()?;
    Ok(artifact)
}

/// Persists one build: every per-voter path document first, then the tree
/// summary last. The summary file only appears once the full path set is on
/// disk, so its presence marks a completed publication.
///
/// # Errors
/// Returns [`BallotError::Serialization`] or [`BallotError::Io`]; when one
/// does, the tree summary has not been written.
pub fn persist_build<P: AsRef<Path>>(
    store: &PathStore,
    tree_file: P,
    build: &TreeBuild,
) -> BallotResult<()> {
    for voter_path in &build.paths {
        store.save(&voter_path.email, &voter_path.artifact)?;
    }
    write_tree(tree_file, &build.artifact)
}
