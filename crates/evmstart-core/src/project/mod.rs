//! Project identity
//!
//! A project is identified by a validated name; its on-disk location is the
//! current directory joined with that name.

pub mod name;

pub use name::{ProjectName, RejectionReason};

use std::path::{Path, PathBuf};

/// Compute the target directory for a project under `base`
pub fn project_path(base: &Path, name: &ProjectName) -> PathBuf {
    base.join(name.as_str())
}
