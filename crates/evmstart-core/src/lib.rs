//! evmstart Core Library
//!
//! This crate provides the core functionality for evmstart, including:
//! - Project name validation
//! - Template copying and generated starter files
//! - External command execution (npm, anvil, forge)
//! - Local chain bootstrap and deployment
//! - Deployment artifact discovery
//! - Frontend config rewriting and contract sync

pub mod artifact;
pub mod chain;
pub mod config;
pub mod error;
pub mod process;
pub mod project;
pub mod rewrite;
pub mod scaffold;
pub mod sync;
pub mod template;
pub mod toolchain;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::artifact::{AddressTable, ChainId};
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::process::{ProcessRunner, SystemRunner};
    pub use crate::project::ProjectName;
    pub use crate::scaffold::{ContractsMode, ProjectScaffolder, ScaffoldOptions, ScaffoldReport, Stage};
}
