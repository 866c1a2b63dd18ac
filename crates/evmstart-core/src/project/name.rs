//! Project name validation
//!
//! Rules, applied in order:
//! - Trimmed name must not be empty
//! - Must contain only lowercase letters, digits, and hyphens
//! - Must not start or end with a hyphen

use std::fmt;

use thiserror::Error;

/// Why a candidate project name was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    #[error("Project name cannot be empty")]
    EmptyName,

    #[error("'{0}' may only contain lowercase letters, numbers, and hyphens")]
    InvalidCharacters(String),

    #[error("'{0}' must not start or end with a hyphen")]
    InvalidHyphenPlacement(String),
}

/// A validated project name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectName(String);

impl ProjectName {
    /// Validate a candidate name
    pub fn parse(candidate: &str) -> Result<Self, RejectionReason> {
        let name = candidate.trim();

        if name.is_empty() {
            return Err(RejectionReason::EmptyName);
        }

        if !name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(RejectionReason::InvalidCharacters(name.to_string()));
        }

        if name.starts_with('-') || name.ends_with('-') {
            return Err(RejectionReason::InvalidHyphenPlacement(name.to_string()));
        }

        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File stem for generated sources: hyphens become underscores
    pub fn file_stem(&self) -> String {
        self.0.replace('-', "_")
    }

    /// Identifier for generated contracts: `my-dapp` becomes `My_dapp`.
    ///
    /// Solidity identifiers cannot start with a digit, so such names get a
    /// `C` prefix (`1inch` becomes `C1inch`).
    pub fn derived_identifier(&self) -> String {
        let stem = self.file_stem();
        let mut chars = stem.chars();
        match chars.next() {
            Some(first) if first.is_ascii_digit() => format!("C{}", stem),
            Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
            None => stem,
        }
    }
}

impl fmt::Display for ProjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ProjectName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
