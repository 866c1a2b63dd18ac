//! In-place rewriting of the generated frontend config
//!
//! Rewrites are textual: the host file is read, one region is substituted,
//! and the file is written back. Nothing outside that region changes.

pub mod abi;

pub use abi::{read_contract_abi, write_abi_module};

use std::fs;
use std::path::Path;

use regex::{NoExpand, Regex};
use tracing::{debug, info};

use crate::artifact::{AddressTable, is_address};
use crate::error::{Error, Result};

/// Opens the generated address block
pub const ADDRESSES_BEGIN: &str = "// evmstart:addresses:begin";
/// Closes the generated address block
pub const ADDRESSES_END: &str = "// evmstart:addresses:end";
/// Name the address table is exported under
pub const ADDRESSES_EXPORT: &str = "CONTRACT_ADDRESSES";

/// Used when a file has lost its markers
const ADDRESSES_FALLBACK: &str = r"export const CONTRACT_ADDRESSES = \{[\s\S]*?\} as const";

/// What to write into the config file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Substitution {
    /// Replace the whole address block with this table
    Table(AddressTable),
    /// Replace the first `Contract: '0x…'` assignment
    Single { contract: String, address: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteOutcome {
    Rewritten,
    /// Nothing to substitute into; the file was left alone
    PatternNotFound,
    /// The substitution would not change the file
    Unchanged,
}

/// Apply `substitution` to the file at `path`
pub fn rewrite(path: &Path, substitution: &Substitution) -> Result<RewriteOutcome> {
    if !path.is_file() {
        return Err(Error::ConfigNotFound(path.to_path_buf()));
    }

    if matches!(substitution, Substitution::Table(table) if table.is_empty()) {
        debug!(path = %path.display(), "No addresses to write");
        return Ok(RewriteOutcome::Unchanged);
    }

    let original = fs::read_to_string(path)?;
    let updated = match substitution {
        Substitution::Table(table) => replace_table(&original, table)?,
        Substitution::Single { contract, address } => replace_single(&original, contract, address)?,
    };

    let Some(updated) = updated else {
        debug!(path = %path.display(), "Rewrite pattern not found");
        return Ok(RewriteOutcome::PatternNotFound);
    };

    if updated == original {
        return Ok(RewriteOutcome::Unchanged);
    }

    fs::write(path, updated)?;
    info!(path = %path.display(), "Updated contract addresses");
    Ok(RewriteOutcome::Rewritten)
}

/// Render the exported declaration for a table
pub fn render_table_export(table: &AddressTable) -> Result<String> {
    Ok(format!(
        "export const {} = {} as const",
        ADDRESSES_EXPORT,
        table.render_literal()?
    ))
}

fn replace_table(source: &str, table: &AddressTable) -> Result<Option<String>> {
    let declaration = render_table_export(table)?;

    if let Some((start, end)) = marker_region(source) {
        let mut out = String::with_capacity(source.len() + declaration.len());
        out.push_str(&source[..start]);
        out.push('\n');
        out.push_str(&declaration);
        out.push('\n');
        out.push_str(&source[end..]);
        return Ok(Some(out));
    }

    let fallback = Regex::new(ADDRESSES_FALLBACK)?;
    if !fallback.is_match(source) {
        return Ok(None);
    }
    Ok(Some(
        fallback
            .replacen(source, 1, NoExpand(&declaration))
            .into_owned(),
    ))
}

/// Byte range strictly between the first begin marker and the end marker
/// that follows it
fn marker_region(source: &str) -> Option<(usize, usize)> {
    let begin = source.find(ADDRESSES_BEGIN)?;
    let start = begin + ADDRESSES_BEGIN.len();
    let end = start + source[start..].find(ADDRESSES_END)?;
    // Keep whatever indentation precedes the end marker on its own line
    let end = source[start..end]
        .rfind('\n')
        .map_or(end, |newline| start + newline + 1);
    let start = source[start..]
        .find('\n')
        .map_or(start, |newline| (start + newline).min(end));
    Some((start, end))
}

fn replace_single(source: &str, contract: &str, address: &str) -> Result<Option<String>> {
    if !is_address(address) {
        return Err(Error::InvalidAddress(address.to_string()));
    }

    // The key must start at a token boundary so `MyCounter` never matches `Counter`
    let pattern = Regex::new(&format!(
        r#"(?m)(^|[^\w$"'])(["']?{}["']?\s*:\s*)(['"])0x[0-9a-fA-F]{{40}}(['"])"#,
        regex::escape(contract)
    ))?;
    if !pattern.is_match(source) {
        return Ok(None);
    }

    let replacement = format!("${{1}}${{2}}${{3}}{}${{4}}", address);
    Ok(Some(pattern.replacen(source, 1, replacement.as_str()).into_owned()))
}
