//! Template trees bundled with evmstart
//!
//! A template root holds a `frontend/` and a `contracts/` tree that are
//! copied verbatim into every new project.

pub mod contracts;
pub mod copier;
pub mod files;
pub mod frontend;

pub use contracts::{GENERATED_DEPLOY_SCRIPT, GeneratedContracts, generate_contracts};
pub use copier::{CopyStats, DEFAULT_EXCLUDES, copy_template, is_excluded};
pub use files::write_initial_files;
pub use frontend::{
    CONTRACT_MODULE, TEMPLATE_CONTRACT, WAGMI_CONFIG, read_contract_name, retarget_frontend,
};

use std::env;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::TemplatesConfig;
use crate::error::{Error, Result};

/// Environment variable overriding the template root
pub const TEMPLATES_DIR_ENV: &str = "EVMSTART_TEMPLATES_DIR";

pub const FRONTEND_DIR: &str = "frontend";
pub const CONTRACTS_DIR: &str = "contracts";

/// Location of the two template trees
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSet {
    root: PathBuf,
}

impl TemplateSet {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve the template root.
    ///
    /// Order: `EVMSTART_TEMPLATES_DIR`, `templates.dir` from config, a
    /// `templates/` directory next to the executable, then the templates
    /// shipped in the source tree.
    pub fn locate(config: &TemplatesConfig) -> Self {
        if let Ok(dir) = env::var(TEMPLATES_DIR_ENV) {
            debug!(dir = %dir, "Using templates from environment");
            return Self::new(dir);
        }

        if let Some(dir) = &config.dir {
            debug!(dir = %dir.display(), "Using templates from config");
            return Self::new(dir);
        }

        if let Some(beside_exe) = env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|p| p.join("templates")))
            .filter(|dir| dir.is_dir())
        {
            return Self::new(beside_exe);
        }

        Self::new(Path::new(env!("CARGO_MANIFEST_DIR")).join("../../templates"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn frontend(&self) -> PathBuf {
        self.root.join(FRONTEND_DIR)
    }

    pub fn contracts(&self) -> PathBuf {
        self.root.join(CONTRACTS_DIR)
    }

    /// Fail with `TemplateNotFound` unless the needed trees exist
    pub fn ensure_present(&self, need_contracts: bool) -> Result<()> {
        let frontend = self.frontend();
        if !frontend.is_dir() {
            return Err(Error::TemplateNotFound(frontend));
        }
        if need_contracts {
            let contracts = self.contracts();
            if !contracts.is_dir() {
                return Err(Error::TemplateNotFound(contracts));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_ensure_present() {
        let dir = TempDir::new().unwrap();
        let set = TemplateSet::new(dir.path());

        let err = set.ensure_present(true).unwrap_err();
        assert!(matches!(err, Error::TemplateNotFound(p) if p.ends_with("frontend")));

        fs::create_dir_all(dir.path().join("frontend")).unwrap();
        assert!(set.ensure_present(false).is_ok());

        let err = set.ensure_present(true).unwrap_err();
        assert!(matches!(err, Error::TemplateNotFound(p) if p.ends_with("contracts")));

        fs::create_dir_all(dir.path().join("contracts")).unwrap();
        assert!(set.ensure_present(true).is_ok());
    }

    #[test]
    fn test_locate_prefers_config_dir() {
        // Skip when the environment already forces a template root
        if env::var(TEMPLATES_DIR_ENV).is_ok() {
            return;
        }
        let config = TemplatesConfig {
            dir: Some(PathBuf::from("/opt/evmstart/templates")),
            ..TemplatesConfig::default()
        };
        assert_eq!(
            TemplateSet::locate(&config).root(),
            Path::new("/opt/evmstart/templates")
        );
    }

    #[test]
    fn test_bundled_templates_exist() {
        let bundled = TemplateSet::new(Path::new(env!("CARGO_MANIFEST_DIR")).join("../../templates"));
        assert!(bundled.ensure_present(true).is_ok());
        assert!(bundled.frontend().join("src/wagmi.ts").is_file());
    }
}
