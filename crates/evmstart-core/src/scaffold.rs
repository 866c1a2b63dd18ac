//! Project scaffolding pipeline
//!
//! `Start → NameValidated → DirectoryCreated → TemplatesCopied →
//! [ChainBootstrapped → ArtifactRead → ConfigRewritten] → Done`
//!
//! Everything up to `TemplatesCopied` is fatal on failure. Past that point
//! the project exists and is usable, so dependency install, chain bootstrap,
//! artifact reading and config rewriting only add warnings.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::artifact::{AddressTable, ChainId, discover_addresses, find_deployed_address};
use crate::chain::{ChainBootstrapper, script_file_name};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::process::{CommandSpec, DetachedProcess, OutputMode, ProcessRunner};
use crate::project::{ProjectName, project_path};
use crate::rewrite::{RewriteOutcome, Substitution, read_contract_abi, rewrite, write_abi_module};
use crate::sync::WAGMI_CONFIG;
use crate::template::{
    CONTRACTS_DIR, FRONTEND_DIR, GENERATED_DEPLOY_SCRIPT, TemplateSet, copy_template,
    generate_contracts, retarget_frontend, write_initial_files,
};
use crate::toolchain::{ToolStatus, probe};

/// How the contracts workspace is produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContractsMode {
    /// Copy the bundled contracts template
    #[default]
    Template,
    /// Generate a workspace whose contract is named after the project
    Generated,
}

#[derive(Debug, Clone)]
pub struct ScaffoldOptions {
    /// Raw, unvalidated project name
    pub name: String,
    /// Directory the project is created in
    pub base_dir: PathBuf,
    pub contracts: ContractsMode,
    /// Start a local chain and deploy to it
    pub deploy: bool,
    /// Run `npm install` in the frontend
    pub install: bool,
}

impl ScaffoldOptions {
    pub fn new(name: impl Into<String>, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            base_dir: base_dir.into(),
            contracts: ContractsMode::Template,
            deploy: true,
            install: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Start,
    NameValidated,
    DirectoryCreated,
    TemplatesCopied,
    ChainBootstrapped,
    ArtifactRead,
    ConfigRewritten,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::NameValidated => "name validated",
            Self::DirectoryCreated => "directory created",
            Self::TemplatesCopied => "templates copied",
            Self::ChainBootstrapped => "chain bootstrapped",
            Self::ArtifactRead => "artifact read",
            Self::ConfigRewritten => "config rewritten",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Result of a scaffold that got at least as far as copying templates
#[derive(Debug, Clone)]
pub struct ScaffoldReport {
    pub name: ProjectName,
    /// Absolute path of the new project
    pub project_path: PathBuf,
    pub stage: Stage,
    /// Every stage passed through, in order
    pub stages: Vec<Stage>,
    /// Local chain left running, if one was started
    pub node: Option<DetachedProcess>,
    /// Contract the frontend is wired to
    pub contract_name: String,
    /// Where that contract landed on the local chain
    pub deployed_address: Option<String>,
    pub addresses: AddressTable,
    pub warnings: Vec<String>,
}

impl ScaffoldReport {
    fn new(name: ProjectName, project_path: PathBuf, contract_name: String) -> Self {
        Self {
            name,
            project_path,
            stage: Stage::NameValidated,
            stages: vec![Stage::Start, Stage::NameValidated],
            node: None,
            contract_name,
            deployed_address: None,
            addresses: AddressTable::default(),
            warnings: Vec::new(),
        }
    }

    fn advance(&mut self, stage: Stage) {
        info!(stage = %stage, "Scaffold stage");
        self.stage = stage;
        self.stages.push(stage);
    }

    fn warn(&mut self, message: String) {
        warn!("{}", message);
        self.warnings.push(message);
    }

    pub fn reached(&self, stage: Stage) -> bool {
        self.stages.contains(&stage)
    }

    /// All optional steps that were attempted succeeded
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn frontend_dir(&self) -> PathBuf {
        self.project_path.join(FRONTEND_DIR)
    }

    pub fn contracts_dir(&self) -> PathBuf {
        self.project_path.join(CONTRACTS_DIR)
    }
}

/// Creates projects from a template set
pub struct ProjectScaffolder<'a> {
    runner: &'a dyn ProcessRunner,
    config: &'a Config,
    templates: TemplateSet,
}

impl<'a> ProjectScaffolder<'a> {
    /// Scaffolder using the template root resolved from config
    pub fn new(runner: &'a dyn ProcessRunner, config: &'a Config) -> Self {
        Self::with_templates(runner, config, TemplateSet::locate(&config.templates))
    }

    pub fn with_templates(
        runner: &'a dyn ProcessRunner,
        config: &'a Config,
        templates: TemplateSet,
    ) -> Self {
        Self {
            runner,
            config,
            templates,
        }
    }

    pub fn templates(&self) -> &TemplateSet {
        &self.templates
    }

    /// Run the whole pipeline.
    ///
    /// Returns `Err` only for failures before or during template copying.
    /// A failure while copying leaves the partial project in place.
    pub async fn scaffold(&self, options: &ScaffoldOptions) -> Result<ScaffoldReport> {
        let name = ProjectName::parse(&options.name)?;
        let base = std::path::absolute(&options.base_dir)?;
        let target = project_path(&base, &name);

        if target.exists() {
            return Err(Error::DirectoryExists(target));
        }
        self.templates
            .ensure_present(options.contracts == ContractsMode::Template)?;

        let (script, contract_name) = match options.contracts {
            ContractsMode::Template => (
                self.config.chain.deploy_script.clone(),
                self.config.chain.contract_name.clone(),
            ),
            ContractsMode::Generated => (
                format!("script/{}", GENERATED_DEPLOY_SCRIPT),
                name.derived_identifier(),
            ),
        };

        let mut report = ScaffoldReport::new(name, target.clone(), contract_name);
        info!(name = %report.name, path = %target.display(), "Creating project");

        fs::create_dir(&target).map_err(|source| Error::Copy {
            path: target.clone(),
            source,
        })?;
        report.advance(Stage::DirectoryCreated);

        self.materialize(&report.name, &target, options.contracts, &script)?;
        report.advance(Stage::TemplatesCopied);

        if options.install {
            self.install_frontend(&mut report).await;
        }

        if options.deploy {
            self.deploy_and_wire(&mut report, &script).await;
        }

        report.advance(Stage::Done);
        Ok(report)
    }

    fn materialize(
        &self,
        name: &ProjectName,
        target: &Path,
        mode: ContractsMode,
        deploy_script: &str,
    ) -> Result<()> {
        let excludes = &self.config.templates.exclude;

        let stats = copy_template(&self.templates.frontend(), &target.join(FRONTEND_DIR), excludes)?;
        info!(files = stats.files, "Copied frontend template");

        match mode {
            ContractsMode::Template => {
                let stats =
                    copy_template(&self.templates.contracts(), &target.join(CONTRACTS_DIR), excludes)?;
                info!(files = stats.files, "Copied contracts template");
            }
            ContractsMode::Generated => {
                let generated = generate_contracts(&target.join(CONTRACTS_DIR), name)?;
                retarget_frontend(&target.join(FRONTEND_DIR), &generated.contract_name)?;
            }
        }

        write_initial_files(target, name, deploy_script)?;
        Ok(())
    }

    async fn install_frontend(&self, report: &mut ScaffoldReport) {
        let spec = CommandSpec::new(&self.config.toolchain.npm)
            .arg("install")
            .current_dir(report.frontend_dir())
            .output(OutputMode::Inherit);

        info!("Installing frontend dependencies");
        match self.runner.run(&spec).await {
            Ok(outcome) if outcome.success() => info!("Frontend dependencies installed"),
            Ok(outcome) => report.warn(format!(
                "`{}` failed (exit {:?}); run it manually in frontend/",
                spec, outcome.exit_code
            )),
            Err(err) => report.warn(format!("Could not install frontend dependencies: {}", err)),
        }
    }

    async fn deploy_and_wire(&self, report: &mut ScaffoldReport, script: &str) {
        let forge = &self.config.toolchain.forge;
        match probe(self.runner, forge).await {
            Ok(ToolStatus::Available(version)) => info!(version = %version, "Found forge"),
            Ok(ToolStatus::Broken(detail)) => {
                report.warn(format!("`{} --version` failed, skipping deploy: {}", forge, detail));
                return;
            }
            Ok(ToolStatus::Missing) => {
                report.warn(format!(
                    "Foundry is not installed, skipping deploy. Install it with: {}",
                    crate::toolchain::FOUNDRY_HINT
                ));
                return;
            }
            Err(err) => {
                report.warn(format!("Could not check for forge: {}", err));
                return;
            }
        }

        let contracts_dir = report.contracts_dir();
        let bootstrapper = ChainBootstrapper::new(self.runner, &self.config.chain, forge);
        let outcome = bootstrapper.bootstrap(&contracts_dir, script).await;
        let deployed = outcome.deployed();
        report.node = outcome.node;
        for warning in outcome.warnings {
            report.warnings.push(warning);
        }
        if !deployed {
            return;
        }
        report.advance(Stage::ChainBootstrapped);

        let chain_id = ChainId(self.config.chain.chain_id);
        match find_deployed_address(
            &contracts_dir,
            script_file_name(script),
            chain_id,
            &report.contract_name,
        ) {
            Ok(Some(address)) => {
                info!(contract = %report.contract_name, address = %address, "Contract deployed");
                report.deployed_address = Some(address);
            }
            Ok(None) => report.warn(format!(
                "No deployment of {} recorded for chain {}",
                report.contract_name, chain_id
            )),
            Err(err) => {
                report.warn(format!("Could not read deployment artifact: {}", err));
                return;
            }
        }

        match discover_addresses(&contracts_dir) {
            Ok(table) => report.addresses = table,
            Err(err) => {
                report.warn(format!("Could not scan deployments: {}", err));
                return;
            }
        }
        report.advance(Stage::ArtifactRead);

        let config_path = report.frontend_dir().join(WAGMI_CONFIG);
        match rewrite(&config_path, &Substitution::Table(report.addresses.clone())) {
            Ok(RewriteOutcome::PatternNotFound) => report.warn(format!(
                "No address block in {}; update it by hand",
                config_path.display()
            )),
            Ok(_) => report.advance(Stage::ConfigRewritten),
            Err(err) => report.warn(format!("Could not update {}: {}", WAGMI_CONFIG, err)),
        }

        let frontend = report.frontend_dir();
        match read_contract_abi(&contracts_dir, &report.contract_name) {
            Ok(Some(abi)) => {
                if let Err(err) = write_abi_module(&frontend, &report.contract_name, &abi) {
                    report.warn(format!("Could not write contract ABI: {}", err));
                }
            }
            Ok(None) => {}
            Err(err) => report.warn(format!("Could not read contract ABI: {}", err)),
        }
    }
}
