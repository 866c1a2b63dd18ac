//! evmstart CLI - scaffold Injective EVM dApps

use std::env;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use evmstart_core::config::Config;
use evmstart_core::process::SystemRunner;
use evmstart_core::project::ProjectName;
use evmstart_core::rewrite::RewriteOutcome;
use evmstart_core::scaffold::{ContractsMode, ProjectScaffolder, ScaffoldOptions, ScaffoldReport};
use evmstart_core::sync::{find_project_root, sync_project};
use evmstart_core::template::{FRONTEND_DIR, TemplateSet, read_contract_name};
use evmstart_core::toolchain::{ToolStatus, known_tools, probe};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::debug;

const DEFAULT_PROJECT_NAME: &str = "my-injective-dapp";

#[derive(Parser)]
#[command(name = "evmstart")]
#[command(author, version, about = "Create a new Injective EVM dApp", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Project name (prompted for when omitted)
    name: Option<String>,

    /// Project name, for names that collide with a subcommand (`sync`, `config`, `doctor`, `help`)
    #[arg(long = "name", value_name = "NAME", conflicts_with = "name")]
    name_flag: Option<String>,

    /// Skip starting a local chain and deploying
    #[arg(long)]
    no_chain: bool,

    /// Run `npm install` in the frontend
    #[arg(long)]
    install: bool,

    /// Generate a contract named after the project instead of copying the Counter template
    #[arg(long)]
    generated_contracts: bool,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Point the frontend at the latest deployments
    Sync {
        /// Project directory (defaults to the enclosing project)
        #[arg(short, long)]
        project: Option<PathBuf>,
        /// Contract whose ABI is refreshed (defaults to the frontend's CONTRACT_NAME, then chain.contract_name)
        #[arg(short, long)]
        contract: Option<String>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Check toolchains and templates
    Doctor,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// List all configuration values
    List,
    /// Reset configuration to defaults
    Reset,
    /// Show config file path
    Path,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        "evmstart=debug"
    } else if cli.quiet {
        "evmstart=warn"
    } else {
        "evmstart=info"
    };
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let filter = match level.parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let quiet = cli.quiet;
    let result = match cli.command {
        Some(Commands::Sync { project, contract }) => cmd_sync(project, contract, quiet),
        Some(Commands::Config { action }) => cmd_config(action, quiet),
        Some(Commands::Doctor) => cmd_doctor(quiet).await,
        None => {
            let options = NewOptions {
                name: cli.name.or(cli.name_flag),
                deploy: !cli.no_chain,
                install: cli.install,
                generated: cli.generated_contracts,
            };
            cmd_new(options, quiet).await
        }
    };

    if let Err(err) = result {
        report_error(&err);
        std::process::exit(1);
    }
}

fn report_error(err: &anyhow::Error) {
    match err.downcast_ref::<evmstart_core::Error>() {
        Some(core) => {
            eprintln!("Error [{}]: {}", core.code(), core);
            if let Some(suggestion) = core.suggestion() {
                eprintln!("  Suggestion: {}", suggestion);
            }
        }
        None => eprintln!("Error: {:#}", err),
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

struct NewOptions {
    name: Option<String>,
    deploy: bool,
    install: bool,
    generated: bool,
}

async fn cmd_new(options: NewOptions, quiet: bool) -> anyhow::Result<()> {
    let config = Config::load()?;

    let name = match options.name {
        Some(name) => name,
        None => prompt_for_name()?,
    };

    let cwd = env::current_dir().context("Failed to read current directory")?;
    let scaffold_options = ScaffoldOptions {
        name,
        base_dir: cwd,
        contracts: if options.generated {
            ContractsMode::Generated
        } else {
            ContractsMode::Template
        },
        deploy: options.deploy,
        install: options.install,
    };

    let runner = SystemRunner;
    let scaffolder = ProjectScaffolder::new(&runner, &config);
    debug!(templates = %scaffolder.templates().root().display(), "Resolved templates");

    if !quiet {
        println!("Creating project '{}'...", scaffold_options.name.trim());
    }
    let report = scaffolder.scaffold(&scaffold_options).await?;

    if !quiet {
        print_summary(&report, options.install);
    }
    Ok(())
}

/// Ask for a project name until a valid one is given
fn prompt_for_name() -> anyhow::Result<String> {
    let mut editor = DefaultEditor::new().context("Failed to open prompt")?;
    let prompt = format!("What is your project named? ({}) ", DEFAULT_PROJECT_NAME);

    loop {
        let line = match editor.readline(&prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                return Err(evmstart_core::Error::UserCancelled.into());
            }
            Err(err) => return Err(err).context("Failed to read project name"),
        };

        let candidate = if line.trim().is_empty() {
            DEFAULT_PROJECT_NAME.to_string()
        } else {
            line
        };

        match ProjectName::parse(&candidate) {
            Ok(name) => return Ok(name.to_string()),
            Err(reason) => eprintln!("  {}", reason),
        }
    }
}

fn print_summary(report: &ScaffoldReport, installed: bool) {
    println!("Project created successfully!");
    println!("  Path: {}", report.project_path.display());

    if let Some(address) = &report.deployed_address {
        println!("  {} deployed at {}", report.contract_name, address);
    }

    if let Some(node) = &report.node {
        match node.pid {
            Some(pid) => {
                println!("  Local chain running (pid {})", pid);
                println!("  Stop it with: kill {}", pid);
            }
            None => println!("  Local chain running: {}", node.command),
        }
    }

    if !report.warnings.is_empty() {
        println!("\nCompleted with warnings:");
        for warning in &report.warnings {
            println!("  - {}", warning);
        }
    }

    println!("\nNext steps:");
    println!("  cd {}/frontend", report.name);
    if !installed {
        println!("  npm install");
    }
    println!("  npm run dev");
    println!();
    println!("  cd {}/contracts", report.name);
    println!("  forge build");
    println!("  forge test");
    println!();
    println!("After deploying with `forge script`, run `evmstart sync` to update the frontend.");
}

fn cmd_sync(project: Option<PathBuf>, contract: Option<String>, quiet: bool) -> anyhow::Result<()> {
    let config = Config::load()?;

    let root = match project {
        Some(dir) => dir,
        None => {
            let cwd = env::current_dir().context("Failed to read current directory")?;
            find_project_root(&cwd).with_context(|| {
                format!(
                    "No evmstart project found at or above {} (expected contracts/ and frontend/)",
                    cwd.display()
                )
            })?
        }
    };
    let contract = match contract {
        Some(name) => name,
        None => read_contract_name(&root.join(FRONTEND_DIR))?
            .unwrap_or_else(|| config.chain.contract_name.clone()),
    };

    let report = sync_project(&root, &contract)?;

    if !quiet {
        if report.addresses.is_empty() {
            println!("No deployments found under contracts/broadcast.");
        }
        for (chain, name, address) in report.addresses.entries() {
            println!("  [{}] {} = {}", chain, name, address);
        }
        match report.config {
            RewriteOutcome::Rewritten => println!("Updated frontend/src/wagmi.ts"),
            RewriteOutcome::Unchanged => println!("frontend/src/wagmi.ts already up to date"),
            RewriteOutcome::PatternNotFound => {
                println!("[!!] No CONTRACT_ADDRESSES block in frontend/src/wagmi.ts")
            }
        }
        match &report.abi_module {
            Some(path) => println!("Updated {}", path.display()),
            None => println!("No build output for {}; run `forge build` to refresh its ABI", contract),
        }
    }
    Ok(())
}

fn cmd_config(action: ConfigAction, quiet: bool) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config.get(&key)?;
            println!("{}", value);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            if !quiet {
                println!("Set {} = {}", key, value);
            }
        }
        ConfigAction::List => {
            let config = Config::load()?;
            let items = config.list()?;
            for (key, value) in items {
                println!("{} = {}", key, value);
            }
        }
        ConfigAction::Reset => {
            Config::reset()?;
            if !quiet {
                println!("Configuration reset to defaults.");
            }
        }
        ConfigAction::Path => {
            let path = Config::config_path()?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

async fn cmd_doctor(quiet: bool) -> anyhow::Result<()> {
    if !quiet {
        println!("evmstart Health Check");
        println!("=====================");
        println!();
    }

    let mut all_ok = true;

    let config = match Config::load() {
        Ok(config) => {
            if !quiet {
                println!("[OK] Configuration: Valid");
            }
            config
        }
        Err(e) => {
            all_ok = false;
            if !quiet {
                println!("[!!] Configuration: Error - {:#}", e);
                println!("     Falling back to defaults");
            }
            Config::default()
        }
    };

    if !quiet {
        match Config::config_path() {
            Ok(path) if path.exists() => println!("[OK] Config file: {}", path.display()),
            Ok(path) => println!("[--] Config file: {} (using defaults)", path.display()),
            Err(e) => println!("[!!] Config file: Error - {}", e),
        }
    }

    let templates = TemplateSet::locate(&config.templates);
    match templates.ensure_present(true) {
        Ok(()) => {
            if !quiet {
                println!("[OK] Templates: {}", templates.root().display());
            }
        }
        Err(e) => {
            all_ok = false;
            if !quiet {
                println!("[!!] Templates: {}", e);
            }
        }
    }

    let runner = SystemRunner;
    for tool in known_tools(&config) {
        let status = probe(&runner, &tool.program).await?;
        if !status.is_available() {
            all_ok = false;
        }
        if quiet {
            continue;
        }
        match status {
            ToolStatus::Available(version) => println!("[OK] {}: {}", tool.name, version),
            ToolStatus::Broken(detail) => {
                println!("[!!] {}: `{} --version` failed - {}", tool.name, tool.program, detail)
            }
            ToolStatus::Missing => {
                println!("[!!] {}: Not installed", tool.name);
                println!("     {}", tool.install_hint);
            }
        }
    }

    if !quiet {
        println!();
        if all_ok {
            println!("All checks passed!");
        } else {
            println!("Some checks failed. See above for details.");
        }
    }

    Ok(())
}
