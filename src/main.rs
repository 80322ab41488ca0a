use clap::Parser;
use colored::Colorize;
use envrun::registry::LinkedPlugins;
use envrun::{
    Config, DEFAULT_CONFIG_FILE, Environment, Recovery, Registry, TerminalPrompt, launch, resolve,
};
use std::path::{Path, PathBuf};
use std::process;

/// Command line interface of envrun.
///
/// Resolves the variables declared in the configuration file and runs the
/// given command with them in its environment.
#[derive(Parser)]
#[command(name = "envrun")]
#[command(about = "Run a command with variables resolved from env, files, shell commands and the system keyring", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the declaration file
    #[arg(short, long, env = "ENVRUN_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    /// Prompt for missing values and unlock the keyring when needed
    #[arg(short, long, env = "ENVRUN_INTERACTIVE")]
    interactive: bool,
    /// Never prompt, even when ENVRUN_INTERACTIVE is set
    #[arg(long)]
    non_interactive: bool,
    /// Start the command with only the resolved variables
    #[arg(long)]
    isolate: bool,
    /// Do not echo values typed at prompts
    #[arg(long)]
    hide_input: bool,
    /// Log resolution steps to stderr
    #[arg(short, long)]
    verbose: bool,
    /// List the available backend types and registered backends, then exit
    #[arg(long)]
    list_backends: bool,
    /// Command and arguments to run
    #[arg(trailing_var_arg = true)]
    command: Vec<String>,
}

fn main() {
    let cli = Cli::parse();
    envrun::logging::init(cli.verbose);

    match run(cli) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            process::exit(1);
        }
    }
}

fn run(cli: Cli) -> envrun::Result<i32> {
    let interactive = cli.interactive && !cli.non_interactive;
    let environment = Environment::capture();

    if cli.list_backends {
        // Listing works without a declaration file.
        let config = if cli.config.exists() {
            load_config(&cli.config)?
        } else {
            Config::default()
        };
        let registry = Registry::build(&config, interactive, &environment, &LinkedPlugins)?;
        list_backends(&registry);
        return Ok(0);
    }

    if cli.command.is_empty() {
        return Err(envrun::EnvrunError::EmptyCommand);
    }

    let config = load_config(&cli.config)?;
    let registry = Registry::build(&config, interactive, &environment, &LinkedPlugins)?;
    let recovery = Recovery::new(interactive, TerminalPrompt::new(cli.hide_input));

    let vars = resolve(&config, &registry, &recovery)?;
    launch(&cli.command, &vars, cli.isolate)
}

fn load_config(path: &Path) -> envrun::Result<Config> {
    tracing::debug!(path = %path.display(), "Loading configuration");
    Ok(Config::try_from(path)?)
}

fn list_backends(registry: &Registry) {
    println!("{}", "Backend types:".bold());
    for info in registry.implementations() {
        println!("  {}", info.display_with_examples());
    }

    println!("\n{}", "Registered backends:".bold());
    for name in registry.names() {
        if let Some(backend) = registry.get(name) {
            let access = if backend.allows_write() {
                "read-write"
            } else {
                "read-only"
            };
            println!("  {} ({}, {})", name.green(), backend.kind(), access);
        }
    }
}
