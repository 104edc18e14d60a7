mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use commands::{EXIT_CACHE_ERROR, EXIT_FAILURE, EXIT_STORE_ERROR};
use modelink_core::LinkMode;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "modelink",
    version,
    about = "Human-readable links for content-addressed model stores"
)]
struct Cli {
    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Destination naming scheme.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Flat `{model}-{tag}.gguf` names derived from the manifest path.
    Plain,
    /// Flat names, preferring `{author}-{filename}` from the registry.
    Flat,
    /// Directories grouped by resolved repository id.
    Tree,
}

impl From<Mode> for LinkMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Plain => LinkMode::Plain,
            Mode::Flat => LinkMode::IdentityFlat,
            Mode::Tree => LinkMode::IdentityTree,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Synchronize the link tree against the model store.
    Sync {
        /// Model store root (contains manifests/ and blobs/).
        #[arg(long, default_value = "/usr/share/ollama/.ollama/models")]
        from: String,
        /// Directory where links are created.
        #[arg(long, default_value = "linked-models")]
        to: String,
        /// Destination naming scheme.
        #[arg(long, value_enum, default_value_t = Mode::Plain)]
        mode: Mode,
        /// Re-query digests previously recorded as not found.
        #[arg(long, default_value_t = false)]
        refresh: bool,
        /// Identity registry URL (overrides config file).
        #[arg(long)]
        registry: Option<String>,
    },
    /// Remove all managed links (and emptied directories) under the target.
    Clean {
        /// Directory where links were created.
        #[arg(long, default_value = "linked-models")]
        to: String,
    },
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("MODELINK_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .init();

    let json_output = cli.json;
    let result = match cli.command {
        Commands::Sync {
            from,
            to,
            mode,
            refresh,
            registry,
        } => commands::sync::run(
            &expand_tilde(&from),
            &expand_tilde(&to),
            mode.into(),
            refresh,
            registry.as_deref(),
            json_output,
        ),
        Commands::Clean { to } => commands::clean::run(&expand_tilde(&to), json_output),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("manifest root") {
                EXIT_STORE_ERROR
            } else if msg.starts_with("identity cache") {
                EXIT_CACHE_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(stripped);
        }
    }
    PathBuf::from(path)
}
