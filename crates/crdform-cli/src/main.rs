//! crdform CLI - render Kubernetes custom resources from typed configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::{fmt, prelude::*, registry};

mod commands;
mod config;
mod display;
mod error;
mod exit_codes;
mod state;

use config::{Overrides, ProviderConfig};
use error::CliError;

#[derive(Parser)]
#[command(name = "crdform")]
#[command(author = "crdform Contributors")]
#[command(version)]
#[command(about = "Render Kubernetes custom resource manifests from typed configuration", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Provider config file
    #[arg(long, global = true, env = "CRDFORM_CONFIG")]
    config: Option<PathBuf>,

    /// Definition file or directory (repeatable, replaces the config file list)
    #[arg(long = "definitions", global = true, env = "CRDFORM_DEFINITIONS", value_delimiter = ',')]
    definitions: Vec<PathBuf>,

    /// State file used by apply, refresh and destroy
    #[arg(long, global = true)]
    state_file: Option<PathBuf>,

    /// Do not register the compiled-in definitions
    #[arg(long, global = true)]
    no_builtin: bool,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered resource types
    Resources {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the attribute schema of a resource type
    Schema {
        /// Resource type name
        resource_type: String,

        /// Print the JSON Schema used for validation
        #[arg(long)]
        json: bool,
    },

    /// Validate a configuration without rendering
    Validate {
        /// Resource type name
        resource_type: String,

        /// Configuration file(s) to merge
        #[arg(short = 'f', long = "values")]
        values: Vec<PathBuf>,

        /// Set configuration values on the command line (key=value)
        #[arg(long = "set")]
        set: Vec<String>,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Render a manifest without touching the state file
    Render {
        /// Resource type name
        resource_type: String,

        /// Configuration file(s) to merge
        #[arg(short = 'f', long = "values")]
        values: Vec<PathBuf>,

        /// Set configuration values on the command line (key=value)
        #[arg(long = "set")]
        set: Vec<String>,

        /// Write the manifest to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the full resource state instead of the manifest
        #[arg(long)]
        show_state: bool,
    },

    /// Create or update a resource and record its state
    Apply {
        /// Resource type name
        resource_type: String,

        /// Instance name in the state file
        name: String,

        /// Configuration file(s) to merge
        #[arg(short = 'f', long = "values")]
        values: Vec<PathBuf>,

        /// Set configuration values on the command line (key=value)
        #[arg(long = "set")]
        set: Vec<String>,
    },

    /// Print the recorded state of a resource
    Refresh {
        /// Resource type name
        resource_type: String,

        /// Instance name in the state file
        name: String,
    },

    /// Forget a resource
    Destroy {
        /// Resource type name
        resource_type: String,

        /// Instance name in the state file
        name: String,
    },

    /// Generate definition files from a CustomResourceDefinition
    ImportCrd {
        /// CRD manifest (may contain several documents)
        crd: PathBuf,

        /// Output directory (if not set, prints to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn init_logging(debug: bool) {
    let default = if debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    let env_filter = EnvFilter::builder()
        .with_default_directive(default.into())
        .from_env_lossy();

    // Another subscriber being installed is not fatal
    let _ = registry()
        .with(
            fmt::Layer::default()
                .compact()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(env_filter)
        .try_init();
}

fn run(cli: Cli) -> miette::Result<()> {
    let mut config = ProviderConfig::load(cli.config.as_deref())?;
    config.apply(Overrides {
        definitions: cli.definitions,
        state_file: cli.state_file,
        no_builtin: cli.no_builtin,
    });

    match cli.command {
        Commands::Resources { json } => commands::resources::run(&config, json),

        Commands::Schema {
            resource_type,
            json,
        } => commands::schema::run(&config, &resource_type, json),

        Commands::Validate {
            resource_type,
            values,
            set,
            json,
        } => commands::validate::run(&config, &resource_type, &values, &set, json),

        Commands::Render {
            resource_type,
            values,
            set,
            output,
            show_state,
        } => commands::render::run(
            &config,
            &resource_type,
            &values,
            &set,
            output.as_deref(),
            show_state,
        ),

        Commands::Apply {
            resource_type,
            name,
            values,
            set,
        } => commands::apply::run(&config, &resource_type, &name, &values, &set),

        Commands::Refresh {
            resource_type,
            name,
        } => commands::refresh::run(&config, &resource_type, &name),

        Commands::Destroy {
            resource_type,
            name,
        } => commands::destroy::run(&config, &resource_type, &name),

        Commands::ImportCrd { crd, output } => {
            commands::import_crd::run(&config, &crd, output.as_deref())
        }
    }
}

fn main() {
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_logging(cli.debug);

    let code = match run(cli) {
        Ok(()) => exit_codes::SUCCESS,
        Err(report) => {
            let code = report
                .downcast_ref::<CliError>()
                .map_or(exit_codes::ERROR, CliError::exit_code);
            eprintln!("{:?}", report);
            code
        }
    };
    std::process::exit(code);
}
