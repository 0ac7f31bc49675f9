//! crdform CLI - manage any Kubernetes custom resource through one generic adapter

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod context;
mod display;
mod error;
mod exit_codes;

use commands::KindArg;
use context::GlobalArgs;
use display::OutputFormat;

#[derive(Parser)]
#[command(name = "crdform")]
#[command(author = "crdform Contributors")]
#[command(version)]
#[command(about = "Manage any Kubernetes custom resource through one generic, schema-driven adapter", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    globals: GlobalArgs,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the resource, data source and manifest type names
    Types {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the schema of a type
    Schema {
        /// Type name (e.g. k8s_cert_manager_io_certificate_v1)
        type_name: String,

        /// Variant of the type
        #[arg(short, long, value_enum, default_value_t)]
        kind: KindArg,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a configuration document without contacting the cluster
    Validate {
        /// Type name
        type_name: String,

        /// Configuration document (YAML or JSON, `-` for stdin)
        #[arg(short = 'f', long = "file")]
        file: PathBuf,

        /// Variant of the type
        #[arg(short, long, value_enum, default_value_t)]
        kind: KindArg,

        /// Output validation results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Render the YAML manifest of a configuration document (offline)
    Render {
        /// Type name, with or without the _manifest suffix
        type_name: String,

        /// Configuration document (YAML or JSON, `-` for stdin)
        #[arg(short = 'f', long = "file")]
        file: PathBuf,

        /// Write the manifest to a file instead of stdout
        #[arg(long)]
        output_file: Option<PathBuf>,
    },

    /// Read an object from the cluster
    Get {
        /// Type name
        type_name: String,

        /// Object id (namespace/name, name/namespace or name, per type)
        id: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t)]
        output: OutputFormat,
    },

    /// Create or update an object with server-side apply
    Apply {
        /// Type name
        type_name: String,

        /// Configuration document (YAML or JSON, `-` for stdin)
        #[arg(short = 'f', long = "file")]
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t)]
        output: OutputFormat,
    },

    /// Delete an object from the cluster
    Delete {
        /// Type name
        type_name: String,

        /// Object id
        id: String,

        /// Deletion propagation policy
        #[arg(long, value_parser = ["Orphan", "Background", "Foreground"])]
        propagation: Option<String>,
    },

    /// Print the state of an existing object, ready to adopt
    Import {
        /// Type name
        type_name: String,

        /// Object id
        id: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t)]
        output: OutputFormat,
    },
}

#[tokio::main]
async fn main() {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_tracing(cli.debug);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(debug)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> error::Result<()> {
    let globals = &cli.globals;

    match cli.command {
        Commands::Types { json } => commands::types::run(globals, json),

        Commands::Schema {
            type_name,
            kind,
            json,
        } => commands::schema::run(globals, &type_name, kind, json),

        Commands::Validate {
            type_name,
            file,
            kind,
            json,
        } => commands::validate::run(globals, &type_name, kind, &file, json),

        Commands::Render {
            type_name,
            file,
            output_file,
        } => commands::render::run(globals, &type_name, &file, output_file.as_deref()),

        Commands::Get {
            type_name,
            id,
            output,
        } => commands::get::run(globals, &type_name, &id, output).await,

        Commands::Apply {
            type_name,
            file,
            output,
        } => commands::apply::run(globals, &type_name, &file, output).await,

        Commands::Delete {
            type_name,
            id,
            propagation,
        } => commands::delete::run(globals, &type_name, &id, propagation.as_deref()).await,

        Commands::Import {
            type_name,
            id,
            output,
        } => commands::import::run(globals, &type_name, &id, output).await,
    }
}
