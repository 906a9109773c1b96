//! Cartographer CLI - export a route manifest as an API collection
//!
//! Reads the route table written by the host application and produces a
//! Postman v2.1 collection or an Insomnia v4 export.

use clap::parser::ValueSource;
use clap::{CommandFactory, FromArgMatches, Parser};
use std::path::PathBuf;
use tracing::{debug, info};

use cartographer_core::{
    AuthStrategyFactory, ConfigLoader, ExportConfig, ExportResult, Exporter, FileSink, Format,
    RouteManifest,
};

/// Cartographer - API collection exporter
#[derive(Parser, Debug)]
#[command(name = "cartographer")]
#[command(version)]
#[command(about = "Export an application's routes as a Postman or Insomnia collection")]
struct Args {
    /// Route manifest (JSON or YAML)
    #[arg(long, short = 'r', value_name = "FILE")]
    routes: PathBuf,

    /// Export configuration (JSON or YAML); defaults apply when absent
    #[arg(long, short = 'c', value_name = "FILE", default_value = "cartographer.yaml")]
    config: PathBuf,

    /// Output format: postman or insomnia
    #[arg(long, short = 'f', default_value = "postman")]
    format: String,

    /// Bearer token for routes behind the auth middleware
    #[arg(long, env = "CARTOGRAPHER_BEARER", hide_env_values = true)]
    bearer: Option<String>,

    /// Basic credentials as user:pass
    #[arg(long, value_name = "USER:PASS")]
    basic: Option<String>,

    /// Group endpoints into folders
    #[arg(long, value_name = "BOOL", action = clap::ArgAction::Set)]
    structured: Option<bool>,

    /// Directory collections are written under
    #[arg(long, short = 'o', value_name = "DIR")]
    output: Option<PathBuf>,

    /// Print the collection to stdout instead of writing a file
    #[arg(long)]
    stdout: bool,

    /// Enable debug logging
    #[arg(long, short = 'v', conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(long, short = 'q')]
    quiet: bool,
}

impl Args {
    /// Parse the command line; an explicit `--basic` replaces a bearer token
    /// taken from the environment
    fn parse_with_sources() -> Self {
        let mut command = Self::command();
        let matches = command.get_matches_mut();
        let mut args = Self::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

        if args.basic.is_some() {
            match matches.value_source("bearer") {
                Some(ValueSource::CommandLine) => command
                    .error(
                        clap::error::ErrorKind::ArgumentConflict,
                        "the argument '--basic <USER:PASS>' cannot be used with '--bearer <BEARER>'",
                    )
                    .exit(),
                Some(_) => args.bearer = None,
                None => {}
            }
        }
        args
    }

    /// File configuration with command line overrides applied
    fn export_config(&self) -> ExportResult<ExportConfig> {
        let mut config = ConfigLoader::load(&self.config)?;

        if let Some(token) = &self.bearer {
            config.authentication.method = Some("bearer".to_string());
            config.authentication.token = Some(token.clone());
        } else if let Some(credentials) = &self.basic {
            config.authentication.method = Some("basic".to_string());
            config.authentication.token = Some(credentials.clone());
        }
        if let Some(structured) = self.structured {
            config.structured = structured;
        }
        if let Some(output) = &self.output {
            config.output_dir = output.clone();
        }

        Ok(config)
    }
}

fn run(args: &Args) -> ExportResult<()> {
    let format: Format = args.format.parse()?;
    let config = args.export_config()?;
    debug!("Using configuration from {:?}", args.config);

    let manifest = RouteManifest::load(&args.routes)?;
    let factory = AuthStrategyFactory::new();
    let exporter = Exporter::new(&config, &factory)?;

    if args.stdout {
        let document = exporter.export(&manifest, format)?;
        println!("{}", Exporter::render(&document)?);
    } else {
        let path = exporter.export_to(&manifest, format, &mut FileSink, chrono::Utc::now())?;
        info!("Exported {} collection", format);
        eprintln!("{}", path.display());
    }

    Ok(())
}

fn main() {
    let args = Args::parse_with_sources();

    let level = if args.verbose {
        tracing::Level::DEBUG
    } else if args.quiet {
        tracing::Level::WARN
    } else {
        tracing::Level::INFO
    };

    // Logs go to stderr so --stdout output stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
