//! cloud-image-changelog: package changelog diff between two cloud images
//!
//! Compares the package manifests of two Ubuntu cloud images and prints the
//! changelog entries of every package that changed between them.

#![allow(clippy::too_many_lines, clippy::needless_pass_by_value)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use cloud_image_changelog::{
    cli,
    config::{AppConfig, GenerateConfig, GeneratePaths},
    pipeline::exit_codes,
    reports::ReportFormat,
};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cloud-image-changelog")]
#[command(version)]
#[command(about = "Package changelog diff between two cloud image manifests", long_about = None)]
#[command(after_help = "EXIT CODES:
    0  Changelog generated for every package
    1  Changelog generated, but some packages could not be processed
    2  Error occurred

EXAMPLES:
    # Changes between two noble serials
    cloud-image-changelog generate --from-series noble --to-series noble \\
        --from-manifest 20240423.manifest --to-manifest 20240501.manifest

    # Include CVE details and keep a JSON copy of the report
    cloud-image-changelog generate --from-series jammy --to-series noble \\
        --from-manifest jammy.manifest --to-manifest noble.manifest \\
        --highlight-cves --output-json changelog.json

    # Also search a PPA for packages not in the main archive
    cloud-image-changelog generate ... --ppa cloud-team/proposed")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output (also respects `NO_COLOR` env)
    #[arg(long, global = true)]
    no_color: bool,

    /// Path to configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Arguments for the `generate` subcommand
#[derive(Parser)]
struct GenerateArgs {
    /// Series of the "from" image, codename or version (e.g. jammy, 22.04)
    #[arg(long)]
    from_series: String,

    /// Series of the "to" image
    #[arg(long)]
    to_series: String,

    /// Serial of the "from" image
    #[arg(long)]
    from_serial: Option<String>,

    /// Serial of the "to" image
    #[arg(long)]
    to_serial: Option<String>,

    /// Manifest of the "from" image
    #[arg(long)]
    from_manifest: PathBuf,

    /// Manifest of the "to" image
    #[arg(long)]
    to_manifest: PathBuf,

    /// PPA (owner/name) searched after the main archive; may be repeated
    #[arg(long = "ppa")]
    ppas: Vec<String>,

    /// Architecture the images were built for
    #[arg(long)]
    image_architecture: Option<String>,

    /// Look up referenced CVEs and print their priority and description
    #[arg(long)]
    highlight_cves: bool,

    /// Also write the JSON report to this file
    #[arg(long)]
    output_json: Option<PathBuf>,

    /// Indent JSON output
    #[arg(long)]
    output_json_pretty: bool,

    /// Notes to include at the top of the report
    #[arg(long)]
    notes: Option<String>,

    /// Output format
    #[arg(short, long)]
    format: Option<ReportFormat>,

    /// Output file path (stdout if not specified)
    #[arg(short = 'O', long)]
    output_file: Option<PathBuf>,

    /// Changelog entries shown for a newly added package
    #[arg(long)]
    added_package_entries: Option<usize>,

    /// Attempts per remote request before giving up
    #[arg(long)]
    retry_attempts: Option<u32>,

    /// Timeout for archive requests, in seconds
    #[arg(long)]
    api_timeout: Option<u64>,
}

impl GenerateArgs {
    /// Config values set on the command line, layered over the config file.
    fn overrides(&self, cli: &Cli) -> AppConfig {
        let mut config = AppConfig::default();
        config.archive.ppas.clone_from(&self.ppas);
        if let Some(arch) = &self.image_architecture {
            config.archive.architecture.clone_from(arch);
        }
        if let Some(secs) = self.api_timeout {
            config.archive.timeout_secs = secs;
        }
        config.cve.enabled = self.highlight_cves;
        if let Some(attempts) = self.retry_attempts {
            config.retry.attempts = attempts;
        }
        if let Some(format) = self.format {
            config.output.format = format;
        }
        config.output.file.clone_from(&self.output_file);
        config.output.pretty = self.output_json_pretty;
        config.output.no_color = cli.no_color;
        if let Some(entries) = self.added_package_entries {
            config.behavior.added_package_entries = entries;
        }
        config.behavior.quiet = cli.quiet;
        config
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the changelog between two image manifests
    Generate(GenerateArgs),

    /// Print the JSON Schema of the JSON report
    Schema {
        /// Write schema to file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate JSON Schema for the config file format
    ConfigSchema {
        /// Write schema to file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Show, discover, or initialize configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Sub-subcommands for the `config` command
#[derive(Subcommand)]
enum ConfigAction {
    /// Print current effective configuration (merged from defaults + file)
    Show,
    /// Print config file search paths and discovered config file
    Path,
    /// Generate an example .cloud-image-changelog.yaml in the current directory
    Init,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging; reports go to stdout, logs to stderr
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();

    match run(cli) {
        Ok(code) if code != exit_codes::SUCCESS => std::process::exit(code),
        Ok(_) => {}
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(exit_codes::ERROR);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    match &cli.command {
        Commands::Generate(args) => {
            let (app, loaded_from) =
                AppConfig::from_file_with_overrides(cli.config.as_deref(), &args.overrides(&cli));
            if let Some(path) = loaded_from {
                tracing::debug!("Loaded config from {}", path.display());
            }

            let config = GenerateConfig {
                app,
                paths: GeneratePaths {
                    from_manifest: args.from_manifest.clone(),
                    to_manifest: args.to_manifest.clone(),
                },
                from_series: args.from_series.clone(),
                to_series: args.to_series.clone(),
                from_serial: args.from_serial.clone(),
                to_serial: args.to_serial.clone(),
                notes: args.notes.clone(),
                output_json: args.output_json.clone(),
            };
            cli::run_generate(config)
        }

        Commands::Schema { output } => {
            let schema = cloud_image_changelog::reports::report_schema()?;
            write_schema(&schema, output.as_ref())?;
            Ok(exit_codes::SUCCESS)
        }

        Commands::ConfigSchema { output } => {
            let schema = cloud_image_changelog::config::generate_json_schema();
            write_schema(&schema, output.as_ref())?;
            Ok(exit_codes::SUCCESS)
        }

        Commands::Completions { shell } => {
            generate(
                *shell,
                &mut Cli::command(),
                "cloud-image-changelog",
                &mut io::stdout(),
            );
            Ok(exit_codes::SUCCESS)
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let (config, loaded_from) =
                    cloud_image_changelog::config::load_or_default(cli.config.as_deref());
                if let Some(path) = &loaded_from {
                    eprintln!("# Loaded from: {}", path.display());
                } else {
                    eprintln!("# No config file found; showing defaults");
                }
                let yaml = serde_yaml::to_string(&config).context("failed to serialize config")?;
                print!("{yaml}");
                Ok(exit_codes::SUCCESS)
            }
            ConfigAction::Path => {
                let search_paths: [Option<String>; 3] = [
                    std::env::current_dir()
                        .ok()
                        .map(|p| p.display().to_string()),
                    cloud_image_changelog::config::user_config_dir()
                        .map(|p| p.display().to_string()),
                    dirs::home_dir().map(|p| p.display().to_string()),
                ];
                eprintln!("Config file search paths (in order):");
                for path in search_paths.into_iter().flatten() {
                    eprintln!("  {path}");
                }
                eprintln!();
                eprintln!("Recognized file names:");
                for name in cloud_image_changelog::config::CONFIG_FILE_NAMES {
                    eprintln!("  {name}");
                }
                eprintln!();
                match cloud_image_changelog::config::discover_config_file(cli.config.as_deref()) {
                    Some(path) => eprintln!("Active config file: {}", path.display()),
                    None => eprintln!("No config file found."),
                }
                Ok(exit_codes::SUCCESS)
            }
            ConfigAction::Init => {
                let target = std::env::current_dir()
                    .context("cannot determine current directory")?
                    .join(".cloud-image-changelog.yaml");
                if target.exists() {
                    anyhow::bail!(
                        "{} already exists. Remove it first to re-initialize.",
                        target.display()
                    );
                }
                let content = cloud_image_changelog::config::generate_example_config();
                std::fs::write(&target, content)
                    .with_context(|| format!("failed to write {}", target.display()))?;
                eprintln!("Created {}", target.display());
                Ok(exit_codes::SUCCESS)
            }
        },
    }
}

fn write_schema(schema: &str, output: Option<&PathBuf>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, schema)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Schema written to {}", path.display());
        }
        None => println!("{schema}"),
    }
    Ok(())
}
