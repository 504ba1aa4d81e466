use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mirror::{LocalStorage, SignatureAlgorithm, SyncEngine, SyncOptions, SyncPlan};

mod config;

use config::MirrorConfig;

#[derive(Parser)]
#[command(name = "mirror")]
#[command(about = "Mirror one or more source directories into a target directory")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (overrides the configuration file)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Make the target an exact mirror of the sources
    Sync {
        #[command(flatten)]
        dirs: DirArgs,

        /// Content signature algorithm
        #[arg(long)]
        algorithm: Option<SignatureAlgorithm>,

        /// Report what would change without touching the target
        #[arg(long)]
        dry_run: bool,
    },
    /// Show the actions a sync would perform
    Plan {
        #[command(flatten)]
        dirs: DirArgs,

        /// Content signature algorithm
        #[arg(long)]
        algorithm: Option<SignatureAlgorithm>,
    },
    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigActions,
    },
}

#[derive(clap::Args)]
struct DirArgs {
    /// Source directory (repeatable; replaces the configured sources)
    #[arg(short, long = "source")]
    sources: Vec<PathBuf>,

    /// Target directory
    #[arg(short, long)]
    target: Option<PathBuf>,
}

#[derive(Subcommand)]
enum ConfigActions {
    /// Validate configuration file
    Validate,
    /// Show the effective configuration
    Show,
    /// Generate default configuration
    Generate {
        /// Output path for configuration
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => MirrorConfig::load(path)?,
        None => MirrorConfig::default(),
    };

    let log_level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    init_logging(log_level)?;

    if let Some(path) = &cli.config {
        info!("Loaded configuration from {}", path.display());
    }

    match cli.command {
        Commands::Sync { dirs, algorithm, dry_run } => {
            let config = apply_overrides(config, dirs, algorithm, dry_run)?;
            run_sync(&config, cli.json)
        }
        Commands::Plan { dirs, algorithm } => {
            let config = apply_overrides(config, dirs, algorithm, false)?;
            run_plan(&config, cli.json)
        }
        Commands::Config { action } => match action {
            ConfigActions::Validate => validate_config(&config),
            ConfigActions::Show => show_config(&config),
            ConfigActions::Generate { output } => generate_config(output.as_ref()),
        },
    }
}

fn init_logging(log_level: &str) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new(format!("mirror={},mirror_cli={}", level, level))
                })
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(())
}

/// Command line values win over the configuration file
fn apply_overrides(
    mut config: MirrorConfig,
    dirs: DirArgs,
    algorithm: Option<SignatureAlgorithm>,
    dry_run: bool,
) -> Result<MirrorConfig> {
    if !dirs.sources.is_empty() {
        config.sources = dirs.sources;
    }
    if let Some(target) = dirs.target {
        config.target = target;
    }
    if let Some(algorithm) = algorithm {
        config.algorithm = algorithm;
    }
    config.dry_run |= dry_run;

    config.validate()?;
    Ok(config)
}

fn engine_for(config: &MirrorConfig) -> SyncEngine<LocalStorage> {
    SyncEngine::with_storage(
        LocalStorage::with_algorithm(config.algorithm),
        SyncOptions { dry_run: config.dry_run },
    )
}

fn run_sync(config: &MirrorConfig, json: bool) -> Result<()> {
    let metrics = engine_for(config)
        .sync(&config.sources, &config.target)
        .with_context(|| format!("Failed to mirror into {}", config.target.display()))?;

    if json {
        println!("{}", metrics.to_json()?);
    } else {
        println!("{}", metrics.summary());
    }

    Ok(())
}

fn run_plan(config: &MirrorConfig, json: bool) -> Result<()> {
    let plan = engine_for(config)
        .preview(&config.sources, &config.target)
        .with_context(|| format!("Failed to plan mirror into {}", config.target.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print_plan(&plan);
    }

    Ok(())
}

fn print_plan(plan: &SyncPlan) {
    for action in plan.mutations() {
        println!("{:<16} {}", action.name(), action.path());
    }

    let summary = &plan.summary;
    println!(
        "{} to create, {} to copy, {} to update, {} unchanged, {} files to delete, {} directories to delete",
        summary.directory_creates,
        summary.copies,
        summary.updates,
        summary.skips,
        summary.file_deletes,
        summary.directory_deletes,
    );
}

fn validate_config(config: &MirrorConfig) -> Result<()> {
    config.validate()?;
    println!("Configuration is valid");
    println!("Sources: {}", config.sources.len());
    println!("Target: {}", config.target.display());
    Ok(())
}

fn show_config(config: &MirrorConfig) -> Result<()> {
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

fn generate_config(output_path: Option<&PathBuf>) -> Result<()> {
    let config = MirrorConfig::default();

    if let Some(path) = output_path {
        config
            .save(path)
            .with_context(|| format!("Failed to write configuration to {}", path.display()))?;
        println!("Configuration generated at {}", path.display());
    } else {
        println!("{}", toml::to_string_pretty(&config)?);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_sync_arguments() {
        let cli = Cli::parse_from([
            "mirror", "--json", "sync", "-s", "a", "--source", "b", "--target", "out", "--algorithm", "blake3",
            "--dry-run",
        ]);

        assert!(cli.json);
        match cli.command {
            Commands::Sync { dirs, algorithm, dry_run } => {
                assert_eq!(dirs.sources, vec![PathBuf::from("a"), PathBuf::from("b")]);
                assert_eq!(dirs.target, Some(PathBuf::from("out")));
                assert_eq!(algorithm, Some(SignatureAlgorithm::Blake3));
                assert!(dry_run);
            }
            _ => panic!("expected the sync command"),
        }
    }

    #[test]
    fn test_parse_plan_algorithm() {
        let cli = Cli::parse_from(["mirror", "plan", "-s", "a", "-t", "out", "--algorithm", "blake3"]);

        match cli.command {
            Commands::Plan { dirs, algorithm } => {
                assert_eq!(dirs.sources, vec![PathBuf::from("a")]);
                assert_eq!(algorithm, Some(SignatureAlgorithm::Blake3));
            }
            _ => panic!("expected the plan command"),
        }
    }

    #[test]
    fn test_overrides_replace_configured_sources() {
        let config = MirrorConfig {
            sources: vec![PathBuf::from("configured")],
            ..MirrorConfig::default()
        };
        let dirs = DirArgs {
            sources: vec![PathBuf::from("cli")],
            target: Some(PathBuf::from("out")),
        };

        let config = apply_overrides(config, dirs, None, true).unwrap();
        assert_eq!(config.sources, vec![PathBuf::from("cli")]);
        assert_eq!(config.target, PathBuf::from("out"));
        assert!(config.dry_run);
    }

    #[test]
    fn test_run_sync_mirrors_directory() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("src");
        let target = temp_dir.path().join("dst");
        fs::create_dir_all(source.join("nested")).unwrap();
        fs::write(source.join("nested/file.txt"), b"content").unwrap();

        let config = MirrorConfig {
            sources: vec![source],
            target: target.clone(),
            ..MirrorConfig::default()
        };
        run_sync(&config, true).unwrap();

        assert_eq!(fs::read(target.join("nested/file.txt")).unwrap(), b"content");
    }

    #[test]
    fn test_run_sync_reports_conflict() {
        let temp_dir = TempDir::new().unwrap();
        let (a, b) = (temp_dir.path().join("a"), temp_dir.path().join("b"));
        fs::create_dir_all(&a).unwrap();
        fs::create_dir_all(&b).unwrap();
        fs::write(a.join("same.txt"), b"a").unwrap();
        fs::write(b.join("same.txt"), b"b").unwrap();

        let config = MirrorConfig {
            sources: vec![a, b],
            target: temp_dir.path().join("dst"),
            ..MirrorConfig::default()
        };
        let err = run_sync(&config, false).unwrap_err();

        assert!(format!("{:#}", err).contains("same.txt"));
    }
}
