//! bvault: seal and open backup artifacts
//!
//! Commands:
//!   seal <input> <output>          - checksum, compress, encrypt, split into a JSON artifact
//!   open <artifact> <output>       - reverse `seal` and verify the recorded checksum
//!   checksum <file>                - print the checksum record of a file
//!   verify <file> <checksum.json>  - compare a file against a checksum record
//!   genpass                        - print a random password
//!   config show                    - display current configuration
//!
//! Passwords come from `--password-env VAR` or an interactive prompt, never argv.

use anyhow::{Context, Result};
use bvault_core::config::BvaultConfig;
use bvault_core::{ChecksumRecord, CompressionLevel, IntegrityReport};
use bvault_pipeline::{BackupArtifact, SealOptions};
use clap::{Parser, Subcommand, ValueEnum};
use secrecy::{ExposeSecret, SecretString};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "bvault",
    version,
    about = "Backup artifact sealing",
    long_about = "bvault: compress, encrypt, checksum, and split serialized backups"
)]
struct Cli {
    /// Path to bvault.toml configuration file
    #[arg(long, short = 'c', env = "BVAULT_CONFIG", default_value = "bvault.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long, env = "BVAULT_LOG")]
    log: Option<String>,

    /// Log format; overrides the config file
    #[arg(long, env = "BVAULT_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Debug, ValueEnum, PartialEq)]
enum LogFormat {
    Json,
    Text,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Seal a serialized backup into an artifact
    Seal {
        /// Backup file (UTF-8 text, usually JSON)
        input: PathBuf,
        /// Where to write the artifact JSON
        output: PathBuf,
        /// Read the encryption password from this environment variable
        #[arg(long)]
        password_env: Option<String>,
        /// Prompt for an encryption password
        #[arg(long, conflicts_with = "password_env")]
        encrypt: bool,
        /// Compression level (fast, balanced, maximum); overrides config
        #[arg(long)]
        level: Option<CompressionLevel>,
        /// Split threshold in characters; overrides config
        #[arg(long)]
        chunk_size: Option<usize>,
        /// Use the run-length codec even when stream compression is available
        #[arg(long)]
        fallback: bool,
    },

    /// Open an artifact and write the original backup
    Open {
        /// Artifact JSON written by `seal`
        artifact: PathBuf,
        /// Where to write the recovered backup
        output: PathBuf,
        /// Read the password from this environment variable (prompted otherwise)
        #[arg(long)]
        password_env: Option<String>,
    },

    /// Print the checksum record of a file as JSON
    Checksum {
        file: PathBuf,
        /// Parse the file as JSON and checksum its canonical form
        #[arg(long)]
        structured: bool,
    },

    /// Verify a file against a checksum record
    Verify {
        file: PathBuf,
        /// Checksum record JSON, as printed by `checksum`
        record: PathBuf,
        /// Parse the file as JSON and verify its canonical form
        #[arg(long)]
        structured: bool,
    },

    /// Generate a random password
    Genpass {
        /// Password length (default: crypto.password_length from config)
        #[arg(long, short = 'n')]
        length: Option<usize>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config).await?;

    let level = cli
        .log
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    let format = cli.log_format.clone().unwrap_or(match config.logging.format.as_str() {
        "json" => LogFormat::Json,
        _ => LogFormat::Text,
    });
    init_logging(&level, &format);

    if !cli.config.exists() {
        warn!(
            "config file not found: {}  (using defaults)",
            cli.config.display()
        );
    }

    match cli.command {
        Commands::Seal {
            input,
            output,
            password_env,
            encrypt,
            level,
            chunk_size,
            fallback,
        } => {
            let mut options = SealOptions::from_config(&config);
            if let Some(level) = level {
                options.level = level;
            }
            if let Some(size) = chunk_size {
                anyhow::ensure!(size > 0, "--chunk-size must be at least 1");
                options.max_chunk_size = size;
            }
            options.force_fallback |= fallback;
            options.password = resolve_password(password_env.as_deref(), encrypt, true)?;
            cmd_seal(&input, &output, options).await
        }
        Commands::Open {
            artifact,
            output,
            password_env,
        } => cmd_open(&artifact, &output, password_env.as_deref()).await,
        Commands::Checksum { file, structured } => {
            let record = checksum_file(&file, structured).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
        Commands::Verify {
            file,
            record,
            structured,
        } => cmd_verify(&file, &record, structured).await,
        Commands::Genpass { length } => {
            let length = length.unwrap_or(config.crypto.password_length);
            let password = bvault_crypto::generate_secure_password(length)?;
            println!("{}", password.expose_secret());
            Ok(())
        }
        Commands::Config {
            action: ConfigAction::Show,
        } => cmd_config_show(&config, &cli.config),
    }
}

fn init_logging(level: &str, format: &LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Logs go to stderr so stdout stays clean for `checksum` and `genpass`.
    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

async fn load_config(path: &Path) -> Result<BvaultConfig> {
    if path.exists() {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading config {}", path.display()))?;
        BvaultConfig::from_toml_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))
    } else {
        Ok(BvaultConfig::default())
    }
}

// ── Passwords ─────────────────────────────────────────────────────────────────

/// Resolve a password from an env var or, when `prompt` is set, the terminal.
fn resolve_password(
    env_var: Option<&str>,
    prompt: bool,
    confirm: bool,
) -> Result<Option<SecretString>> {
    if let Some(var) = env_var {
        let value = std::env::var(var)
            .with_context(|| format!("password environment variable {var} is not set"))?;
        anyhow::ensure!(!value.is_empty(), "password environment variable {var} is empty");
        return Ok(Some(SecretString::from(value)));
    }
    if !prompt {
        return Ok(None);
    }

    let first = rpassword::prompt_password("Password: ").context("reading password")?;
    anyhow::ensure!(!first.is_empty(), "password must not be empty");
    if confirm {
        let second = rpassword::prompt_password("Confirm password: ").context("reading password")?;
        anyhow::ensure!(first == second, "passwords do not match");
    }
    Ok(Some(SecretString::from(first)))
}

// ── `bvault seal` / `bvault open` ─────────────────────────────────────────────

async fn cmd_seal(input: &Path, output: &Path, options: SealOptions) -> Result<()> {
    let artifact = seal_file(input, options).await?;
    tokio::fs::write(output, artifact.to_json()?)
        .await
        .with_context(|| format!("writing artifact {}", output.display()))?;

    println!(
        "sealed {} -> {} ({} bytes -> {} bytes, {} chunk(s){})",
        input.display(),
        output.display(),
        artifact.compression.original_size,
        artifact.compression.compressed_size,
        artifact.payload.chunk_count(),
        if artifact.is_encrypted() { ", encrypted" } else { "" },
    );
    Ok(())
}

async fn seal_file(input: &Path, options: SealOptions) -> Result<BackupArtifact> {
    let data = tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("reading backup {}", input.display()))?;

    let artifact = tokio::task::spawn_blocking(move || bvault_pipeline::seal(&data, &options))
        .await
        .context("seal task panicked")??;
    info!(path = %input.display(), encrypted = artifact.is_encrypted(), "sealed");
    Ok(artifact)
}

async fn cmd_open(artifact_path: &Path, output: &Path, password_env: Option<&str>) -> Result<()> {
    let artifact = read_artifact(artifact_path).await?;
    let password = resolve_password(password_env, artifact.is_encrypted(), false)?;

    let data = open_artifact(artifact, password).await?;
    tokio::fs::write(output, &data)
        .await
        .with_context(|| format!("writing backup {}", output.display()))?;

    println!(
        "opened {} -> {} ({} bytes, checksum verified)",
        artifact_path.display(),
        output.display(),
        data.len()
    );
    Ok(())
}

async fn read_artifact(path: &Path) -> Result<BackupArtifact> {
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading artifact {}", path.display()))?;
    BackupArtifact::from_json(&json).with_context(|| format!("parsing artifact {}", path.display()))
}

async fn open_artifact(artifact: BackupArtifact, password: Option<SecretString>) -> Result<String> {
    let data =
        tokio::task::spawn_blocking(move || bvault_pipeline::open(&artifact, password.as_ref()))
            .await
            .context("open task panicked")??;
    Ok(data)
}

// ── `bvault checksum` / `bvault verify` ───────────────────────────────────────

async fn checksum_file(path: &Path, structured: bool) -> Result<ChecksumRecord> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    if structured {
        let value: serde_json::Value = serde_json::from_slice(&bytes)
            .with_context(|| format!("{} is not JSON", path.display()))?;
        Ok(bvault_chunks::calculate_advanced_checksum(&value)?)
    } else {
        Ok(bvault_chunks::checksum_bytes(&bytes))
    }
}

async fn verify_file(path: &Path, record_path: &Path, structured: bool) -> Result<IntegrityReport> {
    let record_json = tokio::fs::read_to_string(record_path)
        .await
        .with_context(|| format!("reading checksum record {}", record_path.display()))?;
    let expected: ChecksumRecord = serde_json::from_str(&record_json)
        .with_context(|| format!("parsing checksum record {}", record_path.display()))?;

    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    if structured {
        let value: serde_json::Value = serde_json::from_slice(&bytes)
            .with_context(|| format!("{} is not JSON", path.display()))?;
        Ok(bvault_chunks::verify_data_integrity(&value, &expected))
    } else {
        Ok(bvault_chunks::verify_bytes_integrity(&bytes, &expected))
    }
}

async fn cmd_verify(path: &Path, record_path: &Path, structured: bool) -> Result<()> {
    let report = verify_file(path, record_path, structured).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    if !report.is_valid {
        anyhow::bail!("{} failed integrity verification", path.display());
    }
    Ok(())
}

// ── `bvault config show` ──────────────────────────────────────────────────────

fn cmd_config_show(config: &BvaultConfig, config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!("# Configuration from: {}", config_path.display());
    } else {
        println!("# Configuration: defaults (no file at {})", config_path.display());
    }
    println!();
    let rendered = config.to_toml_string().context("serializing config to TOML")?;
    print!("{rendered}");
    Ok(())
}
