//! Fhirsight command-line tooling
//!
//! Companion tooling for study deployments: export the study
//! configuration file, generate report encryption key pairs, and
//! decrypt uploaded study reports on the receiving side.

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use clap::{Parser, Subcommand};
use fhirsight::config::{AppConfiguration, LaunchMode, StudyDefinition, TaskDefinition};
use fhirsight::crypto::{PrivateKey, PublicKey};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "fhirsight")]
#[command(version)]
#[command(about = "Study configuration and report tooling for fhirsight deployments")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a study configuration file
    ExportConfig {
        /// Study identifier
        #[arg(long)]
        study_id: String,

        /// Study title
        #[arg(long)]
        title: String,

        /// Enrollment explainer text
        #[arg(long)]
        explainer: String,

        /// API key for LLM access
        #[arg(long, env = "FHIRSIGHT_API_KEY")]
        api_key: String,

        /// Address study reports are announced to
        #[arg(long)]
        report_email: Option<String>,

        /// PEM file with the report encryption public key
        #[arg(long)]
        public_key: Option<PathBuf>,

        /// JSON file with the task definitions
        #[arg(long)]
        tasks: Option<PathBuf>,

        /// Launch mode to record
        #[arg(long, default_value = "study")]
        launch_mode: String,

        /// Output file
        #[arg(short, long, default_value = "fhirsight-config.json")]
        output: PathBuf,
    },

    /// Decrypt an uploaded study report
    Decrypt {
        /// PEM file with the report encryption private key
        #[arg(short, long)]
        key: PathBuf,

        /// Encrypted report file
        #[arg(short, long)]
        input: PathBuf,

        /// Output file, or "-" for standard output
        #[arg(short, long, default_value = "-")]
        output: String,
    },

    /// Generate a report encryption key pair
    Keygen {
        /// Output file for the private key PEM
        #[arg(long, default_value = "report-key.pem")]
        private: PathBuf,

        /// Output file for the public key PEM
        #[arg(long, default_value = "report-key.pub.pem")]
        public: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("fhirsight={}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::ExportConfig {
            study_id,
            title,
            explainer,
            api_key,
            report_email,
            public_key,
            tasks,
            launch_mode,
            output,
        } => {
            export_config(
                study_id,
                title,
                explainer,
                api_key,
                report_email,
                public_key,
                tasks,
                &launch_mode,
                output,
            )
            .await
        }
        Commands::Decrypt { key, input, output } => decrypt(key, input, &output).await,
        Commands::Keygen { private, public } => keygen(private, public).await,
    }
}

#[allow(clippy::too_many_arguments)]
async fn export_config(
    study_id: String,
    title: String,
    explainer: String,
    api_key: String,
    report_email: Option<String>,
    public_key: Option<PathBuf>,
    tasks: Option<PathBuf>,
    launch_mode: &str,
    output: PathBuf,
) -> Result<()> {
    let launch_mode = match launch_mode {
        "ordinary" => LaunchMode::Ordinary,
        "study" => LaunchMode::Study,
        other => anyhow::bail!("unknown launch mode '{}'", other),
    };

    let encryption_public_key = match public_key {
        Some(path) => {
            let pem = tokio::fs::read(&path)
                .await
                .with_context(|| format!("reading public key {}", path.display()))?;
            // Validate before embedding
            PublicKey::from_pem(&pem).context("parsing public key")?;
            Some(BASE64.encode(&pem))
        }
        None => None,
    };

    let task_definitions: Vec<TaskDefinition> = match tasks {
        Some(path) => {
            let data = tokio::fs::read(&path)
                .await
                .with_context(|| format!("reading task definitions {}", path.display()))?;
            serde_json::from_slice(&data).context("parsing task definitions")?
        }
        None => Vec::new(),
    };

    let config = AppConfiguration {
        launch_mode,
        studies: vec![StudyDefinition {
            id: study_id,
            title,
            explainer,
            api_key,
            report_email,
            encryption_public_key,
            tasks: task_definitions,
        }],
    };

    // Exercise the same conversion the app performs at startup
    config.studies().context("validating study definitions")?;

    config.save(&output).await?;
    tracing::info!("Wrote configuration to {}", output.display());
    Ok(())
}

async fn decrypt(key: PathBuf, input: PathBuf, output: &str) -> Result<()> {
    let pem = tokio::fs::read(&key)
        .await
        .with_context(|| format!("reading private key {}", key.display()))?;
    let private = PrivateKey::from_pem(&pem).context("parsing private key")?;

    let ciphertext = tokio::fs::read(&input)
        .await
        .with_context(|| format!("reading encrypted report {}", input.display()))?;
    let plaintext = fhirsight::crypto::open(&ciphertext, &private).context("decrypting report")?;

    if output == "-" {
        use tokio::io::AsyncWriteExt;
        tokio::io::stdout().write_all(&plaintext).await?;
    } else {
        tokio::fs::write(output, &plaintext).await?;
        tracing::info!("Wrote decrypted report to {}", output);
    }
    Ok(())
}

async fn keygen(private_path: PathBuf, public_path: PathBuf) -> Result<()> {
    let private = PrivateKey::generate();

    tokio::fs::write(&private_path, private.to_pem()).await?;
    tokio::fs::write(&public_path, private.public_key().to_pem()).await?;

    tracing::info!(
        "Wrote key pair to {} / {}",
        private_path.display(),
        public_path.display()
    );
    Ok(())
}
