//! openvox-ca - command line client for the Puppet CA API
//!
//! Lists, signs, revokes and cleans certificates on an OpenVox/Puppet CA over
//! mutual TLS. Structured results are printed as JSON, PEM material as-is.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use openvox_ca_client::config::{self, LogFormat, LogTarget};
use openvox_ca_client::{AppConfig, CaClient, CertificateState};

#[derive(Debug, Parser)]
#[command(name = "openvox-ca", version, about = "Manage certificates on an OpenVox/Puppet CA")]
struct Cli {
    /// Configuration file (default: search standard locations)
    #[arg(short, long, global = true, env = "OPENVOX_CA_CONFIG")]
    config: Option<PathBuf>,

    /// CA URL, overriding the configuration
    #[arg(long, global = true)]
    url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show the status of a certificate or pending request
    Status { name: String },
    /// Print a signed certificate
    Download { name: String },
    /// Print the CA certificate
    CaCert,
    /// List certificates
    List {
        /// Only certificates in this state (requested, signed, revoked)
        #[arg(long)]
        state: Option<CertificateState>,
    },
    /// Sign a pending request
    Sign {
        name: String,
        /// Certificate lifetime in seconds
        #[arg(long)]
        ttl: Option<u64>,
    },
    /// Revoke a signed certificate
    Revoke { name: String },
    /// Delete everything the CA holds for a name without revoking
    Delete { name: String },
    /// Revoke and delete certificates
    Clean {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Sign several pending requests at once
    BulkSign {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Sign every pending request
    SignAll,
    /// Certificate signing requests
    #[command(subcommand)]
    Csr(CsrCommand),
}

#[derive(Debug, Subcommand)]
enum CsrCommand {
    /// Submit a PEM encoded CSR from a file
    Submit { name: String, file: PathBuf },
    /// Print a pending CSR
    Download { name: String },
    /// Delete a pending CSR
    Withdraw { name: String },
    /// List pending CSRs
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (before logging, so we know log format)
    let mut config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(url) = cli.url {
        config.puppet_ca.url = url;
        config.validate().context("Invalid --url")?;
    }

    // The guard must be kept alive for the duration of the program
    let _log_guard = init_logging(&config);

    let ca = CaClient::new(&config.puppet_ca).context("Failed to initialize Puppet CA client")?;
    info!("Using Puppet CA at {}", ca.base_url());

    run(&ca, cli.command).await
}

async fn run(ca: &CaClient, command: Command) -> Result<()> {
    match command {
        Command::Status { name } => print_json(&ca.get_certificate(&name).await?),
        Command::Download { name } => print_pem(&ca.download_certificate(&name).await?),
        Command::CaCert => print_pem(&ca.ca_certificate().await?),
        Command::List { state } => print_json(&ca.list_certificates(state).await?),
        Command::Sign { name, ttl } => {
            ca.sign_certificate_request(&name, ttl).await?;
            println!("Signed certificate request for {}", name);
            Ok(())
        }
        Command::Revoke { name } => {
            ca.revoke_certificate(&name).await?;
            println!("Revoked certificate for {}", name);
            Ok(())
        }
        Command::Delete { name } => match ca.delete_certificate(&name).await {
            Ok(()) => {
                println!("Deleted {}", name);
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                println!("Nothing to delete for {}", name);
                Ok(())
            }
            Err(e) => Err(e.into()),
        },
        Command::Clean { names } => print_json(&ca.clean_certificates(&names).await?),
        Command::BulkSign { names } => print_json(&ca.bulk_sign(&names).await?),
        Command::SignAll => print_json(&ca.sign_all().await?),
        Command::Csr(csr) => run_csr(ca, csr).await,
    }
}

async fn run_csr(ca: &CaClient, command: CsrCommand) -> Result<()> {
    match command {
        CsrCommand::Submit { name, file } => {
            let pem = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read CSR file: {:?}", file))?;
            ca.submit_certificate_request(&name, &pem).await?;
            println!("Submitted certificate request for {}", name);
            Ok(())
        }
        CsrCommand::Download { name } => print_pem(&ca.download_certificate_request(&name).await?),
        CsrCommand::Withdraw { name } => {
            ca.withdraw_certificate_request(&name).await?;
            println!("Withdrew certificate request for {}", name);
            Ok(())
        }
        CsrCommand::List => print_json(&ca.list_certificate_requests().await?),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let output = serde_json::to_string_pretty(value).context("Failed to format output")?;
    println!("{}", output);
    Ok(())
}

fn print_pem(pem: &str) -> Result<()> {
    print!("{}", pem);
    if !pem.ends_with('\n') {
        println!();
    }
    Ok(())
}

/// Initialize the logging/tracing infrastructure
///
/// Console output goes to stderr so stdout stays parseable.
fn init_logging(config: &AppConfig) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{prelude::*, EnvFilter};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let log_config = &config.logging;
    let to_console = matches!(log_config.target, LogTarget::Console | LogTarget::Both);
    let (file_writer, guard) = match log_config.target {
        LogTarget::File | LogTarget::Both => {
            let (writer, guard) = create_file_writer(log_config);
            (Some(writer), Some(guard))
        }
        LogTarget::Console => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(to_console.then(|| format_layer(&log_config.format, std::io::stderr)))
        .with(file_writer.map(|writer| format_layer(&log_config.format, writer)))
        .init();

    guard
}

/// Create a file writer with optional daily rotation
fn create_file_writer(
    log_config: &config::LoggingConfig,
) -> (
    tracing_appender::non_blocking::NonBlocking,
    tracing_appender::non_blocking::WorkerGuard,
) {
    if let Err(e) = std::fs::create_dir_all(&log_config.log_dir) {
        eprintln!(
            "Warning: Failed to create log directory {:?}: {}",
            log_config.log_dir, e
        );
    }

    let file_appender = if log_config.daily_rotation {
        tracing_appender::rolling::daily(&log_config.log_dir, &log_config.log_prefix)
    } else {
        tracing_appender::rolling::never(&log_config.log_dir, &log_config.log_prefix)
    };

    tracing_appender::non_blocking(file_appender)
}

/// Build one output layer in the configured format
fn format_layer<S, W>(
    format: &LogFormat,
    writer: W,
) -> Box<dyn tracing_subscriber::Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    W: for<'w> tracing_subscriber::fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    use tracing_subscriber::{fmt, Layer};

    match format {
        LogFormat::Json => fmt::layer().json().with_target(true).with_writer(writer).boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(false)
            .with_writer(writer)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_writer(writer)
            .boxed(),
    }
}
