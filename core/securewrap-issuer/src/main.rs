//! SecureWrap operator CLI
//!
//! Usage:
//!   securewrap wrap --file report.pdf --ip 10.0.0.5 --mac aa:bb:cc:dd:ee:ff
//!   securewrap fingerprint
//!   securewrap keygen
//!
//! `wrap` registers the rule with the Authority from the client config and
//! writes `Secure-<name>` into the output directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use dialoguer::Password;
use securewrap_client::{ClientConfig, HttpAuthority};
use securewrap_crypto::DeploymentKey;
use securewrap_device::{InterfaceSource, SystemInterfaces, derive_fingerprint};
use securewrap_issuer::{IssueRequest, Issuer};
use securewrap_types::DeviceFingerprint;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "securewrap")]
#[command(about = "Wrap files into device-bound SecureWrap packages")]
struct Cli {
    /// Client config file (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encrypt a file, register its rule and write the package
    Wrap {
        /// File to protect
        #[arg(short, long)]
        file: PathBuf,

        /// Password the recipient must enter (prompted when omitted)
        #[arg(short, long)]
        password: Option<String>,

        /// IPv4 address of the authorized device
        #[arg(long)]
        ip: String,

        /// MAC address of the authorized device, exactly as it reports it
        #[arg(long)]
        mac: String,

        /// Directory to write the package into
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,

        /// Agent stub executable (defaults to securewrap-agent next to this binary)
        #[arg(long)]
        stub: Option<PathBuf>,
    },

    /// Print this machine's MAC and IP as the agent would see them
    Fingerprint,

    /// Generate a new base64 deployment key
    Keygen,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    match cli.command {
        Command::Wrap {
            file,
            password,
            ip,
            mac,
            out_dir,
            stub,
        } => {
            let password = match password {
                Some(p) => p,
                None => prompt_password()?,
            };
            wrap(
                cli.config.as_deref(),
                IssueRequest {
                    file,
                    password,
                    fingerprint: DeviceFingerprint::new(ip, mac),
                    out_dir,
                },
                stub,
            )
        }
        Command::Fingerprint => print_fingerprint(),
        Command::Keygen => {
            println!("{}", DeploymentKey::generate().to_base64());
            Ok(())
        }
    }
}

fn wrap(config_path: Option<&Path>, request: IssueRequest, stub: Option<PathBuf>) -> Result<()> {
    let config = ClientConfig::load(config_path).context("Failed to load client config")?;
    let key = config.deployment_key().context("Deployment key unavailable")?;
    let authority =
        HttpAuthority::from_config(&config).context("Failed to create authority client")?;

    let stub_path = match stub {
        Some(path) => path,
        None => default_stub_path()?,
    };
    let stub = std::fs::read(&stub_path)
        .with_context(|| format!("Failed to read agent stub {}", stub_path.display()))?;
    info!("Using agent stub {:?}", stub_path);

    let issuer = Issuer::new(&authority, &key, config.authority_url.clone(), stub);
    let issued = issuer.issue(&request).context("Failed to issue package")?;

    println!("\n========================================");
    println!("  Package Created");
    println!("========================================");
    println!("  Package ID: {}", issued.package_id);
    println!("  Artifact:   {}", issued.artifact_path.display());
    println!("  Bound to:   {}", request.fingerprint);
    println!("  Authority:  {}", issued.manifest.authority_url);
    println!("========================================\n");
    Ok(())
}

fn prompt_password() -> Result<String> {
    let password = Password::new()
        .with_prompt("Package password")
        .with_confirmation("Confirm password", "Passwords do not match")
        .interact()
        .context("Password prompt failed")?;
    if password.is_empty() {
        bail!("password must not be empty");
    }
    Ok(password)
}

fn default_stub_path() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("Cannot locate this executable")?;
    let dir = exe.parent().context("Executable has no parent directory")?;
    Ok(dir.join(format!("securewrap-agent{}", std::env::consts::EXE_SUFFIX)))
}

fn print_fingerprint() -> Result<()> {
    let interfaces = SystemInterfaces
        .interfaces()
        .context("Failed to enumerate network interfaces")?;
    for iface in &interfaces {
        info!(
            "{}: up={} loopback={} mac={} addrs={:?}",
            iface.name,
            iface.is_up,
            iface.is_loopback,
            iface.mac.as_deref().unwrap_or("-"),
            iface.addresses
        );
    }

    let fingerprint = derive_fingerprint().context("No usable network identity")?;
    println!("MAC Address: {}", fingerprint.mac);
    println!("IP Address:  {}", fingerprint.ip);
    Ok(())
}
