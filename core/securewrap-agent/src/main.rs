//! SecureWrap agent stub.
//!
//! The issuer appends a package trailer to a copy of this binary. When the
//! resulting artifact runs, it reads its own trailer and executes the
//! verification protocol against the Authority named in the manifest.
//!
//! The deployment key comes from the client config or
//! `SECUREWRAP_DEPLOYMENT_KEY`, falling back to a key compiled in through the
//! same variable at build time.

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use securewrap_agent::{Agent, Console, Destroyer, Outcome, SelfDestruct, TerminalConsole};
use securewrap_client::{ClientConfig, HttpAuthority};
use securewrap_crypto::DeploymentKey;
use securewrap_device::SystemInterfaces;
use securewrap_package::PackageArtifact;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "securewrap-agent")]
#[command(about = "Opens a SecureWrap package on an authorized device")]
struct Args {
    /// Client config file (defaults to the platform config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

const COMPILED_KEY: Option<&str> = option_env!("SECUREWRAP_DEPLOYMENT_KEY");

fn main() {
    let code = match run() {
        Ok(outcome) => outcome.exit_code(),
        Err(e) => {
            error!("{:#}", e);
            eprintln!("securewrap-agent: {e:#}");
            2
        }
    };
    std::process::exit(code);
}

fn run() -> Result<Outcome> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::WARN };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    let exe = std::env::current_exe().context("Cannot locate the running package")?;
    let console = TerminalConsole;
    let destroyer = SelfDestruct::new();

    let artifact = match PackageArtifact::read_from_path(&exe) {
        Ok(artifact) => artifact,
        Err(e) => {
            error!("Package trailer unreadable: {}", e);
            console.error("Critical Error", securewrap_agent::MSG_CORRUPTED);
            destroyer.destroy(&exe);
            return Err(anyhow!("package trailer unreadable: {e}"));
        }
    };

    let config =
        ClientConfig::load(args.config.as_deref()).context("Failed to load client config")?;
    let key = resolve_key(&config)?;
    let authority = HttpAuthority::new(
        artifact.manifest.authority_url.clone(),
        config.request_timeout(),
    )
    .context("Failed to create authority client")?;
    info!("Authority: {}", authority.base_url());

    let mut agent = Agent::new(&authority, &SystemInterfaces, &console, &destroyer, &key);
    Ok(agent.run(&artifact, &exe))
}

fn resolve_key(config: &ClientConfig) -> Result<DeploymentKey> {
    if config.deployment_key.is_some() {
        return config.deployment_key().context("Invalid deployment key");
    }
    let compiled = COMPILED_KEY.ok_or_else(|| anyhow!("no deployment key configured"))?;
    DeploymentKey::from_base64(compiled).context("Invalid compiled-in deployment key")
}
