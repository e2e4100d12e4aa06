//! config-seed - Main entry point
//!
//! Loads the process configuration, waits for the Consul agent, optionally
//! wipes the global prefix, then seeds the legacy and structured
//! configuration trees into the key/value store.
//!
//! Without `--registry` the run is a dry run against an in-memory store.

mod telemetry;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use config_seed_config::{validate_config, ConfigLoader, SeedConfig};
use config_seed_core::{SeedController, SeedReport};
use config_seed_registry::{
    wait_until_reachable, ConsulClient, MemoryRegistry, ReachabilityPolicy,
};
use tracing::{debug, error, info, warn};

const BANNER_FILE: &str = "banner.txt";

/// Configuration seed CLI
#[derive(Parser, Debug)]
#[command(name = "config-seed", author, version, about, long_about = None)]
struct Args {
    /// Write to the registry; without this flag nothing leaves the process
    #[arg(short = 'c', long = "registry", visible_alias = "consul")]
    registry: bool,

    /// Load configuration-<PROFILE>.toml instead of configuration.toml
    #[arg(short, long)]
    profile: Option<String>,

    /// Directory holding configuration.toml (default: $CONFIG_SEED_CONF_DIR, then ./res)
    #[arg(long)]
    confdir: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    telemetry::init_tracing(args.log_json)?;

    let conf_dir = ConfigLoader::resolve_dir(args.confdir.as_deref());
    let config = ConfigLoader::load_from_dir(&conf_dir)
        .with_context(|| format!("loading configuration from {}", conf_dir.display()))?;
    validate_config(&config)?;

    let report = if args.registry {
        seed_registry(&config, args.profile).await?
    } else {
        dry_run(&config, args.profile).await?
    };

    for failure in &report.failures {
        error!(
            pipeline = %failure.pipeline,
            path = %failure.path.display(),
            error = %failure.error,
            "file not seeded"
        );
    }
    info!("{}", report);

    print_banner(&conf_dir.join(BANNER_FILE));
    Ok(())
}

async fn seed_registry(config: &SeedConfig, profile: Option<String>) -> anyhow::Result<SeedReport> {
    let consul = ConsulClient::from_config(&config.registry)?;
    let policy = ReachabilityPolicy::from_config(&config.registry);

    info!(url = %consul.base_url(), "waiting for registry");
    wait_until_reachable(&policy, || consul.ping()).await?;

    let controller =
        SeedController::new(Arc::new(consul), config.seed.clone()).with_profile(profile);
    Ok(controller.run().await?)
}

async fn dry_run(config: &SeedConfig, profile: Option<String>) -> anyhow::Result<SeedReport> {
    warn!("dry run: pass --registry to write to the registry");

    let store = Arc::new(MemoryRegistry::new());
    let controller =
        SeedController::new(store.clone(), config.seed.clone()).with_profile(profile);
    let report = controller.run().await?;

    for (key, value) in store.snapshot() {
        info!(%key, %value, "would write");
    }
    Ok(report)
}

fn print_banner(path: &Path) {
    match std::fs::read_to_string(path) {
        Ok(banner) => println!("{banner}"),
        Err(e) => debug!(path = %path.display(), error = %e, "no banner"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let args = Args::try_parse_from(["config-seed", "-c", "-p", "docker", "--confdir", "/etc/seed"])
            .unwrap();
        assert!(args.registry);
        assert_eq!(args.profile.as_deref(), Some("docker"));
        assert_eq!(args.confdir, Some(PathBuf::from("/etc/seed")));
        assert!(!args.log_json);
    }

    #[test]
    fn test_consul_alias() {
        let args = Args::try_parse_from(["config-seed", "--consul"]).unwrap();
        assert!(args.registry);
    }

    #[test]
    fn test_defaults_are_dry_run() {
        let args = Args::try_parse_from(["config-seed"]).unwrap();
        assert!(!args.registry);
        assert!(args.profile.is_none());
        assert!(args.confdir.is_none());
    }

    #[tokio::test]
    async fn test_dry_run_against_shipped_resources() {
        let res = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../res");
        let mut config = ConfigLoader::from_file(&res.join("configuration.toml")).unwrap();
        config.seed.legacy_path = res.join("properties");
        config.seed.structured_path = res.join("config");

        let report = dry_run(&config, None).await.unwrap();
        assert!(report.is_clean(), "unexpected failures: {:?}", report.failures);
        assert!(report.files_seeded > 0);
    }
}
