//! Deploy the reality.eth cross-chain proxies.
//!
//! - `deploy`: run the tagged deployment steps on the selected network
//! - `import`: record a contract deployed outside this tool
//! - `render`: print the dispute template and data mapping
//! - `networks`: list the network registry

use alloy_primitives::{Address, Bytes};
use alloy_provider::Provider;
use clap::{Parser, Subcommand};
use client::{DeployerSigner, RemoteSigner, SignerFn};
use config::{CredentialSource, NetworkDescriptor, NetworkRegistry};
use deployment::{Artifacts, ChainSubmitter, DeploymentRecord, DeploymentStore, FileStore};
use deployer::{
    config::Config, metrics::install_prometheus_exporter, render_documents, seed_external,
    Orchestrator, StepOutcome, Tag,
};
use eyre::{bail, WrapErr};
use std::{path::PathBuf, sync::Arc};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "deployer")]
#[command(about = "Deploy the reality.eth home/foreign proxy pair")]
struct Cli {
    /// Path to the configuration file; built-in testnet settings when omitted
    #[arg(short, long, env = "DEPLOYER_CONFIG")]
    config: Option<PathBuf>,

    /// Network to connect to
    #[arg(short, long, env = "DEPLOYER_NETWORK")]
    network: String,

    /// Serve Prometheus metrics on this port
    #[arg(long)]
    metrics_port: Option<u16>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the deployment steps selected by tag
    Deploy {
        #[arg(
            long,
            value_enum,
            value_delimiter = ',',
            ignore_case = true,
            default_values_t = [Tag::Home, Tag::Foreign]
        )]
        tags: Vec<Tag>,
    },

    /// Record an externally deployed contract on the selected network
    Import {
        /// Logical name, e.g. `EndpointV2`
        #[arg(long)]
        name: String,

        #[arg(long)]
        address: Address,
    },

    /// Print the dispute template and data mapping for the selected network
    Render,

    /// List registered networks
    Networks,
}

impl Command {
    /// Whether the command reads the deployment profile.
    const fn uses_profile(&self) -> bool {
        matches!(self, Self::Deploy { .. } | Self::Render)
    }
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::from_file(path)
            .wrap_err_with(|| format!("failed to load {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(port) = cli.metrics_port {
        install_prometheus_exporter(port)?;
        info!(port, "metrics exporter listening");
    }

    let registry = config.registry()?;
    let profile = config.profile();
    if cli.command.uses_profile() {
        profile.validate(&registry)?;
    }

    match cli.command {
        Command::Networks => {
            for network in registry.iter() {
                println!(
                    "{:<20} chain {:<10} eid {:<6} {:?} companion {}",
                    network.name,
                    network.chain_id,
                    network.endpoint_id,
                    network.role,
                    network.companion.as_deref().unwrap_or("-")
                );
            }
        }
        Command::Import { name, address } => {
            let (network, mut store) = open_store(&config, &registry, &cli.network)?;
            store.insert(DeploymentRecord::imported(name.clone(), address))?;
            info!(network = %network.name, name, %address, "imported");
        }
        Command::Render => {
            let (network, store) = open_store(&config, &registry, &cli.network)?;
            let (template, mapping) = render_documents(&profile, &network, &store)?;
            println!("{template}");
            println!("{mapping}");
        }
        Command::Deploy { tags } => {
            let (network, store) = open_store(&config, &registry, &cli.network)?;
            info!(network = %network.name, chain_id = network.chain_id, ?tags, "starting deployment");

            let provider = client::create_provider(&network.rpc_url)?;
            let chain_id = provider.get_chain_id().await?;
            if chain_id != network.chain_id {
                bail!(
                    "{} is configured as chain {} but its RPC reports chain {chain_id}",
                    network.name,
                    network.chain_id
                );
            }

            let signer = deployer_signer(&network)?;
            let signers: Vec<Address> = signer.iter().map(DeployerSigner::address).collect();
            // skipped and already deployed steps need no account
            let deployer = match client::resolve_deployer(config.accounts.deployer, &signers) {
                Ok(deployer) => {
                    info!(%deployer, "deployer account");
                    Some(deployer)
                }
                Err(err) => {
                    warn!(%err, "steps that submit a transaction will fail");
                    None
                }
            };

            let signer_fn = match signer {
                Some(signer) => client::signer_fn(signer, chain_id, provider.clone()),
                None => unavailable_signer(),
            };
            let submitter = ChainSubmitter::new(
                provider,
                signer_fn,
                deployer,
                Artifacts::new(config.artifacts_dir()),
            );

            let mut orchestrator = Orchestrator::new(&registry, &profile, store, submitter);
            for report in orchestrator.run(&network, &tags).await? {
                match report.outcome {
                    StepOutcome::Skipped { expected, current } => {
                        info!(step = report.logical_name, %expected, %current, "skipped");
                    }
                    StepOutcome::AlreadyDeployed(record) => {
                        info!(step = report.logical_name, address = %record.address, "reusing");
                    }
                    StepOutcome::Deployed(record) => {
                        info!(step = report.logical_name, address = %record.address, "deployed");
                    }
                }
            }
        }
    }

    Ok(())
}

/// Open the deployment store of `name`, seeded with its configured external contracts.
fn open_store(
    config: &Config,
    registry: &NetworkRegistry,
    name: &str,
) -> eyre::Result<(NetworkDescriptor, FileStore)> {
    let network = registry.get(name)?.clone();
    let mut store = FileStore::open(config.deployments_dir(), &network.name)?;

    let imported = seed_external(&mut store, &config.external(&network.name))?;
    if imported > 0 {
        info!(network = %network.name, imported, "seeded external deployments");
    }
    Ok((network, store))
}

/// The signer configured for `network`, if any.
fn deployer_signer(network: &NetworkDescriptor) -> eyre::Result<Option<DeployerSigner>> {
    match &network.credentials {
        CredentialSource::Env => {
            let mnemonic = std::env::var("MNEMONIC").ok();
            let private_key = std::env::var("PRIVATE_KEY").ok();
            let local = client::local_signer(mnemonic.as_deref(), private_key.as_deref())?;
            if local.is_none() {
                warn!(
                    network = %network.name,
                    "neither MNEMONIC nor PRIVATE_KEY is set, transactions cannot be signed"
                );
            }
            Ok(local.map(DeployerSigner::Local))
        }
        CredentialSource::Remote { url, address } => Ok(Some(DeployerSigner::Remote(
            RemoteSigner::new(url.clone(), *address, network.chain_id),
        ))),
    }
}

fn unavailable_signer() -> SignerFn {
    Arc::new(|_tx| {
        Box::pin(async {
            Err::<Bytes, _>(eyre::eyre!(
                "no signer configured: set MNEMONIC or PRIVATE_KEY"
            ))
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(["deployer", "--network", "sepolia"].iter().chain(args)).unwrap()
    }

    #[test]
    fn test_profile_checked_only_where_used() {
        assert!(parse(&["deploy"]).command.uses_profile());
        assert!(parse(&["render"]).command.uses_profile());
        assert!(!parse(&["networks"]).command.uses_profile());
        assert!(!parse(&["import", "--name", "WETH", "--address", &Address::ZERO.to_string()])
            .command
            .uses_profile());
    }

    #[test]
    fn test_deploy_tags() {
        let Command::Deploy { tags } = parse(&["deploy", "--tags", "foreign"]).command else {
            panic!("not a deploy command");
        };
        assert_eq!(tags, vec![Tag::Foreign]);

        let Command::Deploy { tags } = parse(&["deploy"]).command else {
            panic!("not a deploy command");
        };
        assert_eq!(tags, vec![Tag::Home, Tag::Foreign]);
    }
}
