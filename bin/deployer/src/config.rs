use ::config::{
    CredentialSource, DeploymentProfile, NetworkDescriptor, NetworkError, NetworkRegistry,
    NetworkRole,
};
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

/// Top-level deployer configuration (`deployer.toml`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Root of the per-network deployment records
    pub deployments_dir: PathBuf,

    /// Compiled contract artifacts
    pub artifacts_dir: PathBuf,

    pub accounts: Accounts,

    /// Overrides of built-in networks, or new networks
    pub networks: BTreeMap<String, NetworkOverride>,

    /// Deployment parameters; the built-in testnet profile when absent
    pub profile: Option<DeploymentProfile>,
}

/// Named accounts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Accounts {
    /// Account deployments are sent from, the first signer if unset
    pub deployer: Option<Address>,
}

/// Per-network settings. Every field overrides the built-in value of the same name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkOverride {
    pub chain_id: Option<u64>,
    pub endpoint_id: Option<u32>,
    pub role: Option<NetworkRole>,
    pub companion: Option<String>,
    pub rpc_url: Option<String>,
    pub credentials: Option<CredentialSource>,

    /// Contracts deployed outside this tool, by logical name
    pub external: BTreeMap<String, Address>,
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;

        Ok(config)
    }

    pub fn deployments_dir(&self) -> &Path {
        non_empty_or(&self.deployments_dir, "deployments")
    }

    pub fn artifacts_dir(&self) -> &Path {
        non_empty_or(&self.artifacts_dir, "artifacts")
    }

    /// The network registry, with RPC urls taken from `RPC_URL_<NAME>` where not configured.
    pub fn registry(&self) -> Result<NetworkRegistry, NetworkError> {
        self.registry_with_env(|key| std::env::var(key).ok())
    }

    /// Build the registry, reading environment variables through `env`.
    pub fn registry_with_env(
        &self,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<NetworkRegistry, NetworkError> {
        let mut networks: BTreeMap<String, NetworkDescriptor> = NetworkRegistry::testnet()
            .into_iter()
            .map(|network| (network.name.clone(), network))
            .collect();

        for (name, custom) in &self.networks {
            match networks.get_mut(name) {
                Some(network) => custom.apply(network),
                None => {
                    let network = custom.to_descriptor(name)?;
                    networks.insert(name.clone(), network);
                }
            }
        }

        for network in networks.values_mut() {
            let configured = self
                .networks
                .get(&network.name)
                .is_some_and(|custom| custom.rpc_url.is_some());
            if !configured {
                if let Some(url) = env(&rpc_url_var(&network.name)) {
                    network.rpc_url = url;
                }
            }
        }

        NetworkRegistry::new(networks.into_values())
    }

    pub fn profile(&self) -> DeploymentProfile {
        self.profile.clone().unwrap_or_else(DeploymentProfile::testnet)
    }

    /// External contracts configured for `network`.
    pub fn external(&self, network: &str) -> BTreeMap<String, Address> {
        self.networks
            .get(network)
            .map(|custom| custom.external.clone())
            .unwrap_or_default()
    }
}

impl NetworkOverride {
    fn apply(&self, network: &mut NetworkDescriptor) {
        if let Some(chain_id) = self.chain_id {
            network.chain_id = chain_id;
        }
        if let Some(endpoint_id) = self.endpoint_id {
            network.endpoint_id = endpoint_id;
        }
        if let Some(role) = self.role {
            network.role = role;
        }
        if let Some(companion) = &self.companion {
            network.companion = Some(companion.clone());
        }
        if let Some(rpc_url) = &self.rpc_url {
            network.rpc_url = rpc_url.clone();
        }
        if let Some(credentials) = &self.credentials {
            network.credentials = credentials.clone();
        }
    }

    fn to_descriptor(&self, name: &str) -> Result<NetworkDescriptor, NetworkError> {
        let missing = |field: &str| {
            NetworkError::InvalidRegistry(format!("new network `{name}` needs `{field}`"))
        };

        Ok(NetworkDescriptor {
            name: name.to_string(),
            chain_id: self.chain_id.ok_or_else(|| missing("chain_id"))?,
            endpoint_id: self.endpoint_id.unwrap_or_default(),
            role: self.role.ok_or_else(|| missing("role"))?,
            companion: self.companion.clone(),
            rpc_url: self.rpc_url.clone().unwrap_or_default(),
            credentials: self.credentials.clone().unwrap_or_default(),
        })
    }
}

/// `arbitrum-sepolia` reads `RPC_URL_ARBITRUM_SEPOLIA`.
fn rpc_url_var(network: &str) -> String {
    let name: String = network
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    format!("RPC_URL_{name}")
}

fn non_empty_or<'a>(path: &'a Path, default: &'a str) -> &'a Path {
    if path.as_os_str().is_empty() {
        Path::new(default)
    } else {
        path
    }
}
