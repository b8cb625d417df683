//! Network registry for the home/foreign proxy pair.
//!
//! Each network carries its LayerZero endpoint id and the name of its companion network,
//! the network the counterpart proxy lives on.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// LayerZero V2 endpoint ids.
/// See <https://docs.layerzero.network/v2/deployments/deployed-contracts>
pub mod eid {
    pub const SEPOLIA_V2_TESTNET: u32 = 40161;
    pub const ARBSEP_V2_TESTNET: u32 = 40231;
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// Network not registered, or no usable companion declared
    #[error("unknown network `{name}`: {reason}")]
    UnknownNetwork { name: String, reason: String },

    /// Registry or profile violates the companion invariant
    #[error("invalid network registry: {0}")]
    InvalidRegistry(String),
}

impl NetworkError {
    fn unknown(name: &str, reason: impl Into<String>) -> Self {
        Self::UnknownNetwork {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Which side of the bridge a network hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkRole {
    Home,
    Foreign,
    /// Local development node, never a deployment target
    Local,
}

/// Where the deployer's signing key comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CredentialSource {
    /// `MNEMONIC` or `PRIVATE_KEY` environment variables
    #[default]
    Env,
    /// signer-proxy answering `eth_signTransaction`
    Remote { url: String, address: Address },
}

/// A named network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkDescriptor {
    pub name: String,
    /// EIP-155 chain id
    pub chain_id: u64,
    /// LayerZero endpoint id
    pub endpoint_id: u32,
    pub role: NetworkRole,
    /// Network hosting the counterpart proxy
    pub companion: Option<String>,
    pub rpc_url: String,
    #[serde(default)]
    pub credentials: CredentialSource,
}

impl NetworkDescriptor {
    /// Ethereum Sepolia, home side.
    pub fn sepolia() -> Self {
        Self {
            name: "sepolia".to_string(),
            chain_id: 11155111,
            endpoint_id: eid::SEPOLIA_V2_TESTNET,
            role: NetworkRole::Home,
            companion: Some("arbitrum-sepolia".to_string()),
            rpc_url: "https://sepolia.gateway.tenderly.co".to_string(),
            credentials: CredentialSource::Env,
        }
    }

    /// Arbitrum Sepolia, foreign side.
    pub fn arbitrum_sepolia() -> Self {
        Self {
            name: "arbitrum-sepolia".to_string(),
            chain_id: 421614,
            endpoint_id: eid::ARBSEP_V2_TESTNET,
            role: NetworkRole::Foreign,
            companion: Some("sepolia".to_string()),
            rpc_url: "https://arbitrum-sepolia.gateway.tenderly.co".to_string(),
            credentials: CredentialSource::Env,
        }
    }

    /// Local hardhat/anvil node.
    pub fn hardhat() -> Self {
        Self {
            name: "hardhat".to_string(),
            chain_id: 31337,
            endpoint_id: 0,
            role: NetworkRole::Local,
            companion: None,
            rpc_url: "http://127.0.0.1:8545".to_string(),
            credentials: CredentialSource::Env,
        }
    }
}

/// Static table of networks, keyed by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkRegistry {
    networks: BTreeMap<String, NetworkDescriptor>,
}

impl NetworkRegistry {
    /// Build a registry, checking that names are unique and declared companions are registered.
    pub fn new(
        descriptors: impl IntoIterator<Item = NetworkDescriptor>,
    ) -> Result<Self, NetworkError> {
        let mut networks = BTreeMap::new();
        for descriptor in descriptors {
            let name = descriptor.name.clone();
            if networks.insert(name.clone(), descriptor).is_some() {
                return Err(NetworkError::InvalidRegistry(format!(
                    "network `{name}` registered twice"
                )));
            }
        }

        let registry = Self { networks };
        registry.validate()?;
        Ok(registry)
    }

    /// Sepolia (home) paired with Arbitrum Sepolia (foreign), plus a local node.
    pub fn testnet() -> Self {
        let networks = [
            NetworkDescriptor::sepolia(),
            NetworkDescriptor::arbitrum_sepolia(),
            NetworkDescriptor::hardhat(),
        ];
        Self {
            networks: networks.into_iter().map(|n| (n.name.clone(), n)).collect(),
        }
    }

    fn validate(&self) -> Result<(), NetworkError> {
        for network in self.networks.values() {
            let Some(companion) = &network.companion else {
                continue;
            };
            if companion == &network.name {
                return Err(NetworkError::InvalidRegistry(format!(
                    "network `{}` is its own companion",
                    network.name
                )));
            }
            if !self.networks.contains_key(companion) {
                return Err(NetworkError::InvalidRegistry(format!(
                    "network `{}` declares unregistered companion `{companion}`",
                    network.name
                )));
            }
        }
        Ok(())
    }

    /// Look up a network by name.
    pub fn get(&self, name: &str) -> Result<&NetworkDescriptor, NetworkError> {
        self.networks
            .get(name)
            .ok_or_else(|| NetworkError::unknown(name, "not registered"))
    }

    /// Return the companion of `name`.
    pub fn resolve_companion(&self, name: &str) -> Result<&NetworkDescriptor, NetworkError> {
        let network = self.get(name)?;
        let companion = network
            .companion
            .as_deref()
            .ok_or_else(|| NetworkError::unknown(name, "no companion network declared"))?;

        self.networks.get(companion).ok_or_else(|| {
            NetworkError::unknown(name, format!("companion `{companion}` is not registered"))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &NetworkDescriptor> {
        self.networks.values()
    }
}

impl IntoIterator for NetworkRegistry {
    type Item = NetworkDescriptor;
    type IntoIter = std::collections::btree_map::IntoValues<String, NetworkDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.networks.into_values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_testnet_registry_is_valid() {
        let registry = NetworkRegistry::testnet();
        assert!(registry.validate().is_ok());
        assert_eq!(registry.iter().count(), 3);
    }

    #[test]
    fn test_companions_are_symmetric() {
        let registry = NetworkRegistry::testnet();

        let pairs = [
            ("sepolia", "arbitrum-sepolia", eid::ARBSEP_V2_TESTNET),
            ("arbitrum-sepolia", "sepolia", eid::SEPOLIA_V2_TESTNET),
        ];
        for (name, companion_name, companion_eid) in pairs {
            let companion = registry.resolve_companion(name).unwrap();
            assert_eq!(companion.name, companion_name);
            assert_eq!(companion.endpoint_id, companion_eid);
            assert_ne!(companion.endpoint_id, registry.get(name).unwrap().endpoint_id);

            let back = registry.resolve_companion(&companion.name).unwrap();
            assert_eq!(back.name, name);
        }
        assert_eq!(
            registry.iter().filter(|n| n.companion.is_some()).count(),
            pairs.len()
        );
    }

    #[test]
    fn test_resolve_companion_endpoint_ids() {
        let registry = NetworkRegistry::testnet();

        let foreign = registry.resolve_companion("sepolia").unwrap();
        assert_eq!(foreign.name, "arbitrum-sepolia");
        assert_eq!(foreign.endpoint_id, 40231);

        let home = registry.resolve_companion("arbitrum-sepolia").unwrap();
        assert_eq!(home.name, "sepolia");
        assert_eq!(home.endpoint_id, 40161);
    }

    #[test]
    fn test_unknown_network() {
        let registry = NetworkRegistry::testnet();
        assert!(matches!(
            registry.resolve_companion("mainnet"),
            Err(NetworkError::UnknownNetwork { name, .. }) if name == "mainnet"
        ));
    }

    #[test]
    fn test_network_without_companion() {
        let registry = NetworkRegistry::testnet();
        assert!(registry.get("hardhat").is_ok());
        assert!(matches!(
            registry.resolve_companion("hardhat"),
            Err(NetworkError::UnknownNetwork { name, .. }) if name == "hardhat"
        ));
    }

    #[test]
    fn test_unregistered_companion_rejected() {
        let mut orphan = NetworkDescriptor::sepolia();
        orphan.companion = Some("polygon".to_string());

        let result = NetworkRegistry::new([orphan]);
        assert!(matches!(result, Err(NetworkError::InvalidRegistry(_))));
    }

    #[test]
    fn test_duplicate_network_rejected() {
        let result = NetworkRegistry::new([NetworkDescriptor::hardhat(), NetworkDescriptor::hardhat()]);
        assert!(matches!(result, Err(NetworkError::InvalidRegistry(_))));
    }

    #[test]
    fn test_self_companion_rejected() {
        let mut network = NetworkDescriptor::hardhat();
        network.companion = Some("hardhat".to_string());
        assert!(matches!(
            NetworkRegistry::new([network]),
            Err(NetworkError::InvalidRegistry(_))
        ));
    }

    #[test]
    fn test_credentials_deserialize() {
        let remote: CredentialSource = serde_json::from_str(
            r#"{"kind":"remote","url":"http://localhost:9060","address":"0x5CFFA347b0aE99cc01E5c01714cA5658e54a23D1"}"#,
        )
        .unwrap();
        assert!(matches!(remote, CredentialSource::Remote { .. }));

        let env: CredentialSource = serde_json::from_str(r#"{"kind":"env"}"#).unwrap();
        assert_eq!(env, CredentialSource::Env);
    }
}
