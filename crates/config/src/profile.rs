//! Deployment profiles.
//!
//! A profile gathers every per-environment parameter of the home/foreign proxy pair in one
//! place, so testnet and mainnet deployments share the same steps.

use crate::network::{NetworkError, NetworkRegistry};
use alloy_primitives::{address, Address};
use serde::{Deserialize, Serialize};
use template::TemplateSettings;

/// Home side parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeProfile {
    /// Network the home proxy is deployed to
    pub network: String,
    /// reality.eth instance the home proxy relays questions from
    pub upstream_oracle: Address,
    /// reality.eth metadata, usually empty
    #[serde(default)]
    pub metadata: String,
}

/// Foreign side parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignProfile {
    /// Network the foreign proxy is deployed to
    pub network: String,
    /// Arbitrator court the disputes are created in
    #[serde(default = "default_court_id")]
    pub court_id: u64,
    /// Jurors drawn for the first round
    #[serde(default = "default_juror_count")]
    pub juror_count: u64,
    #[serde(default)]
    pub template: TemplateSettings,
    /// Pass a data mapping to the proxy; an empty string is passed otherwise
    #[serde(default = "default_supply_mapping")]
    pub supply_mapping: bool,
}

const fn default_court_id() -> u64 {
    1
}

const fn default_juror_count() -> u64 {
    1
}

const fn default_supply_mapping() -> bool {
    true
}

/// Parameters for one deployment of the proxy pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentProfile {
    pub name: String,
    pub home: HomeProfile,
    pub foreign: ForeignProfile,
}

impl DeploymentProfile {
    /// Sepolia home proxy paired with an Arbitrum Sepolia foreign proxy.
    pub fn testnet() -> Self {
        Self {
            name: "testnet".to_string(),
            home: HomeProfile {
                network: "sepolia".to_string(),
                // https://sepolia.etherscan.io/address/0xaf33DcB6E8c5c4D9dDF579f53031b514d19449CA
                upstream_oracle: address!("0xaf33DcB6E8c5c4D9dDF579f53031b514d19449CA"),
                metadata: String::new(),
            },
            foreign: ForeignProfile {
                network: "arbitrum-sepolia".to_string(),
                court_id: default_court_id(),
                juror_count: default_juror_count(),
                template: TemplateSettings::default(),
                supply_mapping: default_supply_mapping(),
            },
        }
    }

    /// Check that the home and foreign networks are registered and each other's companion.
    pub fn validate(&self, registry: &NetworkRegistry) -> Result<(), NetworkError> {
        let foreign = registry.resolve_companion(&self.home.network)?;
        if foreign.name != self.foreign.network {
            return Err(NetworkError::InvalidRegistry(format!(
                "profile `{}`: companion of home network `{}` is `{}`, expected `{}`",
                self.name, self.home.network, foreign.name, self.foreign.network
            )));
        }

        let home = registry.resolve_companion(&self.foreign.network)?;
        if home.name != self.home.network {
            return Err(NetworkError::InvalidRegistry(format!(
                "profile `{}`: companion of foreign network `{}` is `{}`, expected `{}`",
                self.name, self.foreign.network, home.name, self.home.network
            )));
        }

        Ok(())
    }
}
