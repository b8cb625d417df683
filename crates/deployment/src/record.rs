use alloy_primitives::{Address, Bytes, TxHash, U256};
use serde::{Deserialize, Serialize};

/// A single positional constructor argument, kept for the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ConstructorArg {
    Address(Address),
    String(String),
    Bytes(Bytes),
    Uint(U256),
}

impl From<Address> for ConstructorArg {
    fn from(value: Address) -> Self {
        Self::Address(value)
    }
}

impl From<String> for ConstructorArg {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Bytes> for ConstructorArg {
    fn from(value: Bytes) -> Self {
        Self::Bytes(value)
    }
}

impl From<u32> for ConstructorArg {
    fn from(value: u32) -> Self {
        Self::Uint(U256::from(value))
    }
}

/// A contract deployed (or imported) under a logical name on one network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    pub logical_name: String,
    pub address: Address,
    #[serde(default)]
    pub constructor_args: Vec<ConstructorArg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<TxHash>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
}

impl DeploymentRecord {
    /// Record for a contract deployed outside this tool.
    pub fn imported(logical_name: impl Into<String>, address: Address) -> Self {
        Self {
            logical_name: logical_name.into(),
            address,
            constructor_args: Vec::new(),
            tx_hash: None,
            block_number: None,
        }
    }
}
