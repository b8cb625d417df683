//! Shared fixtures for the deployer integration tests.
#![allow(dead_code)] // not every test file uses every fixture

use alloy_primitives::{address, Address, Bytes, TxHash};
use deployer::names;
use deployment::{
    DeployRequest, DeploymentRecord, DeploymentStore, MemoryStore, SubmitError, Submission,
    Submitter,
};
use client::SignerFn;
use std::sync::{Arc, Mutex};

pub const WETH: Address = address!("0x980B62Da83eFf3D4576C647993b0c1D7faf17c73");
pub const KLEROS_CORE: Address = address!("0xe8442307d36e9bf6ab27f1a009f95ce8e11c3479");
pub const TEMPLATE_REGISTRY: Address = address!("0x0b7a1e0bbebb4b6e8b8a9b04c0b3b0ee23e2b0f2");
pub const ENDPOINT_V2: Address = address!("0x6EDCE65403992e310A62460808c4b910D972f10f");

/// Submitter that records every request and hands out sequential addresses.
#[derive(Debug, Default)]
pub struct MockSubmitter {
    requests: Mutex<Vec<DeployRequest>>,
    fail: bool,
}

impl MockSubmitter {
    /// A submitter whose every submission fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<DeployRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn submit_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl Submitter for MockSubmitter {
    async fn submit(&self, request: &DeployRequest) -> Result<Submission, SubmitError> {
        let mut requests = self.requests.lock().unwrap();
        requests.push(request.clone());

        if self.fail {
            return Err(SubmitError::Rpc("connection refused".to_string()));
        }

        let n = requests.len() as u8;
        Ok(Submission {
            address: Address::with_last_byte(0xa0 + n),
            tx_hash: TxHash::with_last_byte(n),
            block_number: Some(100 + u64::from(n)),
            gas_used: 1_000_000,
        })
    }
}

/// Signer for submitters that must never reach the signing stage.
pub fn unused_signer() -> SignerFn {
    Arc::new(|_tx| Box::pin(async { Err::<Bytes, _>(eyre::eyre!("signer should not be called")) }))
}

/// Arbitrum Sepolia store holding every foreign proxy dependency.
pub fn foreign_store() -> MemoryStore {
    let mut store = MemoryStore::new("arbitrum-sepolia");
    for (name, address) in [
        (names::WETH, WETH),
        (names::KLEROS_CORE, KLEROS_CORE),
        (names::DISPUTE_TEMPLATE_REGISTRY, TEMPLATE_REGISTRY),
        (names::ENDPOINT_V2, ENDPOINT_V2),
    ] {
        store
            .insert(DeploymentRecord::imported(name, address))
            .unwrap();
    }
    store
}

/// Sepolia store holding the messaging endpoint.
pub fn home_store() -> MemoryStore {
    let mut store = MemoryStore::new("sepolia");
    store
        .insert(DeploymentRecord::imported(names::ENDPOINT_V2, ENDPOINT_V2))
        .unwrap();
    store
}
