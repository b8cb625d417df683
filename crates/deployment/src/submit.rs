//! Contract creation transactions.

use crate::{ArtifactError, Artifacts, ConstructorArg};
use alloy_network::TransactionBuilder;
use alloy_primitives::{Address, Bytes, TxHash};
use alloy_provider::Provider;
use alloy_rpc_types::TransactionRequest;
use client::SignerFn;
use std::future::Future;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum SubmitError {
    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    /// No account to send creation transactions from
    #[error("no deployer account: configure a named deployer or provide MNEMONIC / PRIVATE_KEY")]
    NoDeployer,

    #[error("failed to sign deployment: {0}")]
    Signing(String),

    #[error("rpc error: {0}")]
    Rpc(String),

    #[error("deployment transaction {0} reverted")]
    Reverted(TxHash),

    #[error("receipt of {0} carries no contract address")]
    NoContractAddress(TxHash),
}

/// Everything needed to create one contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployRequest {
    /// Name the resulting record is stored under
    pub logical_name: String,
    /// Artifact to take the creation bytecode from
    pub contract: String,
    pub constructor_args: Vec<ConstructorArg>,
    /// ABI encoding of `constructor_args`
    pub encoded_args: Bytes,
}

/// Outcome of a confirmed contract creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub address: Address,
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: u64,
}

/// Performs the contract creation. The only side-effecting part of a deployment.
pub trait Submitter: Send + Sync {
    /// Submit the creation transaction and wait for its receipt.
    fn submit(
        &self,
        request: &DeployRequest,
    ) -> impl Future<Output = Result<Submission, SubmitError>> + Send;
}

/// Submits creation transactions to a live network.
///
/// The deployer account is only needed once a transaction is built, so a submitter without one
/// still serves runs whose steps are all skipped or already deployed.
pub struct ChainSubmitter<P> {
    provider: P,
    signer: SignerFn,
    deployer: Option<Address>,
    artifacts: Artifacts,
}

impl<P> ChainSubmitter<P>
where
    P: Provider + Clone,
{
    pub fn new(
        provider: P,
        signer: SignerFn,
        deployer: Option<Address>,
        artifacts: Artifacts,
    ) -> Self {
        Self {
            provider,
            signer,
            deployer,
            artifacts,
        }
    }

    /// Build the unsigned creation transaction for `request`.
    pub fn creation_transaction(
        &self,
        request: &DeployRequest,
    ) -> Result<TransactionRequest, SubmitError> {
        let deployer = self.deployer.ok_or(SubmitError::NoDeployer)?;
        let bytecode = self.artifacts.bytecode(&request.contract)?;
        let mut code = bytecode.to_vec();
        code.extend_from_slice(&request.encoded_args);

        Ok(TransactionRequest::default()
            .with_from(deployer)
            .with_deploy_code(code))
    }
}

impl<P> Submitter for ChainSubmitter<P>
where
    P: Provider + Clone + Send + Sync,
{
    async fn submit(&self, request: &DeployRequest) -> Result<Submission, SubmitError> {
        let tx = self.creation_transaction(request)?;

        debug!(contract = %request.contract, deployer = ?tx.from, "signing creation transaction");
        let raw = (self.signer)(tx)
            .await
            .map_err(|e| SubmitError::Signing(e.to_string()))?;

        let pending = self
            .provider
            .send_raw_transaction(&raw)
            .await
            .map_err(|e| SubmitError::Rpc(e.to_string()))?;
        let tx_hash = *pending.tx_hash();
        info!(contract = %request.contract, %tx_hash, "creation transaction sent");

        let receipt = pending
            .get_receipt()
            .await
            .map_err(|e| SubmitError::Rpc(e.to_string()))?;

        if !receipt.status() {
            return Err(SubmitError::Reverted(tx_hash));
        }
        let address = receipt
            .contract_address
            .ok_or(SubmitError::NoContractAddress(tx_hash))?;

        Ok(Submission {
            address,
            tx_hash,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, TxKind};
    use alloy_provider::{network::Ethereum, RootProvider};
    use std::{fs, sync::Arc};

    #[derive(Clone)]
    struct MockProvider;

    impl Provider for MockProvider {
        fn root(&self) -> &RootProvider<Ethereum> {
            unimplemented!("no rpc in unit tests")
        }
    }

    fn unused_signer() -> SignerFn {
        Arc::new(|_tx| Box::pin(async { Err::<Bytes, _>(eyre::eyre!("signer should not be called")) }))
    }

    #[test]
    fn test_creation_transaction_appends_args() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join("Proxy.json"), r#"{"bytecode":"0x6080"}"#).unwrap();

        let deployer = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
        let submitter = ChainSubmitter::new(
            MockProvider,
            unused_signer(),
            Some(deployer),
            Artifacts::new(root.path()),
        );
        let request = DeployRequest {
            logical_name: "Proxy".to_string(),
            contract: "Proxy".to_string(),
            constructor_args: vec![],
            encoded_args: Bytes::from(vec![0xaa, 0xbb]),
        };

        let tx = submitter.creation_transaction(&request).unwrap();
        assert_eq!(tx.from, Some(deployer));
        assert_eq!(tx.to, Some(TxKind::Create));
        assert_eq!(
            tx.input.input().unwrap(),
            &Bytes::from(vec![0x60, 0x80, 0xaa, 0xbb])
        );
    }

    #[test]
    fn test_missing_artifact() {
        let root = tempfile::tempdir().unwrap();
        let submitter = ChainSubmitter::new(
            MockProvider,
            unused_signer(),
            Some(Address::ZERO),
            Artifacts::new(root.path()),
        );
        let request = DeployRequest {
            logical_name: "Proxy".to_string(),
            contract: "Proxy".to_string(),
            constructor_args: vec![],
            encoded_args: Bytes::new(),
        };

        assert!(matches!(
            submitter.creation_transaction(&request),
            Err(SubmitError::Artifact(ArtifactError::NotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn test_submit_without_deployer() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join("Proxy.json"), r#"{"bytecode":"0x6080"}"#).unwrap();

        let submitter = ChainSubmitter::new(
            MockProvider,
            unused_signer(),
            None,
            Artifacts::new(root.path()),
        );
        let request = DeployRequest {
            logical_name: "Proxy".to_string(),
            contract: "Proxy".to_string(),
            constructor_args: vec![],
            encoded_args: Bytes::new(),
        };

        assert!(matches!(
            submitter.submit(&request).await,
            Err(SubmitError::NoDeployer)
        ));
    }
}
