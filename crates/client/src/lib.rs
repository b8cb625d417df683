mod identity;
mod remote_signer;

use alloy_consensus::TxEnvelope;
use alloy_network::{eip2718::Encodable2718, EthereumWallet, TransactionBuilder};
use alloy_primitives::{Address, Bytes};
use alloy_provider::{Provider, ProviderBuilder};
use alloy_rpc_types::TransactionRequest;
use alloy_signer_local::PrivateKeySigner;
pub use identity::{local_signer, resolve_deployer};
pub use remote_signer::RemoteSigner;
use std::{future::Future, pin::Pin, sync::Arc};
use thiserror::Error;

/// A function that signs a transaction request and returns the raw signed bytes.
///
/// Local keys and the remote signer-proxy both produce one of these, so deployment
/// submission does not care where the key lives.
pub type SignerFn = Arc<
    dyn Fn(TransactionRequest) -> Pin<Box<dyn Future<Output = eyre::Result<Bytes>> + Send>>
        + Send
        + Sync,
>;

#[derive(Error, Debug)]
pub enum ClientError {
    /// Error parsing or validating URLs
    #[error("Invalid RPC URL: {0}")]
    InvalidUrl(String),

    /// Error with private key
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// Error deriving a key from a mnemonic
    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    /// Neither a named deployer account nor any signer is configured
    #[error("No deployer account: configure a named deployer or provide MNEMONIC / PRIVATE_KEY")]
    NoDeployer,
}

/// The key the deployer signs with.
#[derive(Debug, Clone)]
pub enum DeployerSigner {
    Local(PrivateKeySigner),
    Remote(RemoteSigner),
}

impl DeployerSigner {
    pub fn address(&self) -> Address {
        match self {
            Self::Local(signer) => signer.address(),
            Self::Remote(remote) => remote.address(),
        }
    }
}

/// Convenience function to create an ethereum rpc provider from url.
pub fn create_provider(rpc_url: &str) -> Result<impl Provider + Clone, ClientError> {
    let url = rpc_url
        .parse()
        .map_err(|e| ClientError::InvalidUrl(format!("{}", e)))?;
    let provider = ProviderBuilder::new().connect_http(url);

    Ok(provider)
}

/// Create a SignerFn for `signer`.
///
/// The provider fills nonce, fees and gas before the request is signed.
pub fn signer_fn<P>(signer: DeployerSigner, chain_id: u64, provider: P) -> SignerFn
where
    P: Provider + Clone + 'static,
{
    match signer {
        DeployerSigner::Local(key) => local_signer_fn(key, chain_id, provider),
        DeployerSigner::Remote(remote) => remote_signer_fn(remote, provider),
    }
}

fn remote_signer_fn<P>(remote: RemoteSigner, provider: P) -> SignerFn
where
    P: Provider + Clone + 'static,
{
    let from_address = remote.address();
    let chain_id = remote.chain_id();

    Arc::new(move |tx| {
        let remote = remote.clone();
        let provider = provider.clone();
        Box::pin(async move {
            let filled_tx = fill_transaction(tx, &provider, from_address, chain_id).await?;
            remote.sign_transaction(filled_tx).await
        })
    })
}

fn local_signer_fn<P>(key: PrivateKeySigner, chain_id: u64, provider: P) -> SignerFn
where
    P: Provider + Clone + 'static,
{
    let from_address = key.address();
    let wallet = EthereumWallet::from(key);

    Arc::new(move |tx: TransactionRequest| {
        let wallet = wallet.clone();
        let provider = provider.clone();
        Box::pin(async move {
            let filled_tx = fill_transaction(tx, &provider, from_address, chain_id).await?;

            let tx_envelope: TxEnvelope = filled_tx
                .build(&wallet)
                .await
                .map_err(|e| eyre::eyre!("{}", e))?;

            let mut encoded = Vec::new();
            tx_envelope.encode_2718(&mut encoded);
            Ok(Bytes::from(encoded))
        })
    })
}

/// Fill missing transaction fields using the provider.
pub async fn fill_transaction<P>(
    mut tx: TransactionRequest,
    provider: &P,
    from: Address,
    chain_id: u64,
) -> eyre::Result<TransactionRequest>
where
    P: Provider,
{
    if tx.from.is_none() {
        tx.from = Some(from);
    }

    if tx.chain_id.is_none() {
        tx.chain_id = Some(chain_id);
    }

    if tx.nonce.is_none() {
        let nonce = provider.get_transaction_count(from).await?;
        tx.nonce = Some(nonce);
    }

    // Fees first: gas estimation on some chains needs them
    if tx.max_fee_per_gas.is_none() || tx.max_priority_fee_per_gas.is_none() {
        let fee_estimate = provider.estimate_eip1559_fees().await?;
        if tx.max_fee_per_gas.is_none() {
            tx.max_fee_per_gas = Some(fee_estimate.max_fee_per_gas);
        }
        if tx.max_priority_fee_per_gas.is_none() {
            tx.max_priority_fee_per_gas = Some(fee_estimate.max_priority_fee_per_gas);
        }
    }

    if tx.gas.is_none() {
        let gas_estimate = provider.estimate_gas(tx.clone()).await?;
        // 20% headroom, creation estimates are tight
        tx.gas = Some(gas_estimate + gas_estimate / 5);
    }

    Ok(tx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    const HARDHAT_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_invalid_url() {
        let result = create_provider("not a url");
        assert!(matches!(result, Err(ClientError::InvalidUrl(_))));
    }

    #[test]
    fn test_deployer_signer_address() {
        let key: PrivateKeySigner = HARDHAT_KEY.parse().unwrap();
        let local = DeployerSigner::Local(key);
        assert_eq!(
            local.address(),
            address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
        );

        let remote_address = address!("5CFFA347b0aE99cc01E5c01714cA5658e54a23D1");
        let remote = DeployerSigner::Remote(RemoteSigner::new(
            "http://localhost:9060",
            remote_address,
            11155111,
        ));
        assert_eq!(remote.address(), remote_address);
    }
}
