//! Signing through a signer-proxy service.
//!
//! The proxy answers `eth_signTransaction` over JSON-RPC, so the deployer key never has to
//! be present on the machine running the deployment.

use alloy_primitives::{Address, Bytes};
use alloy_rpc_types::eth::TransactionRequest;
use eyre::{bail, eyre, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Signs deployment transactions through a signer-proxy.
#[derive(Debug, Clone)]
pub struct RemoteSigner {
    client: reqwest::Client,
    proxy_url: String,
    address: Address,
    chain_id: u64,
}

impl RemoteSigner {
    pub fn new(proxy_url: impl Into<String>, address: Address, chain_id: u64) -> Self {
        Self {
            client: reqwest::Client::new(),
            proxy_url: proxy_url.into(),
            address,
            chain_id,
        }
    }

    pub const fn address(&self) -> Address {
        self.address
    }

    pub const fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Sign a filled transaction request and return the raw signed transaction.
    pub async fn sign_transaction(&self, tx: TransactionRequest) -> Result<Bytes> {
        if let Some(from) = tx.from.filter(|from| *from != self.address) {
            bail!("signer-proxy holds {}, refusing to sign for {from}", self.address);
        }

        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method: "eth_signTransaction",
            params: [tx],
            id: 1,
        };

        debug!(proxy = %self.proxy_url, signer = %self.address, "requesting remote signature");
        let response = self
            .client
            .post(&self.proxy_url)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("signer-proxy returned {status}: {body}");
        }

        let body: JsonRpcResponse = response.json().await?;
        body.into_raw()
    }
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest<T> {
    jsonrpc: &'static str,
    method: &'static str,
    params: T,
    id: u32,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    result: Option<SignedTransaction>,
    error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    fn into_raw(self) -> Result<Bytes> {
        match (self.result, self.error) {
            (Some(SignedTransaction::Raw(raw)), _) => Ok(raw),
            (Some(SignedTransaction::Envelope { raw }), _) => Ok(raw),
            (None, Some(error)) => bail!("signer-proxy error {}: {}", error.code, error.message),
            (None, None) => Err(eyre!("signer-proxy returned neither result nor error")),
        }
    }
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// Proxies return either the raw transaction or geth's `{ raw, tx }` object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignedTransaction {
    Raw(Bytes),
    Envelope { raw: Bytes },
}
