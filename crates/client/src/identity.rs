//! Deployer account selection.

use crate::ClientError;
use alloy_primitives::Address;
use alloy_signer_local::{coins_bip39::English, MnemonicBuilder, PrivateKeySigner};
use tracing::warn;

/// Build the local signer from a mnemonic (account index 0) or a raw private key.
///
/// The mnemonic wins when both are set. Returns `None` when neither is.
pub fn local_signer(
    mnemonic: Option<&str>,
    private_key: Option<&str>,
) -> Result<Option<PrivateKeySigner>, ClientError> {
    if let Some(phrase) = mnemonic.map(str::trim).filter(|p| !p.is_empty()) {
        let signer = MnemonicBuilder::<English>::default()
            .phrase(phrase)
            .index(0)
            .and_then(|builder| builder.build())
            .map_err(|e| ClientError::InvalidMnemonic(e.to_string()))?;
        return Ok(Some(signer));
    }

    match private_key.map(str::trim).filter(|k| !k.is_empty()) {
        Some(key) => key
            .parse::<PrivateKeySigner>()
            .map(Some)
            .map_err(|e| ClientError::InvalidPrivateKey(e.to_string())),
        None => Ok(None),
    }
}

/// Pick the deployer account: the named account if configured, else the first signer.
pub fn resolve_deployer(named: Option<Address>, signers: &[Address]) -> Result<Address, ClientError> {
    match named {
        Some(account) => {
            if !signers.contains(&account) {
                warn!(%account, "named deployer has no local signer, signing must happen remotely");
            }
            Ok(account)
        }
        None => signers.first().copied().ok_or(ClientError::NoDeployer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    const TEST_MNEMONIC: &str = "test test test test test test test test test test test junk";
    const HARDHAT_ACCOUNT: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

    #[test]
    fn test_signer_from_mnemonic() {
        let signer = local_signer(Some(TEST_MNEMONIC), None).unwrap().unwrap();
        assert_eq!(signer.address(), HARDHAT_ACCOUNT);
    }

    #[test]
    fn test_mnemonic_takes_precedence() {
        let other_key = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";
        let signer = local_signer(Some(TEST_MNEMONIC), Some(other_key))
            .unwrap()
            .unwrap();
        assert_eq!(signer.address(), HARDHAT_ACCOUNT);

        let signer = local_signer(None, Some(other_key)).unwrap().unwrap();
        assert_eq!(
            signer.address(),
            address!("70997970C51812dc3A010C7d01b50e0d17dc79C8")
        );
    }

    #[test]
    fn test_no_credentials() {
        assert!(local_signer(None, None).unwrap().is_none());
        assert!(local_signer(Some("  "), Some("")).unwrap().is_none());
    }

    #[test]
    fn test_invalid_credentials() {
        assert!(matches!(
            local_signer(Some("not a real phrase"), None),
            Err(ClientError::InvalidMnemonic(_))
        ));
        assert!(matches!(
            local_signer(None, Some("0x1234")),
            Err(ClientError::InvalidPrivateKey(_))
        ));
    }

    #[test]
    fn test_resolve_deployer() {
        let named = address!("5CFFA347b0aE99cc01E5c01714cA5658e54a23D1");

        assert_eq!(resolve_deployer(Some(named), &[HARDHAT_ACCOUNT]).unwrap(), named);
        assert_eq!(resolve_deployer(None, &[HARDHAT_ACCOUNT]).unwrap(), HARDHAT_ACCOUNT);
        assert!(matches!(resolve_deployer(None, &[]), Err(ClientError::NoDeployer)));
    }
}
