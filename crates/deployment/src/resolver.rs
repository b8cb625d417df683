use crate::DeploymentStore;
use alloy_primitives::Address;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("dependency `{name}` is not deployed on {network}")]
    DependencyNotDeployed { name: String, network: String },
}

/// Looks up dependency addresses in the current network's store.
#[derive(Debug)]
pub struct Resolver<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S> Resolver<'a, S>
where
    S: DeploymentStore + ?Sized,
{
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn resolve(&self, logical_name: &str) -> Result<Address, ResolveError> {
        self.store
            .get(logical_name)
            .map(|record| record.address)
            .ok_or_else(|| ResolveError::DependencyNotDeployed {
                name: logical_name.to_string(),
                network: self.store.network().to_string(),
            })
    }

    /// Resolve every name, in order. Fails on the first missing dependency.
    pub fn resolve_all<const N: usize>(
        &self,
        logical_names: [&str; N],
    ) -> Result<[Address; N], ResolveError> {
        let mut addresses = [Address::ZERO; N];
        for (slot, name) in addresses.iter_mut().zip(logical_names) {
            *slot = self.resolve(name)?;
        }
        Ok(addresses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DeploymentRecord, MemoryStore};
    use alloy_primitives::address;

    fn store() -> MemoryStore {
        let mut store = MemoryStore::new("arbitrum-sepolia");
        for (name, address) in [
            ("WETH", address!("0x980B62Da83eFf3D4576C647993b0c1D7faf17c73")),
            ("EndpointV2", address!("0x6EDCE65403992e310A62460808c4b910D972f10f")),
        ] {
            store.insert(DeploymentRecord::imported(name, address)).unwrap();
        }
        store
    }

    #[test]
    fn test_resolve_recorded() {
        let store = store();
        let resolver = Resolver::new(&store);
        assert_eq!(
            resolver.resolve("EndpointV2").unwrap(),
            address!("0x6EDCE65403992e310A62460808c4b910D972f10f")
        );
    }

    #[test]
    fn test_resolve_all_keeps_order() {
        let store = store();
        let addresses = Resolver::new(&store).resolve_all(["EndpointV2", "WETH"]).unwrap();
        assert_eq!(addresses[0], store.get("EndpointV2").unwrap().address);
        assert_eq!(addresses[1], store.get("WETH").unwrap().address);
    }

    #[test]
    fn test_missing_dependency() {
        let store = store();
        let err = Resolver::new(&store)
            .resolve_all(["WETH", "klerosCore", "EndpointV2"])
            .unwrap_err();

        assert_eq!(
            err,
            ResolveError::DependencyNotDeployed {
                name: "klerosCore".to_string(),
                network: "arbitrum-sepolia".to_string(),
            }
        );
    }
}
