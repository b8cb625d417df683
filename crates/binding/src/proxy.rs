//! reality.eth cross-chain proxy bindings.
//!
//! Only constructors are bound; the deployer never calls into the proxies.
//! Constructor parameters are positional and must match the compiled artifacts.

use alloy_primitives::{Bytes, U256};
use alloy_sol_types::{sol, SolValue};

sol! {
    /// Home proxy, deployed next to reality.eth.
    contract RealitioHomeProxyLZ {
        constructor(
            address realitio,
            string metadata,
            uint32 foreignEid,
            address endpoint
        );
    }

    /// Foreign proxy, deployed next to the arbitrator.
    #[allow(clippy::too_many_arguments)]
    contract RealitioForeignProxyLZ {
        constructor(
            address wNative,
            address arbitrator,
            bytes arbitratorExtraData,
            address templateRegistry,
            string templateData,
            string templateDataMappings,
            uint32 homeEid,
            address endpoint
        );
    }
}

/// Arbitrator extra data selecting the court and the number of jurors.
///
/// Encoded as `abi.encode(uint256 courtId, uint256 jurors)`.
pub fn arbitrator_extra_data(court_id: u64, jurors: u64) -> Bytes {
    (U256::from(court_id), U256::from(jurors)).abi_encode().into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{hex, Address};
    use alloy_sol_types::SolConstructor;

    #[test]
    fn test_general_court_single_juror_extra_data() {
        let expected = hex!(
            "0000000000000000000000000000000000000000000000000000000000000001"
            "0000000000000000000000000000000000000000000000000000000000000001"
        );
        assert_eq!(arbitrator_extra_data(1, 1).as_ref(), expected.as_slice());
    }

    #[test]
    fn test_home_constructor_encoding() {
        let call = RealitioHomeProxyLZ::constructorCall {
            realitio: Address::from([1u8; 20]),
            metadata: String::new(),
            foreignEid: 40231,
            endpoint: Address::from([2u8; 20]),
        };
        let encoded = call.abi_encode();

        // 4 head words + 1 word for the empty string length
        assert_eq!(encoded.len(), 5 * 32);
        assert_eq!(&encoded[12..32], &[1u8; 20]);
        assert_eq!(U256::from_be_slice(&encoded[64..96]), U256::from(40231));
        assert_eq!(&encoded[108..128], &[2u8; 20]);
    }
}
