//! Contract bindings for all deployed contracts.
//!
//! This crate consolidates the Solidity constructor interfaces used by the deployer:
//! - reality.eth ↔ arbitrator proxies bridged over LayerZero
//!
//! All bindings are generated using alloy's `sol!` macro.

pub mod proxy;
