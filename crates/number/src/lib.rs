//! Conversions between human readable token amounts and their on-chain
//! integer representation.
pub mod units;

pub use units::{EthUnit, parse_ether, parse_units};
