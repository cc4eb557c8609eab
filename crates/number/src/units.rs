use {
    alloy::primitives::{U256, utils::Unit},
    anyhow::{Context, Result, ensure},
};

pub trait EthUnit: std::marker::Sized {
    /// Returns the current wei amount.
    fn wei(self) -> U256;

    /// Returns the current Gwei amount as wei (i.e. 1e9 wei).
    fn gwei(self) -> U256 {
        self.wei() * Unit::GWEI.wei()
    }

    /// Returns the current Eth amount as wei (i.e. 1e18 wei).
    fn eth(self) -> U256 {
        self.wei() * Unit::ETHER.wei()
    }
}

impl EthUnit for u64 {
    fn wei(self) -> U256 {
        U256::from(self)
    }
}

impl EthUnit for u128 {
    fn wei(self) -> U256 {
        U256::from(self)
    }
}

/// Parses a decimal ether amount (e.g. `"0.001"`) into wei.
pub fn parse_ether(amount: &str) -> Result<U256> {
    parse_units(amount, Unit::ETHER)
}

/// Parses a non-negative decimal amount into the integer amount of the
/// smallest unit, where one `unit` equals `10^unit.get()` of them.
///
/// Amounts with more fractional digits than the unit can represent are
/// rejected instead of truncated.
pub fn parse_units(amount: &str, unit: Unit) -> Result<U256> {
    let decimals = usize::from(unit.get());
    ensure!(!amount.is_empty(), "empty amount");
    let (integer, fraction) = amount.split_once('.').unwrap_or((amount, ""));
    ensure!(
        !integer.is_empty() || !fraction.is_empty(),
        "amount {amount:?} has no digits"
    );
    ensure!(
        integer
            .chars()
            .chain(fraction.chars())
            .all(|c| c.is_ascii_digit()),
        "amount {amount:?} is not a non-negative decimal number"
    );
    ensure!(
        fraction.len() <= decimals,
        "amount {amount:?} has more than {decimals} fractional digits"
    );

    let digits = format!("{integer}{fraction:0<decimals$}");
    U256::from_str_radix(&digits, 10)
        .with_context(|| format!("amount {amount:?} does not fit into 256 bits"))
}
