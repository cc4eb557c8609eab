pub const MAINNET: u64 = 1;
pub const OPTIMISM: u64 = 10;
pub const BNB: u64 = 56;
pub const GNOSIS: u64 = 100;
pub const POLYGON: u64 = 137;
pub const BASE: u64 = 8453;
pub const DEVNET: u64 = 31337;
pub const ARBITRUM_ONE: u64 = 42161;
pub const AVALANCHE: u64 = 43114;
pub const SEPOLIA: u64 = 11155111;

/// Human readable name of a well known chain, used for logging.
pub fn name(chain_id: u64) -> Option<&'static str> {
    Some(match chain_id {
        MAINNET => "mainnet",
        OPTIMISM => "optimism",
        BNB => "bnb",
        GNOSIS => "gnosis",
        POLYGON => "polygon",
        BASE => "base",
        DEVNET => "devnet",
        ARBITRUM_ONE => "arbitrum-one",
        AVALANCHE => "avalanche",
        SEPOLIA => "sepolia",
        _ => return None,
    })
}
