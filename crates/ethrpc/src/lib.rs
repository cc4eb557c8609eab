pub mod alloy;

pub use self::alloy::{
    provider,
    wallet::{Credentials, wallet},
};

pub type AlloyProvider = ::alloy::providers::DynProvider;
