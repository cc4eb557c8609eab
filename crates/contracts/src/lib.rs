//! Access to compiled contract build artifacts.
//!
//! The [`Artifacts`] registry looks up the artifact of a contract by name in a
//! Hardhat or Foundry output directory and turns it into a
//! [`ContractFactory`], which knows how to assemble the init code of a
//! deployment transaction for given constructor arguments.
pub mod artifact;
pub mod factory;
pub mod networks;

pub use {
    artifact::{ArtifactError, ArtifactSource, Artifacts},
    factory::{ContractFactory, EncodeError},
};

#[cfg(any(test, feature = "test-util"))]
pub use artifact::MockArtifactSource;
