//! Administrative registry
//!
//! Holds the minter and platform address lists that administrative
//! multisig transactions modify.

pub mod management;

pub use management::{
    ManagementRegistry, RegistryCall, ADD_MINTER, ADD_PLATFORM, REMOVE_MINTER, REMOVE_PLATFORM,
};
