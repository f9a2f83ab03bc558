//! End-to-end scenarios through `RegistryService`.

pub mod durability;
pub mod registry_flow;
