//! # Ports Layer (Middle Hexagon)
//!
//! - **Driving Port (Inbound)**: `BadgeRegistryApi`
//! - **Driven Ports (Outbound)**: `FundsTransfer`, `CommandJournal`

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
