//! # Domain Layer (Inner Hexagon)
//!
//! Badge records, their indexes, attached metadata and the admin treasury,
//! plus the synchronous engine that mutates them.
//! NO I/O, NO async.

pub mod engine;
pub mod entities;
pub mod errors;
pub mod invariants;
pub mod store;
pub mod value_objects;

pub use engine::*;
pub use entities::*;
pub use errors::*;
pub use invariants::*;
pub use store::*;
pub use value_objects::*;
