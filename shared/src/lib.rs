//! Shared types and logic for the Opsline inventory platform
//!
//! This crate contains the models and the pure production logic (recipe
//! decomposition, refill planning, stock arithmetic) shared between the
//! backend and the WASM client.

pub mod bom;
pub mod error;
pub mod models;
pub mod refill;
pub mod types;
pub mod validation;

pub use bom::*;
pub use error::*;
pub use models::*;
pub use refill::*;
pub use types::*;
pub use validation::*;
