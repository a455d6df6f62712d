//! Domain models for the Opsline inventory platform

mod item;
mod kitchen;
mod stock;

pub use item::*;
pub use kitchen::*;
pub use stock::*;
