//! HTTP request handlers

pub mod health;
pub mod items;
pub mod kitchen;
pub mod stock;

pub use health::health_check;
pub use items::{get_item, get_item_requirements};
pub use kitchen::{refill_kitchen, validate_refill};
pub use stock::{get_item_movements, get_movements_by_reference, get_stock_level, record_movement};
