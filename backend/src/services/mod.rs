//! Business logic services for the Opsline inventory backend

pub mod item;
pub mod refill;
pub mod stock;

#[cfg(test)]
mod test_support;

pub use item::ItemService;
pub use refill::RefillKitchenService;
pub use stock::StockService;
