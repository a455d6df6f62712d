//! Request extractors shared by handlers

pub mod operator;

pub use operator::Operator;
