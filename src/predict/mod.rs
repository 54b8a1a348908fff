//! Delivery predictability model used by the prophet router

pub mod table;

pub use table::PredictabilityTable;
