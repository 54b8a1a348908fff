//! Receipt ledger for replica retirement

pub mod ledger;

pub use ledger::{ReceiptLedger, ReceiptRecord};
