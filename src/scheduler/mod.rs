//! Transfer scheduling
//!
//! Per-contact quotas, queue-mode tie-breaking and admission of forwarding
//! candidates onto live contacts.

pub mod queue;
pub mod quota;
pub mod transfer;

pub use queue::arrange;
pub use quota::QuotaTable;
pub use transfer::{deliverable_candidates, Candidate, TransferScheduler, TransferStarted};
