//! Core identities and collaborator seams
//!
//! The simulation engine owns the clock, the links and message storage;
//! the types here are what the forwarding core needs to see of them.

pub mod error;
pub mod link;
pub mod types;

pub use error::{AdmissionDenied, AdmissionResult, StartError, TransferDenied};
pub use link::{Contact, InFlight, Link, PeerView, TransferCode};
pub use types::{ConnectionId, HostId, Message, MessageId, SimTime};
