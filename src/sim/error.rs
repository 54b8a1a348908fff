use crate::core::{HostId, SimTime};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Unknown host: {0}")]
    UnknownHost(HostId),

    #[error("{0} and {1} are already connected")]
    AlreadyConnected(HostId, HostId),

    #[error("{0} and {1} are not connected")]
    NotConnected(HostId, HostId),

    #[error("A host cannot connect to itself: {0}")]
    SelfContact(HostId),

    #[error("Event at {event} is earlier than current time {now}")]
    TimeReversed { event: SimTime, now: SimTime },
}

pub type SimResult<T> = Result<T, SimError>;
