//! Forwarding routers
//!
//! Two variants share one core: [`EpidemicRouter`] floods, [`ProphetRouter`]
//! forwards by delivery predictability. Both retire replicas through the
//! receipt ledger and pace transfers with the AIMD quota.

pub mod epidemic;
pub mod policy;
pub mod prophet;
pub mod router;
pub mod types;

pub use epidemic::{EpidemicPolicy, EpidemicRouter};
pub use policy::ForwardingPolicy;
pub use prophet::{ProphetPolicy, ProphetRouter};
pub use router::{PeerHandle, Router};
pub use types::{ContactUp, Reception, RouterStats};
