mod engine;
pub mod outcome;
mod prune;
pub mod request;
mod validate;

pub use engine::{release, remove_vnodes};
pub use outcome::{HostReleaseStatus, HostStatus, ReleaseResult};
pub use request::{
    JobState, JobSubstate, ReleaseContext, ReleaseOrigin, ReleaseRequest, VnodeOrder,
};
