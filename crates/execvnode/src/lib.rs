pub mod accounting;
pub mod assignment;
pub(crate) mod common;
pub mod release;
pub mod resources;
pub mod select;

#[cfg(test)]
mod tests;

pub use crate::accounting::{
    AccountingPhase, AccountingRecord, JobProjection, RecordKind, project_accounting,
};
pub use crate::assignment::{ExecVnodeAssignment, HostMap, format_exec_vnode, parse_exec_vnode};
pub use crate::common::error::VnodeError;
pub use crate::common::{Map, Set};
pub use crate::release::{ReleaseContext, ReleaseRequest, ReleaseResult, release};
pub use crate::select::{SelectSpec, parse_select_spec};

pub type Error = VnodeError;
pub type Result<T> = std::result::Result<T, Error>;
