pub mod chunk;
pub mod execvnode;
pub(crate) mod parser;
pub mod vnode;

pub use chunk::Chunk;
pub use execvnode::{ExecVnodeAssignment, format_exec_vnode};
pub use parser::parse_exec_vnode;
pub use vnode::{HostMap, VnodeRef, natural_host};
