pub mod job;
pub mod parse;
pub mod release;
pub mod server;
pub mod vnode;
