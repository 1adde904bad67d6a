pub mod client;
pub mod common;
pub mod server;

pub type Error = crate::common::error::RampError;
pub type Result<T> = std::result::Result<T, Error>;
