pub(crate) mod data_structures;
pub(crate) mod error;
pub(crate) mod parser;

pub use data_structures::{Map, Set};
