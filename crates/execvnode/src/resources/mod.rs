pub mod amount;
pub mod vector;

pub use amount::{AmountError, AmountKind, Kb, ResourceAmount, parse_amount, to_kb};
pub use vector::{MEM_RESOURCE_NAME, NCPUS_RESOURCE_NAME, ResourceVector};
