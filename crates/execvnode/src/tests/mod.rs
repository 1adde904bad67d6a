mod test_keep_select;
mod test_release;
pub mod utils;
