pub mod fixtures;
pub mod test_setup;

pub use fixtures::*;
pub use test_setup::*;
