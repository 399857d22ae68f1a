pub mod mock_identity;
pub mod mock_remote;
pub mod slow_writer;

pub use mock_identity::*;
pub use mock_remote::*;
pub use slow_writer::*;
