pub mod connection;
pub mod resilient;

pub use connection::*;
pub use resilient::{RetryPolicy, Storage, StorageFault, with_retry};
