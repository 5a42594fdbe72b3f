pub mod common;
pub mod fee;
pub mod plan;
pub mod subscription;

pub use common::*;
pub use fee::*;
pub use plan::*;
pub use subscription::*;
