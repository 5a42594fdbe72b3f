pub mod billing_service;
pub mod plan_service;
pub mod subscription_service;

pub use billing_service::*;
pub use plan_service::*;
pub use subscription_service::*;
