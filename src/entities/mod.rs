pub mod fees;
pub mod plans;
pub mod subscription_links;

pub use fees::FeeStatus;

pub use fees as fee_entity;
pub use plans as plan_entity;
pub use subscription_links as subscription_link_entity;
