pub mod calendar;
pub mod notes;

pub use calendar::BillingPeriod;
pub use notes::append_note;
