use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    ToSchema,
    DeriveActiveEnum,
    EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "snake_case")]
pub enum FeeStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "overdue")]
    Overdue,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl FeeStatus {
    /// `pending -> {paid, overdue, cancelled}`, `overdue -> {paid, cancelled}`,
    /// `paid -> {cancelled}`; `cancelled` is terminal. Re-applying the current
    /// status is accepted.
    pub fn can_transition_to(self, next: FeeStatus) -> bool {
        use FeeStatus::*;
        match (self, next) {
            (current, next) if current == next => true,
            (Pending, Paid | Overdue | Cancelled) => true,
            (Overdue, Paid | Cancelled) => true,
            (Paid, Cancelled) => true,
            _ => false,
        }
    }

    /// Counted as outstanding in monthly totals.
    pub fn is_outstanding(self) -> bool {
        matches!(self, FeeStatus::Pending | FeeStatus::Overdue)
    }
}

impl std::fmt::Display for FeeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeeStatus::Pending => write!(f, "pending"),
            FeeStatus::Paid => write!(f, "paid"),
            FeeStatus::Overdue => write!(f, "overdue"),
            FeeStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "fees")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub account_id: Option<i32>,
    /// Snapshot of the plan price at generation time, in cents.
    pub amount: i64,
    pub due_date: NaiveDate,
    pub status: FeeStatus,
    pub paid_at: Option<DateTime<Utc>>,
    #[sea_orm(column_type = "Text", nullable)]
    pub note: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::FeeStatus::*;

    #[test]
    fn test_forward_transitions() {
        assert!(Pending.can_transition_to(Paid));
        assert!(Pending.can_transition_to(Overdue));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Overdue.can_transition_to(Paid));
        assert!(Overdue.can_transition_to(Cancelled));
        assert!(Paid.can_transition_to(Cancelled));
    }

    #[test]
    fn test_backward_transitions_rejected() {
        assert!(!Overdue.can_transition_to(Pending));
        assert!(!Paid.can_transition_to(Pending));
        assert!(!Paid.can_transition_to(Overdue));
    }

    #[test]
    fn test_cancelled_is_terminal() {
        for next in [Pending, Paid, Overdue] {
            assert!(!Cancelled.can_transition_to(next));
        }
        assert!(Cancelled.can_transition_to(Cancelled));
    }

    #[test]
    fn test_outstanding() {
        assert!(Pending.is_outstanding());
        assert!(Overdue.is_outstanding());
        assert!(!Paid.is_outstanding());
        assert!(!Cancelled.is_outstanding());
    }
}
