use crate::entities::{FeeStatus, fee_entity};
use crate::error::{AppError, AppResult};
use crate::utils::BillingPeriod;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Upper bound for a single fee or plan price, in cents.
pub const MAX_AMOUNT: i64 = 10_000_000_000;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GenerateFeesRequest {
    #[schema(example = 11)]
    pub month: u32,
    #[schema(example = 2025)]
    pub year: i32,
    /// Restrict the sweep to one account
    #[serde(default, alias = "member_id")]
    pub account_id: Option<i32>,
}

impl GenerateFeesRequest {
    pub fn period(&self) -> AppResult<BillingPeriod> {
        BillingPeriod::new(self.month, self.year)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GenerateFeesResponse {
    pub created: u64,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, ToSchema)]
pub struct FeeQuery {
    pub status: Option<FeeStatus>,
    pub month: Option<u32>,
    pub year: Option<i32>,
    #[serde(default, alias = "member_id")]
    pub account_id: Option<i32>,
}

impl FeeQuery {
    /// The month window only applies when both month and year are present.
    pub fn period(&self) -> AppResult<Option<BillingPeriod>> {
        match (self.month, self.year) {
            (Some(month), Some(year)) => BillingPeriod::new(month, year).map(Some),
            _ => Ok(None),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateFeeRequest {
    #[serde(default, alias = "member_id")]
    pub account_id: Option<i32>,
    /// Amount in cents
    pub amount: i64,
    pub due_date: NaiveDate,
    pub status: Option<FeeStatus>,
    pub note: Option<String>,
}

impl CreateFeeRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.amount <= 0 {
            return Err(AppError::ValidationError(
                "Fee amount must be greater than zero".into(),
            ));
        }
        if self.amount > MAX_AMOUNT {
            return Err(AppError::ValidationError(format!(
                "Fee amount must not exceed {MAX_AMOUNT}"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateFeeStatusRequest {
    pub status: FeeStatus,
    pub note: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct MarkPaidRequest {
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct CancelFeeRequest {
    pub note: Option<String>,
}

/// `null` or a missing field clears the owning account.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ReassignAccountRequest {
    #[serde(default, alias = "member_id")]
    pub account_id: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TotalsQuery {
    pub month: u32,
    pub year: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FeeTotalsResponse {
    /// Sum of paid fees, in cents
    pub received: i64,
    /// Sum of pending and overdue fees, in cents
    pub pending_total: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OverdueSweepResponse {
    pub updated: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FeeResponse {
    pub id: i32,
    pub account_id: Option<i32>,
    pub amount: i64,
    pub due_date: NaiveDate,
    pub status: FeeStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub note: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<fee_entity::Model> for FeeResponse {
    fn from(m: fee_entity::Model) -> Self {
        Self {
            id: m.id,
            account_id: m.account_id,
            amount: m.amount,
            due_date: m.due_date,
            status: m.status,
            paid_at: m.paid_at,
            note: m.note,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}
