use crate::entities::plan_entity;
use crate::error::{AppError, AppResult};
use crate::models::MAX_AMOUNT;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const DEFAULT_DUE_DAY: i32 = 10;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatePlanRequest {
    #[schema(example = "Monthly")]
    pub name: String,
    /// Price in cents
    #[schema(example = 10000)]
    pub price: i64,
    /// Day of month fees fall due (1-31), defaults to 10
    #[schema(example = 10)]
    pub due_day: Option<i32>,
}

impl CreatePlanRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::ValidationError("Plan name is required".into()));
        }
        if self.price <= 0 {
            return Err(AppError::ValidationError(
                "Plan price must be greater than zero".into(),
            ));
        }
        if self.price > MAX_AMOUNT {
            return Err(AppError::ValidationError(format!(
                "Plan price must not exceed {MAX_AMOUNT}"
            )));
        }
        if let Some(day) = self.due_day
            && !(1..=31).contains(&day)
        {
            return Err(AppError::ValidationError(
                "Due day must be between 1 and 31".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SetPlanActiveRequest {
    pub active: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PlanResponse {
    pub id: i32,
    pub name: String,
    pub price: i64,
    pub due_day: i32,
    pub active: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<plan_entity::Model> for PlanResponse {
    fn from(m: plan_entity::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            price: m.price,
            due_day: m.due_day,
            active: m.active,
            created_at: m.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(price: i64, due_day: Option<i32>) -> CreatePlanRequest {
        CreatePlanRequest {
            name: "Monthly".into(),
            price,
            due_day,
        }
    }

    #[test]
    fn test_validate_plan_request() {
        assert!(request(10_000, None).validate().is_ok());
        assert!(request(10_000, Some(31)).validate().is_ok());
        assert!(request(0, None).validate().is_err());
        assert!(request(-5, None).validate().is_err());
        assert!(request(MAX_AMOUNT, None).validate().is_ok());
        assert!(request(i64::MAX, None).validate().is_err());
        assert!(request(10_000, Some(0)).validate().is_err());
        assert!(request(10_000, Some(32)).validate().is_err());
    }

    #[test]
    fn test_blank_name_rejected() {
        let req = CreatePlanRequest {
            name: "  ".into(),
            price: 100,
            due_day: None,
        };
        assert!(req.validate().is_err());
    }
}
