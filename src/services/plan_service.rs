use crate::database::Storage;
use crate::entities::plan_entity as plan;
use crate::error::{AppError, AppResult};
use crate::models::{CreatePlanRequest, DEFAULT_DUE_DAY, PlanResponse};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, IntoActiveModel, QueryOrder, Set};

/// Billing plan catalog. Plans are never deleted, only deactivated.
#[derive(Clone)]
pub struct PlanService {
    storage: Storage,
}

impl PlanService {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    pub async fn create_plan(&self, req: CreatePlanRequest) -> AppResult<PlanResponse> {
        let am = plan::ActiveModel {
            name: Set(req.name),
            price: Set(req.price),
            due_day: Set(req.due_day.unwrap_or(DEFAULT_DUE_DAY)),
            active: Set(true),
            created_at: Set(Some(Utc::now())),
            ..Default::default()
        };
        let created = self
            .storage
            .run("plans.insert", |db| am.clone().insert(db))
            .await?;

        log::info!(
            "Plan created: id={}, name={}, price={}, due_day={}",
            created.id,
            created.name,
            created.price,
            created.due_day
        );
        Ok(PlanResponse::from(created))
    }

    /// All plans, inactive ones included.
    pub async fn list_plans(&self) -> AppResult<Vec<PlanResponse>> {
        let plans = self
            .storage
            .run("plans.list", |db| {
                plan::Entity::find()
                    .order_by_asc(plan::Column::Id)
                    .all(db)
            })
            .await?;
        Ok(plans.into_iter().map(PlanResponse::from).collect())
    }

    pub async fn set_active(&self, plan_id: i32, active: bool) -> AppResult<PlanResponse> {
        let existing = self
            .storage
            .run("plans.find", |db| plan::Entity::find_by_id(plan_id).one(db))
            .await?
            .ok_or_else(|| AppError::NotFound("Plan not found".into()))?;

        let mut am = existing.into_active_model();
        am.active = Set(active);
        let updated = self
            .storage
            .run("plans.update", |db| am.clone().update(db))
            .await?;
        Ok(PlanResponse::from(updated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_storage;

    fn plan_request(name: &str, price: i64, due_day: Option<i32>) -> CreatePlanRequest {
        CreatePlanRequest {
            name: name.into(),
            price,
            due_day,
        }
    }

    #[tokio::test]
    async fn test_create_plan_defaults() {
        let service = PlanService::new(test_storage().await);
        let plan = service
            .create_plan(plan_request("Monthly", 10_000, None))
            .await
            .unwrap();
        assert_eq!(plan.due_day, 10);
        assert!(plan.active);
        assert_eq!(plan.price, 10_000);
    }

    #[tokio::test]
    async fn test_set_active_and_list_includes_inactive() {
        let service = PlanService::new(test_storage().await);
        let basic = service
            .create_plan(plan_request("Basic", 5_000, Some(5)))
            .await
            .unwrap();
        service
            .create_plan(plan_request("Premium", 20_000, Some(20)))
            .await
            .unwrap();

        let updated = service.set_active(basic.id, false).await.unwrap();
        assert!(!updated.active);

        let plans = service.list_plans().await.unwrap();
        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].name, "Basic");
        assert!(!plans[0].active);
        assert!(plans[1].active);
    }

    #[tokio::test]
    async fn test_set_active_missing_plan() {
        let service = PlanService::new(test_storage().await);
        let result = service.set_active(999, true).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_duplicate_name_is_not_retried() {
        let service = PlanService::new(test_storage().await);
        service
            .create_plan(plan_request("Monthly", 10_000, None))
            .await
            .unwrap();
        let result = service
            .create_plan(plan_request("Monthly", 12_000, None))
            .await;
        assert!(matches!(result, Err(AppError::DatabaseError(_))));
    }
}
