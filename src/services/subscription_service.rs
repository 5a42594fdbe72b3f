use crate::database::Storage;
use crate::entities::subscription_link_entity as link;
use crate::error::AppResult;
use crate::models::{AssignPlanRequest, SubscriptionLinkResponse};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

/// Account-to-plan assignments. An account may hold several links; billing
/// honours the first one per period.
#[derive(Clone)]
pub struct SubscriptionService {
    storage: Storage,
}

impl SubscriptionService {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// The plan is not checked here; a missing or inactive plan is skipped
    /// when fees are generated.
    pub async fn assign(&self, req: AssignPlanRequest) -> AppResult<SubscriptionLinkResponse> {
        let am = link::ActiveModel {
            account_id: Set(req.account_id),
            plan_id: Set(req.plan_id),
            start_date: Set(req.start_date.unwrap_or_else(Utc::now)),
            ..Default::default()
        };
        let created = self
            .storage
            .run("subscription_links.insert", |db| am.clone().insert(db))
            .await?;

        log::info!(
            "Plan {} assigned to account {}",
            created.plan_id,
            created.account_id
        );
        Ok(SubscriptionLinkResponse::from(created))
    }

    /// Links in insertion order, optionally for a single account.
    pub async fn list_links(&self, account_id: Option<i32>) -> AppResult<Vec<link::Model>> {
        self.storage
            .run("subscription_links.list", |db| {
                let mut query = link::Entity::find();
                if let Some(account_id) = account_id {
                    query = query.filter(link::Column::AccountId.eq(account_id));
                }
                query.order_by_asc(link::Column::Id).all(db)
            })
            .await
    }

    pub async fn list_subscriptions(
        &self,
        account_id: Option<i32>,
    ) -> AppResult<Vec<SubscriptionLinkResponse>> {
        let links = self.list_links(account_id).await?;
        Ok(links.into_iter().map(SubscriptionLinkResponse::from).collect())
    }
}
