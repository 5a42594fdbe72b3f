use crate::entities::subscription_link_entity as link;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Older clients send `member_id`; it is accepted as `account_id` here and
/// nowhere else.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AssignPlanRequest {
    #[serde(alias = "member_id")]
    pub account_id: i32,
    pub plan_id: i32,
    pub start_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct SubscriptionQuery {
    #[serde(default, alias = "member_id")]
    pub account_id: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubscriptionLinkResponse {
    pub id: i32,
    pub account_id: i32,
    pub plan_id: i32,
    pub start_date: DateTime<Utc>,
}

impl From<link::Model> for SubscriptionLinkResponse {
    fn from(m: link::Model) -> Self {
        Self {
            id: m.id,
            account_id: m.account_id,
            plan_id: m.plan_id,
            start_date: m.start_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_member_id_accepted() {
        let legacy: AssignPlanRequest =
            serde_json::from_str(r#"{"member_id": 7, "plan_id": 1}"#).unwrap();
        assert_eq!(legacy.account_id, 7);
        assert!(legacy.start_date.is_none());

        let current: AssignPlanRequest =
            serde_json::from_str(r#"{"account_id": 8, "plan_id": 1}"#).unwrap();
        assert_eq!(current.account_id, 8);
    }
}
