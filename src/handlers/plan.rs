use crate::models::*;
use crate::services::{PlanService, SubscriptionService};
use actix_web::{HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    post,
    path = "/finance/plans",
    tag = "plans",
    request_body = CreatePlanRequest,
    responses(
        (status = 200, description = "Plan created", body = PlanResponse),
        (status = 400, description = "Invalid plan data")
    )
)]
pub async fn create_plan(
    plan_service: web::Data<PlanService>,
    request: web::Json<CreatePlanRequest>,
) -> Result<HttpResponse> {
    let request = request.into_inner();
    if let Err(e) = request.validate() {
        return Ok(e.error_response());
    }
    match plan_service.create_plan(request).await {
        Ok(plan) => Ok(HttpResponse::Ok().json(ApiResponse::success(plan))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/finance/plans",
    tag = "plans",
    responses(
        (status = 200, description = "All plans, inactive ones included", body = Vec<PlanResponse>)
    )
)]
pub async fn list_plans(plan_service: web::Data<PlanService>) -> Result<HttpResponse> {
    match plan_service.list_plans().await {
        Ok(plans) => Ok(HttpResponse::Ok().json(ApiResponse::success(plans))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    patch,
    path = "/finance/plans/{id}/active",
    tag = "plans",
    params(("id" = i32, Path, description = "Plan id")),
    request_body = SetPlanActiveRequest,
    responses(
        (status = 200, description = "Plan updated", body = PlanResponse),
        (status = 404, description = "Plan not found")
    )
)]
pub async fn set_plan_active(
    plan_service: web::Data<PlanService>,
    path: web::Path<i32>,
    request: web::Json<SetPlanActiveRequest>,
) -> Result<HttpResponse> {
    match plan_service
        .set_active(path.into_inner(), request.active)
        .await
    {
        Ok(plan) => Ok(HttpResponse::Ok().json(ApiResponse::success(plan))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/finance/subscriptions",
    tag = "subscriptions",
    request_body = AssignPlanRequest,
    responses(
        (status = 200, description = "Plan assigned to account", body = SubscriptionLinkResponse)
    )
)]
pub async fn assign_plan(
    subscription_service: web::Data<SubscriptionService>,
    request: web::Json<AssignPlanRequest>,
) -> Result<HttpResponse> {
    match subscription_service.assign(request.into_inner()).await {
        Ok(link) => Ok(HttpResponse::Ok().json(ApiResponse::success(link))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/finance/subscriptions",
    tag = "subscriptions",
    params(
        ("account_id" = Option<i32>, Query, description = "Only links for this account (member_id accepted)")
    ),
    responses(
        (status = 200, description = "Subscription links in insertion order", body = Vec<SubscriptionLinkResponse>)
    )
)]
pub async fn list_subscriptions(
    subscription_service: web::Data<SubscriptionService>,
    query: web::Query<SubscriptionQuery>,
) -> Result<HttpResponse> {
    match subscription_service
        .list_subscriptions(query.account_id)
        .await
    {
        Ok(links) => Ok(HttpResponse::Ok().json(ApiResponse::success(links))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn plan_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/plans", web::post().to(create_plan))
        .route("/plans", web::get().to(list_plans))
        .route("/plans/{id}/active", web::patch().to(set_plan_active))
        .route("/subscriptions", web::post().to(assign_plan))
        .route("/subscriptions", web::get().to(list_subscriptions));
}
