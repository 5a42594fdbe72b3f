use crate::models::*;
use crate::services::BillingService;
use crate::utils::BillingPeriod;
use actix_web::{HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    post,
    path = "/finance/fees/generate",
    tag = "fees",
    request_body = GenerateFeesRequest,
    responses(
        (status = 200, description = "Number of fees created", body = GenerateFeesResponse),
        (status = 400, description = "Invalid month or year")
    )
)]
pub async fn generate_fees(
    billing_service: web::Data<BillingService>,
    request: web::Json<GenerateFeesRequest>,
) -> Result<HttpResponse> {
    let period = match request.period() {
        Ok(period) => period,
        Err(e) => return Ok(e.error_response()),
    };
    match billing_service.generate(period, request.account_id).await {
        Ok(resp) => Ok(HttpResponse::Ok().json(ApiResponse::success(resp))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/finance/fees",
    tag = "fees",
    params(
        ("status" = Option<String>, Query, description = "pending | paid | overdue | cancelled"),
        ("month" = Option<u32>, Query, description = "Billing month, applied together with year"),
        ("year" = Option<i32>, Query, description = "Billing year, applied together with month"),
        ("account_id" = Option<i32>, Query, description = "Owning account (member_id accepted)")
    ),
    responses(
        (status = 200, description = "Fees ordered by due date", body = Vec<FeeResponse>),
        (status = 400, description = "Invalid month")
    )
)]
pub async fn list_fees(
    billing_service: web::Data<BillingService>,
    query: web::Query<FeeQuery>,
) -> Result<HttpResponse> {
    match billing_service.list_fees(&query).await {
        Ok(fees) => Ok(HttpResponse::Ok().json(ApiResponse::success(fees))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/finance/fees",
    tag = "fees",
    request_body = CreateFeeRequest,
    responses(
        (status = 200, description = "Fee created", body = FeeResponse),
        (status = 400, description = "Invalid fee data")
    )
)]
pub async fn create_fee(
    billing_service: web::Data<BillingService>,
    request: web::Json<CreateFeeRequest>,
) -> Result<HttpResponse> {
    let request = request.into_inner();
    if let Err(e) = request.validate() {
        return Ok(e.error_response());
    }
    match billing_service.create_fee(request).await {
        Ok(fee) => Ok(HttpResponse::Ok().json(ApiResponse::success(fee))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/finance/fees/{id}",
    tag = "fees",
    params(("id" = i32, Path, description = "Fee id")),
    responses(
        (status = 200, description = "Fee", body = FeeResponse),
        (status = 404, description = "Fee not found")
    )
)]
pub async fn get_fee(
    billing_service: web::Data<BillingService>,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    match billing_service.get_fee(path.into_inner()).await {
        Ok(fee) => Ok(HttpResponse::Ok().json(ApiResponse::success(fee))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    patch,
    path = "/finance/fees/{id}/status",
    tag = "fees",
    params(("id" = i32, Path, description = "Fee id")),
    request_body = UpdateFeeStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = FeeResponse),
        (status = 404, description = "Fee not found"),
        (status = 409, description = "Transition not allowed")
    )
)]
pub async fn update_status(
    billing_service: web::Data<BillingService>,
    path: web::Path<i32>,
    request: web::Json<UpdateFeeStatusRequest>,
) -> Result<HttpResponse> {
    let UpdateFeeStatusRequest { status, note } = request.into_inner();
    match billing_service
        .update_status(path.into_inner(), status, note)
        .await
    {
        Ok(fee) => Ok(HttpResponse::Ok().json(ApiResponse::success(fee))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/finance/fees/{id}/pay",
    tag = "fees",
    params(("id" = i32, Path, description = "Fee id")),
    request_body = MarkPaidRequest,
    responses(
        (status = 200, description = "Fee marked paid", body = FeeResponse),
        (status = 404, description = "Fee not found"),
        (status = 409, description = "Fee is cancelled")
    )
)]
pub async fn mark_paid(
    billing_service: web::Data<BillingService>,
    path: web::Path<i32>,
    request: Option<web::Json<MarkPaidRequest>>,
) -> Result<HttpResponse> {
    let paid_at = request.and_then(|r| r.into_inner().paid_at);
    match billing_service.mark_paid(path.into_inner(), paid_at).await {
        Ok(fee) => Ok(HttpResponse::Ok().json(ApiResponse::success(fee))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/finance/fees/{id}/cancel",
    tag = "fees",
    params(("id" = i32, Path, description = "Fee id")),
    request_body = CancelFeeRequest,
    responses(
        (status = 200, description = "Fee cancelled", body = FeeResponse),
        (status = 404, description = "Fee not found")
    )
)]
pub async fn cancel_fee(
    billing_service: web::Data<BillingService>,
    path: web::Path<i32>,
    request: Option<web::Json<CancelFeeRequest>>,
) -> Result<HttpResponse> {
    let note = request.and_then(|r| r.into_inner().note);
    match billing_service.cancel(path.into_inner(), note).await {
        Ok(fee) => Ok(HttpResponse::Ok().json(ApiResponse::success(fee))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    patch,
    path = "/finance/fees/{id}/account",
    tag = "fees",
    params(("id" = i32, Path, description = "Fee id")),
    request_body = ReassignAccountRequest,
    responses(
        (status = 200, description = "Owning account changed", body = FeeResponse),
        (status = 404, description = "Fee not found")
    )
)]
pub async fn reassign_account(
    billing_service: web::Data<BillingService>,
    path: web::Path<i32>,
    request: web::Json<ReassignAccountRequest>,
) -> Result<HttpResponse> {
    match billing_service
        .reassign_account(path.into_inner(), request.account_id)
        .await
    {
        Ok(fee) => Ok(HttpResponse::Ok().json(ApiResponse::success(fee))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/finance/fees/totals",
    tag = "fees",
    params(
        ("month" = u32, Query, description = "Billing month (1-12)"),
        ("year" = i32, Query, description = "Billing year")
    ),
    responses(
        (status = 200, description = "Received and outstanding sums in cents", body = FeeTotalsResponse),
        (status = 400, description = "Invalid month")
    )
)]
pub async fn totals(
    billing_service: web::Data<BillingService>,
    query: web::Query<TotalsQuery>,
) -> Result<HttpResponse> {
    let period = match BillingPeriod::new(query.month, query.year) {
        Ok(period) => period,
        Err(e) => return Ok(e.error_response()),
    };
    match billing_service.totals(period).await {
        Ok(resp) => Ok(HttpResponse::Ok().json(ApiResponse::success(resp))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/finance/fees/overdue-sweep",
    tag = "fees",
    responses(
        (status = 200, description = "Pending fees past due moved to overdue", body = OverdueSweepResponse)
    )
)]
pub async fn overdue_sweep(billing_service: web::Data<BillingService>) -> Result<HttpResponse> {
    match billing_service.auto_update_overdue().await {
        Ok(resp) => Ok(HttpResponse::Ok().json(ApiResponse::success(resp))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/finance/fees/{id}/notify-late",
    tag = "fees",
    params(("id" = i32, Path, description = "Fee id")),
    responses(
        (status = 200, description = "Late notice recorded", body = FeeResponse),
        (status = 404, description = "Fee not found")
    )
)]
pub async fn notify_late(
    billing_service: web::Data<BillingService>,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    match billing_service.notify_late(path.into_inner()).await {
        Ok(fee) => Ok(HttpResponse::Ok().json(ApiResponse::success(fee))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/finance/fees/{id}/reminder",
    tag = "fees",
    params(("id" = i32, Path, description = "Fee id")),
    responses(
        (status = 200, description = "Reminder recorded", body = FeeResponse),
        (status = 404, description = "Fee not found")
    )
)]
pub async fn send_reminder(
    billing_service: web::Data<BillingService>,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    match billing_service.send_reminder(path.into_inner()).await {
        Ok(fee) => Ok(HttpResponse::Ok().json(ApiResponse::success(fee))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn fee_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/fees")
            .route("", web::get().to(list_fees))
            .route("", web::post().to(create_fee))
            .route("/generate", web::post().to(generate_fees))
            .route("/totals", web::get().to(totals))
            .route("/overdue-sweep", web::post().to(overdue_sweep))
            .route("/{id}", web::get().to(get_fee))
            .route("/{id}/status", web::patch().to(update_status))
            .route("/{id}/pay", web::post().to(mark_paid))
            .route("/{id}/cancel", web::post().to(cancel_fee))
            .route("/{id}/account", web::patch().to(reassign_account))
            .route("/{id}/notify-late", web::post().to(notify_late))
            .route("/{id}/reminder", web::post().to(send_reminder)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::finance_config;
    use crate::services::{PlanService, SubscriptionService};
    use crate::test_utils::test_storage;
    use actix_web::{App, http::StatusCode, test};
    use serde_json::{Value, json};

    macro_rules! finance_app {
        () => {{
            let storage = test_storage().await;
            test::init_service(
                App::new()
                    .app_data(web::Data::new(PlanService::new(storage.clone())))
                    .app_data(web::Data::new(SubscriptionService::new(storage.clone())))
                    .app_data(web::Data::new(BillingService::new(storage)))
                    .service(web::scope("/api/v1").configure(finance_config)),
            )
            .await
        }};
    }

    #[actix_web::test]
    async fn test_generate_then_totals_over_http() {
        let app = finance_app!();

        let req = test::TestRequest::post()
            .uri("/api/v1/finance/plans")
            .set_json(json!({"name": "Monthly", "price": 10000, "due_day": 10}))
            .to_request();
        let plan: Value = test::call_and_read_body_json(&app, req).await;
        let plan_id = plan["data"]["id"].as_i64().unwrap();

        // legacy member_id is accepted as account_id
        let req = test::TestRequest::post()
            .uri("/api/v1/finance/subscriptions")
            .set_json(json!({"member_id": 3, "plan_id": plan_id}))
            .to_request();
        let link: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(link["data"]["account_id"], 3);

        let req = test::TestRequest::post()
            .uri("/api/v1/finance/fees/generate")
            .set_json(json!({"month": 11, "year": 2025}))
            .to_request();
        let generated: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(generated, json!({"success": true, "data": {"created": 1}}));

        let req = test::TestRequest::get()
            .uri("/api/v1/finance/fees?month=11&year=2025&member_id=3")
            .to_request();
        let fees: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(fees["data"][0]["due_date"], "2025-11-10");
        assert_eq!(fees["data"][0]["status"], "pending");

        let req = test::TestRequest::get()
            .uri("/api/v1/finance/fees/totals?month=11&year=2025")
            .to_request();
        let totals: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(totals["data"]["pending_total"], 10000);
        assert_eq!(totals["data"]["received"], 0);
    }

    #[actix_web::test]
    async fn test_rejects_invalid_input() {
        let app = finance_app!();

        let req = test::TestRequest::post()
            .uri("/api/v1/finance/plans")
            .set_json(json!({"name": "Free", "price": 0}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/api/v1/finance/fees/generate")
            .set_json(json!({"month": 13, "year": 2025}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/api/v1/finance/fees/41/pay")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_paying_cancelled_fee_conflicts() {
        let app = finance_app!();

        let req = test::TestRequest::post()
            .uri("/api/v1/finance/fees")
            .set_json(json!({"account_id": 1, "amount": 2500, "due_date": "2025-11-10"}))
            .to_request();
        let fee: Value = test::call_and_read_body_json(&app, req).await;
        let id = fee["data"]["id"].as_i64().unwrap();

        let req = test::TestRequest::post()
            .uri(&format!("/api/v1/finance/fees/{id}/cancel"))
            .set_json(json!({"note": "duplicate"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::post()
            .uri(&format!("/api/v1/finance/fees/{id}/pay"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }
}
