use actix_web::web;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::FeeStatus;
use crate::handlers;
use crate::models::*;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::plan::create_plan,
        handlers::plan::list_plans,
        handlers::plan::set_plan_active,
        handlers::plan::assign_plan,
        handlers::plan::list_subscriptions,
        handlers::fee::generate_fees,
        handlers::fee::list_fees,
        handlers::fee::create_fee,
        handlers::fee::get_fee,
        handlers::fee::update_status,
        handlers::fee::mark_paid,
        handlers::fee::cancel_fee,
        handlers::fee::reassign_account,
        handlers::fee::totals,
        handlers::fee::overdue_sweep,
        handlers::fee::notify_late,
        handlers::fee::send_reminder,
    ),
    components(
        schemas(
            CreatePlanRequest,
            SetPlanActiveRequest,
            PlanResponse,
            AssignPlanRequest,
            SubscriptionLinkResponse,
            GenerateFeesRequest,
            GenerateFeesResponse,
            CreateFeeRequest,
            UpdateFeeStatusRequest,
            MarkPaidRequest,
            CancelFeeRequest,
            ReassignAccountRequest,
            FeeTotalsResponse,
            OverdueSweepResponse,
            FeeResponse,
            FeeStatus,
            ApiError,
        )
    ),
    tags(
        (name = "plans", description = "Plan catalog API"),
        (name = "subscriptions", description = "Account to plan links"),
        (name = "fees", description = "Fee generation and lifecycle API"),
    ),
    info(
        title = "Clube Billing API",
        version = "0.1.0",
        description = "Periodic membership billing REST API documentation"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
