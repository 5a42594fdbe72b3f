pub mod fee;
pub mod plan;

pub use fee::fee_config;
pub use plan::plan_config;

use actix_web::web;

/// Everything under `/finance`; mounted inside the `/api/v1` scope.
pub fn finance_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/finance")
            .configure(plan_config)
            .configure(fee_config),
    );
}
