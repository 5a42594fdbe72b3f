use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter

use clube_billing::{
    config::Config,
    database::{Storage, create_pool, run_migrations},
    handlers,
    services::*,
    swagger::swagger_config,
    tasks,
};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    let config = Config::from_toml()?;

    let pool = create_pool(&config.database).await?;

    // Schema must be current before any service touches storage
    run_migrations(&pool).await?;

    let storage = Storage::new(pool, config.retry.policy());
    let plan_service = PlanService::new(storage.clone());
    let subscription_service = SubscriptionService::new(storage.clone());
    let billing_service = BillingService::new(storage);

    if config.scheduler.enabled {
        tasks::spawn_all(billing_service.clone(), &config.scheduler);
    } else {
        log::info!("Background billing tasks disabled");
    }

    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(web::Data::new(plan_service.clone()))
            .app_data(web::Data::new(subscription_service.clone()))
            .app_data(web::Data::new(billing_service.clone()))
            .configure(swagger_config)
            .service(web::scope("/api/v1").configure(handlers::finance_config))
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await?;

    Ok(())
}
