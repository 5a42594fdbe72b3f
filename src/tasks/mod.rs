//! Recurring billing jobs.
//!
//! Call `spawn_all` once during startup; each loop is detached with
//! `tokio::spawn` and keeps running after a failed pass.

use std::time::Duration;

use crate::config::SchedulerConfig;
use crate::services::BillingService;
use crate::utils::BillingPeriod;

/// Spawn the overdue sweep and the current-month generation loop.
///
/// Generation is idempotent per period, so running it repeatedly through a
/// month only picks up accounts linked since the previous pass.
pub fn spawn_all(billing_service: BillingService, config: &SchedulerConfig) {
    {
        let svc = billing_service.clone();
        let interval = Duration::from_secs(config.overdue_sweep_interval_secs);
        tokio::spawn(async move {
            loop {
                match svc.auto_update_overdue().await {
                    Ok(resp) if resp.updated > 0 => {
                        log::info!("Fees moved to overdue: {}", resp.updated)
                    }
                    Ok(_) => {}
                    Err(e) => log::error!("Failed to run overdue sweep: {e:?}"),
                }
                tokio::time::sleep(interval).await;
            }
        });
    }

    {
        let svc = billing_service;
        let interval = Duration::from_secs(config.generation_interval_secs);
        tokio::spawn(async move {
            loop {
                let period = BillingPeriod::containing(chrono::Utc::now().date_naive());
                log::debug!("Start generating fees for {period}");
                match svc.generate(period, None).await {
                    Ok(resp) if resp.created > 0 => {
                        log::info!("Fees generated for {period}: {}", resp.created)
                    }
                    Ok(_) => {}
                    Err(e) => log::error!("Failed to generate fees for {period}: {e:?}"),
                }
                tokio::time::sleep(interval).await;
            }
        });
    }
}
