//! Recurring background jobs. Call `spawn_all` once during startup.

use crate::config::TasksConfig;
use crate::services::BannerService;
use chrono::Utc;

/// Spawn all background tasks.
///
/// Tasks are detached with `tokio::spawn`; errors are logged and the loop keeps going.
pub fn spawn_all(config: &TasksConfig, banner_service: BannerService) {
    // Banner lifecycle: scheduled -> active, active/scheduled -> expired
    {
        let svc = banner_service;
        let interval = std::time::Duration::from_secs(config.banner_sweep_interval_secs.max(1));
        tokio::spawn(async move {
            loop {
                match svc.sweep_statuses(Utc::now()).await {
                    Ok(n) if n > 0 => log::info!("Banner statuses updated: {n}"),
                    Ok(_) => {}
                    Err(e) => log::error!("Failed to sweep banner statuses: {e:?}"),
                }
                tokio::time::sleep(interval).await;
            }
        });
    }
}
