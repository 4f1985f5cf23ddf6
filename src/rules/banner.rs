use chrono::{DateTime, Utc};

use super::{Audience, DateWindow};
use crate::entities::banner_entity as banners;
use crate::entities::BannerStatus;

/// The signed-in user a banner list is computed for.
#[derive(Debug, Clone, Copy)]
pub struct Viewer<'a> {
    pub email: &'a str,
    pub tier: &'a str,
}

impl banners::Model {
    pub fn window(&self) -> DateWindow {
        DateWindow::new(self.start_date, self.end_date)
    }

    pub fn user_audience(&self) -> Audience<String> {
        Audience::from(&self.target_users)
    }

    pub fn tier_audience(&self) -> Audience<String> {
        Audience::from(&self.target_tiers)
    }
}

pub fn is_banner_visible(banner: &banners::Model, viewer: &Viewer<'_>, now: DateTime<Utc>) -> bool {
    banner.status == BannerStatus::Active
        && banner.window().contains(now)
        && banner.user_audience().admits_key(viewer.email)
        && banner.tier_audience().admits_key(viewer.tier)
}

/// Visible banners, highest priority first. Ties keep their input order.
pub fn select_visible_banners(
    banners: Vec<banners::Model>,
    viewer: &Viewer<'_>,
    now: DateTime<Utc>,
) -> Vec<banners::Model> {
    let mut visible: Vec<banners::Model> = banners
        .into_iter()
        .filter(|b| is_banner_visible(b, viewer, now))
        .collect();
    visible.sort_by(|a, b| b.priority.cmp(&a.priority));
    visible
}

/// Status a banner starts with. `draft` and `paused` are kept as requested,
/// everything else is derived from the date window.
pub fn initial_status(
    requested: Option<BannerStatus>,
    window: &DateWindow,
    now: DateTime<Utc>,
) -> BannerStatus {
    match requested {
        Some(BannerStatus::Draft) => BannerStatus::Draft,
        Some(BannerStatus::Paused) => BannerStatus::Paused,
        _ if !window.has_started(now) => BannerStatus::Scheduled,
        _ if window.has_ended(now) => BannerStatus::Expired,
        _ => BannerStatus::Active,
    }
}

/// Transition applied by the lifecycle sweep, if any.
pub fn lifecycle_transition(
    current: BannerStatus,
    window: &DateWindow,
    now: DateTime<Utc>,
) -> Option<BannerStatus> {
    match current {
        BannerStatus::Active | BannerStatus::Scheduled if window.has_ended(now) => {
            Some(BannerStatus::Expired)
        }
        BannerStatus::Scheduled if window.has_started(now) => Some(BannerStatus::Active),
        _ => None,
    }
}
