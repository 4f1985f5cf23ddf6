use chrono::{DateTime, Utc};
use std::fmt;

use super::{Audience, DateWindow};
use crate::entities::discount_entity as discounts;

/// The user a discount is evaluated for.
#[derive(Debug, Clone, Copy)]
pub struct Customer<'a> {
    pub email: &'a str,
    pub tier: &'a str,
}

/// First rule that rejected a discount, in evaluation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exclusion {
    Inactive,
    OutsideWindow,
    TierNotTargeted,
    UserNotTargeted,
    PerUserLimitReached { used: i64, limit: i64 },
    UsageLimitReached { used: i64, limit: i64 },
}

impl fmt::Display for Exclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exclusion::Inactive => write!(f, "Discount is not active"),
            Exclusion::OutsideWindow => write!(f, "Discount is outside its validity window"),
            Exclusion::TierNotTargeted => write!(f, "Discount does not target this subscription tier"),
            Exclusion::UserNotTargeted => write!(f, "Discount does not target this user"),
            Exclusion::PerUserLimitReached { used, limit } => {
                write!(f, "Per-user limit reached ({used}/{limit})")
            }
            Exclusion::UsageLimitReached { used, limit } => {
                write!(f, "Usage limit reached ({used}/{limit})")
            }
        }
    }
}

impl discounts::Model {
    pub fn window(&self) -> DateWindow {
        DateWindow::new(self.start_date, self.end_date)
    }

    pub fn tier_audience(&self) -> Audience<String> {
        Audience::from(&self.target_tiers)
    }

    pub fn user_audience(&self) -> Audience<String> {
        Audience::from(&self.target_users)
    }

    /// Expiry is computed, never stored.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.window().has_ended(now)
    }

    pub fn remaining_uses(&self) -> Option<i64> {
        self.usage_limit.map(|limit| (limit - self.total_uses).max(0))
    }
}

/// Runs every eligibility rule against one discount.
///
/// `requested_tier` overrides the customer's own tier for the tier rule only.
/// `user_usage_count` is the number of usage records this customer already has
/// for the discount.
pub fn check_discount(
    discount: &discounts::Model,
    customer: &Customer<'_>,
    requested_tier: Option<&str>,
    user_usage_count: i64,
    now: DateTime<Utc>,
) -> Result<(), Exclusion> {
    if !discount.is_active {
        return Err(Exclusion::Inactive);
    }
    if !discount.window().contains(now) {
        return Err(Exclusion::OutsideWindow);
    }

    let tier = requested_tier
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(customer.tier);
    if !discount.tier_audience().admits_key(tier) {
        return Err(Exclusion::TierNotTargeted);
    }
    if !discount.user_audience().admits_key(customer.email) {
        return Err(Exclusion::UserNotTargeted);
    }

    if user_usage_count >= discount.per_user_limit {
        return Err(Exclusion::PerUserLimitReached {
            used: user_usage_count,
            limit: discount.per_user_limit,
        });
    }
    if let Some(limit) = discount.usage_limit
        && discount.total_uses >= limit
    {
        return Err(Exclusion::UsageLimitReached { used: discount.total_uses, limit });
    }

    Ok(())
}

pub fn is_discount_available(
    discount: &discounts::Model,
    customer: &Customer<'_>,
    requested_tier: Option<&str>,
    user_usage_count: i64,
    now: DateTime<Utc>,
) -> bool {
    check_discount(discount, customer, requested_tier, user_usage_count, now).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{DiscountType, TargetList};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap()
    }

    fn discount() -> discounts::Model {
        discounts::Model {
            id: "d-1".to_string(),
            name: "Spring sale".to_string(),
            description: None,
            discount_type: DiscountType::Percentage,
            value: 20.0,
            target_tiers: TargetList::default(),
            target_users: TargetList::default(),
            start_date: None,
            end_date: None,
            usage_limit: None,
            per_user_limit: 1,
            minimum_purchase: None,
            is_active: true,
            total_uses: 0,
            total_revenue_impact: 0.0,
            created_by: "admin".to_string(),
            created_at: now(),
            updated_at: now(),
        }
    }

    fn customer() -> Customer<'static> {
        Customer { email: "sam@example.com", tier: "growth" }
    }

    #[test]
    fn test_open_discount_available() {
        assert_eq!(check_discount(&discount(), &customer(), None, 0, now()), Ok(()));
    }

    #[test]
    fn test_inactive_excluded() {
        let mut d = discount();
        d.is_active = false;
        assert_eq!(check_discount(&d, &customer(), None, 0, now()), Err(Exclusion::Inactive));
    }

    #[test]
    fn test_window_inclusive() {
        let mut d = discount();
        d.start_date = Some(now());
        d.end_date = Some(now());
        assert!(is_discount_available(&d, &customer(), None, 0, now()));

        d.end_date = Some(now() - Duration::seconds(1));
        d.start_date = None;
        assert_eq!(check_discount(&d, &customer(), None, 0, now()), Err(Exclusion::OutsideWindow));
        assert!(d.is_expired(now()));
    }

    #[test]
    fn test_requested_tier_overrides_user_tier() {
        let mut d = discount();
        d.target_tiers = TargetList::from_values(vec!["enterprise".to_string()]);

        assert_eq!(
            check_discount(&d, &customer(), None, 0, now()),
            Err(Exclusion::TierNotTargeted)
        );
        assert!(is_discount_available(&d, &customer(), Some("Enterprise"), 0, now()));
        // blank override falls back to the user's tier
        assert!(!is_discount_available(&d, &customer(), Some(" "), 0, now()));
    }

    #[test]
    fn test_user_targeting() {
        let mut d = discount();
        d.target_users = TargetList::from_values(vec!["vip@example.com".to_string()]);
        assert_eq!(
            check_discount(&d, &customer(), None, 0, now()),
            Err(Exclusion::UserNotTargeted)
        );

        d.target_users = TargetList::from_values(vec!["SAM@example.com".to_string()]);
        assert!(is_discount_available(&d, &customer(), None, 0, now()));
    }

    #[test]
    fn test_per_user_limit() {
        let mut d = discount();
        assert_eq!(
            check_discount(&d, &customer(), None, 1, now()),
            Err(Exclusion::PerUserLimitReached { used: 1, limit: 1 })
        );

        d.per_user_limit = 3;
        assert!(is_discount_available(&d, &customer(), None, 2, now()));
        assert!(!is_discount_available(&d, &customer(), None, 3, now()));
    }

    #[test]
    fn test_global_usage_limit() {
        let mut d = discount();
        d.usage_limit = Some(100);
        d.total_uses = 100;
        d.per_user_limit = 5;
        assert_eq!(
            check_discount(&d, &customer(), None, 0, now()),
            Err(Exclusion::UsageLimitReached { used: 100, limit: 100 })
        );
        assert_eq!(d.remaining_uses(), Some(0));

        d.total_uses = 99;
        assert!(is_discount_available(&d, &customer(), None, 0, now()));
        assert_eq!(d.remaining_uses(), Some(1));
    }

    #[test]
    fn test_exclusion_messages() {
        assert_eq!(
            Exclusion::PerUserLimitReached { used: 1, limit: 1 }.to_string(),
            "Per-user limit reached (1/1)"
        );
        assert_eq!(Exclusion::Inactive.to_string(), "Discount is not active");
    }
}
