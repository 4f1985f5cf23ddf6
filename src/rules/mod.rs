//! Targeting and eligibility rules for banners and discounts.
//!
//! Everything here is pure: callers load rows, pass `now` explicitly and get
//! a decision back. Missing optional fields never fail a rule, they simply
//! leave that dimension unconstrained.

pub mod banner;
pub mod discount;

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

use crate::entities::TargetList;

pub use banner::{Viewer, is_banner_visible, select_visible_banners};
pub use discount::{Customer, Exclusion, check_discount, is_discount_available};

/// Canonical form used on both sides of a membership test (emails, tiers).
pub fn normalize_key(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Who a banner or discount is aimed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience<T: Ord> {
    Everyone,
    Only(BTreeSet<T>),
}

impl<T: Ord> Audience<T> {
    pub fn admits(&self, member: &T) -> bool {
        match self {
            Audience::Everyone => true,
            Audience::Only(set) => set.contains(member),
        }
    }

    pub fn is_restricted(&self) -> bool {
        matches!(self, Audience::Only(_))
    }
}

impl Audience<String> {
    /// Membership test on the normalized form of `value`.
    pub fn admits_key(&self, value: &str) -> bool {
        match self {
            Audience::Everyone => true,
            Audience::Only(set) => set.contains(&normalize_key(value)),
        }
    }
}

impl From<&TargetList> for Audience<String> {
    fn from(list: &TargetList) -> Self {
        let set: BTreeSet<String> = list
            .0
            .iter()
            .map(|v| normalize_key(v))
            .filter(|v| !v.is_empty())
            .collect();

        if set.is_empty() {
            Audience::Everyone
        } else {
            Audience::Only(set)
        }
    }
}

/// Activity window with optional, inclusive bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateWindow {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateWindow {
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        self.start.is_none_or(|start| start <= now) && self.end.is_none_or(|end| end >= now)
    }

    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        self.start.is_none_or(|start| start <= now)
    }

    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        self.end.is_some_and(|end| end < now)
    }

    /// `end` must not precede `start` when both are present.
    pub fn is_well_formed(&self) -> bool {
        match (self.start, self.end) {
            (Some(start), Some(end)) => start <= end,
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_empty_target_list_is_everyone() {
        let audience = Audience::from(&TargetList::default());
        assert_eq!(audience, Audience::Everyone);
        assert!(audience.admits_key("anyone@example.com"));
        assert!(!audience.is_restricted());
    }

    #[test]
    fn test_blank_entries_do_not_restrict() {
        let audience = Audience::from(&TargetList(vec!["  ".to_string(), String::new()]));
        assert_eq!(audience, Audience::Everyone);
    }

    #[test]
    fn test_restricted_audience_matches_case_insensitively() {
        let audience = Audience::from(&TargetList(vec!["Alice@Example.com".to_string()]));
        assert!(audience.is_restricted());
        assert!(audience.admits_key("alice@example.com"));
        assert!(audience.admits_key(" ALICE@example.COM "));
        assert!(!audience.admits_key("bob@example.com"));
    }

    #[test]
    fn test_generic_audience() {
        let only: Audience<u8> = Audience::Only([1, 2].into_iter().collect());
        assert!(only.admits(&1));
        assert!(!only.admits(&3));
        assert!(Audience::<u8>::Everyone.admits(&3));
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let window = DateWindow::new(Some(at(10)), Some(at(12)));
        assert!(window.contains(at(10)));
        assert!(window.contains(at(11)));
        assert!(window.contains(at(12)));
        assert!(!window.contains(at(10) - Duration::seconds(1)));
        assert!(!window.contains(at(12) + Duration::seconds(1)));
    }

    #[test]
    fn test_open_window() {
        let window = DateWindow::default();
        assert!(window.contains(at(0)));
        assert!(window.has_started(at(0)));
        assert!(!window.has_ended(at(23)));

        let only_end = DateWindow::new(None, Some(at(5)));
        assert!(only_end.contains(at(1)));
        assert!(only_end.has_ended(at(6)));
    }

    #[test]
    fn test_window_well_formed() {
        assert!(DateWindow::new(Some(at(1)), Some(at(1))).is_well_formed());
        assert!(!DateWindow::new(Some(at(2)), Some(at(1))).is_well_formed());
        assert!(DateWindow::new(None, Some(at(1))).is_well_formed());
    }
}
