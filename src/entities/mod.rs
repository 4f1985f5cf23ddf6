pub mod banner_interactions;
pub mod banners;
pub mod discount_usages;
pub mod discounts;
pub mod users;

use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};

pub use banner_interactions as banner_interaction_entity;
pub use banners as banner_entity;
pub use discount_usages as discount_usage_entity;
pub use discounts as discount_entity;
pub use users as user_entity;

pub use banner_interactions::InteractionAction;
pub use banners::{BannerStatus, BannerType};
pub use discounts::DiscountType;
pub use users::UserRole;

/// JSON array of emails or tier names. Stored lowercased; an empty list
/// means the row is not restricted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct TargetList(pub Vec<String>);

impl TargetList {
    pub fn from_values(values: Vec<String>) -> Self {
        let mut items: Vec<String> = values
            .iter()
            .map(|v| crate::rules::normalize_key(v))
            .filter(|v| !v.is_empty())
            .collect();
        items.sort();
        items.dedup();
        Self(items)
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}
