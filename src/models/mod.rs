pub mod banner;
pub mod common;
pub mod discount;
pub mod pagination;
pub mod user;

pub use banner::*;
pub use common::*;
pub use discount::*;
pub use pagination::*;
pub use user::*;
