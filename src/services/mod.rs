pub mod auth_service;
pub mod banner_service;
pub mod discount_service;

pub use auth_service::*;
pub use banner_service::*;
pub use discount_service::*;
