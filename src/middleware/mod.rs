pub mod auth;
pub mod response;

pub use auth::{AdminUser, AuthUser};
pub use response::{ApiResponse, ApiResult};
