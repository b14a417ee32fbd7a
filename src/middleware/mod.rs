pub mod auth;
pub mod response;
pub mod staff;

pub use auth::{jwt_auth_middleware, AuthUser};
pub use response::{ApiResponse, ApiResult};
pub use staff::require_staff_middleware;
