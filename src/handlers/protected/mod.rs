// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Security Level: JWT Authentication Required
// Route Prefix: /api/products/:id/reviews
// Middleware: jwt_auth_middleware (injects AuthUser)

pub mod reviews;

pub use reviews::review_post;
