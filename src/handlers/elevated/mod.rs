// handlers/elevated/mod.rs - Elevated handlers (staff JWT required)
//
// Security Level: JWT Authentication + is_staff claim
// Route Prefix: /api/products (POST), /api/products/:id (PUT, DELETE), /api/products/:id/price (PUT)
// Middleware: jwt_auth_middleware → require_staff_middleware

pub mod products;

pub use products::{price_put, product_delete, product_post, product_put};
