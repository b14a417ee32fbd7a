// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Security Level: None (completely public access)
// Route Prefix: /api/products/top, /api/products/:id (GET only)
// Middleware: None

pub mod products;

pub use products::{product_get, products_top};
