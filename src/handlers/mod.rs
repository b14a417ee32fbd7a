// handlers/mod.rs - 3-Tier Handler Architecture
//
// Public (no auth) → Protected (user JWT) → Elevated (staff JWT)
//
pub mod public;    // Tier 1: No authentication required (GET /api/products/*)
pub mod protected; // Tier 2: JWT authentication required (POST /api/products/:id/reviews)
pub mod elevated;  // Tier 3: Staff JWT required (PUT /api/products/*)
