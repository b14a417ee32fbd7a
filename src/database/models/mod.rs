pub mod category;
pub mod product;
pub mod review;

pub use category::Category;
pub use product::{Product, ProductDetails, ProductView, DEFAULT_PICTURE};
pub use review::{NewReview, Review};
