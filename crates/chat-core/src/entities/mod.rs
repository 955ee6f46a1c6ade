//! Entity categories known to the client caches

mod category;

pub use category::EntityCategory;
