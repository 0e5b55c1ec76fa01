//! Diesel row models and conversions to/from the domain layer.

pub mod category;
pub mod config;
pub mod product;
pub mod product_image;
