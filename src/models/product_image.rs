use diesel::prelude::*;

use crate::domain::image::ProductImage as DomainProductImage;
use crate::domain::types::{StoredFileName, TypeConstraintError};

/// Diesel model representing the `product_images` table.
#[derive(Debug, Clone, Identifiable, Queryable)]
#[diesel(table_name = crate::schema::product_images)]
pub struct ProductImage {
    pub id: i32,
    pub product_id: i32,
    pub file_name: String,
    pub is_cover: bool,
}

/// Insertable form of [`ProductImage`].
#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::product_images)]
pub struct NewProductImage {
    pub product_id: i32,
    pub file_name: String,
    pub is_cover: bool,
}

impl TryFrom<ProductImage> for DomainProductImage {
    type Error = TypeConstraintError;

    fn try_from(image: ProductImage) -> Result<Self, Self::Error> {
        Ok(Self {
            id: image.id.try_into()?,
            product_id: image.product_id.try_into()?,
            file_name: StoredFileName::new(image.file_name)?,
            is_cover: image.is_cover,
        })
    }
}
