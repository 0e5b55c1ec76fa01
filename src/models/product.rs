use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::product::{
    NewProduct as DomainNewProduct, Product as DomainProduct, ProductUpdate,
};
use crate::domain::types::{
    ProductDescription, ProductName, ProductPrice, Slug, StockCount, StoredFileName,
    TypeConstraintError,
};

/// Diesel model representing the `products` table.
#[derive(Debug, Clone, Identifiable, Queryable)]
#[diesel(table_name = crate::schema::products)]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: f64,
    pub discount_price: Option<f64>,
    pub status: bool,
    pub stock: i32,
    pub brand_id: Option<i32>,
    pub supplier_id: Option<i32>,
    pub is_visible_brand: bool,
    pub is_visible_supplier: bool,
    pub delivery_time: i32,
    pub free_cargo_status: bool,
    pub homepage_visible: bool,
    pub order_count: i32,
    pub preview_video: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Insertable form of [`Product`].
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::products)]
pub struct NewProduct {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: f64,
    pub discount_price: Option<f64>,
    pub status: bool,
    pub stock: i32,
    pub brand_id: Option<i32>,
    pub supplier_id: Option<i32>,
    pub is_visible_brand: bool,
    pub is_visible_supplier: bool,
    pub delivery_time: i32,
    pub free_cargo_status: bool,
    pub preview_video: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Changeset form of [`Product`]; `preview_video` is applied separately
/// because `None` means "leave unchanged" rather than "clear".
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = crate::schema::products)]
pub struct ProductChangeset {
    pub name: String,
    pub slug: String,
    pub description: Option<Option<String>>,
    pub price: f64,
    pub discount_price: Option<Option<f64>>,
    pub status: bool,
    pub stock: i32,
    pub brand_id: Option<Option<i32>>,
    pub supplier_id: Option<Option<i32>>,
    pub is_visible_brand: bool,
    pub is_visible_supplier: bool,
    pub delivery_time: i32,
    pub free_cargo_status: bool,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<Product> for DomainProduct {
    type Error = TypeConstraintError;

    fn try_from(product: Product) -> Result<Self, Self::Error> {
        Ok(Self {
            id: product.id.try_into()?,
            name: ProductName::new(product.name)?,
            slug: Slug::new(product.slug)?,
            description: product
                .description
                .map(ProductDescription::new)
                .transpose()?,
            price: ProductPrice::new(product.price)?,
            discount_price: product.discount_price.map(ProductPrice::new).transpose()?,
            status: product.status,
            stock: StockCount::new(product.stock)?,
            brand_id: product.brand_id.map(TryInto::try_into).transpose()?,
            supplier_id: product.supplier_id.map(TryInto::try_into).transpose()?,
            is_visible_brand: product.is_visible_brand,
            is_visible_supplier: product.is_visible_supplier,
            delivery_time: product.delivery_time,
            free_cargo_status: product.free_cargo_status,
            homepage_visible: product.homepage_visible,
            order_count: product.order_count,
            preview_video: product.preview_video.map(StoredFileName::new).transpose()?,
            created_at: product.created_at,
            updated_at: product.updated_at,
        })
    }
}

impl From<DomainNewProduct> for NewProduct {
    fn from(product: DomainNewProduct) -> Self {
        Self {
            name: product.name.into_inner(),
            slug: product.slug.into_inner(),
            description: product.description.map(ProductDescription::into_inner),
            price: product.price.get(),
            discount_price: product.discount_price.map(ProductPrice::get),
            status: product.status,
            stock: product.stock.get(),
            brand_id: product.brand_id.map(Into::into),
            supplier_id: product.supplier_id.map(Into::into),
            is_visible_brand: product.is_visible_brand,
            is_visible_supplier: product.is_visible_supplier,
            delivery_time: product.delivery_time,
            free_cargo_status: product.free_cargo_status,
            preview_video: product.preview_video.map(StoredFileName::into_inner),
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

impl From<&ProductUpdate> for ProductChangeset {
    fn from(update: &ProductUpdate) -> Self {
        Self {
            name: update.name.as_str().to_string(),
            slug: update.slug.as_str().to_string(),
            description: Some(update.description.as_ref().map(|d| d.as_str().to_string())),
            price: update.price.get(),
            discount_price: Some(update.discount_price.map(ProductPrice::get)),
            status: update.status,
            stock: update.stock.get(),
            brand_id: Some(update.brand_id.map(Into::into)),
            supplier_id: Some(update.supplier_id.map(Into::into)),
            is_visible_brand: update.is_visible_brand,
            is_visible_supplier: update.is_visible_supplier,
            delivery_time: update.delivery_time,
            free_cargo_status: update.free_cargo_status,
            updated_at: update.updated_at,
        }
    }
}
