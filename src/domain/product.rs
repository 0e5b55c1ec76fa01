use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::import::ImportRecord;
use crate::domain::types::{
    BrandId, ProductDescription, ProductId, ProductName, ProductPrice, Slug, StockCount,
    StoredFileName, SupplierId,
};

/// A catalog product as stored in the back office.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: ProductName,
    /// URL slug; globally unique, disambiguated at write time.
    pub slug: Slug,
    pub description: Option<ProductDescription>,
    pub price: ProductPrice,
    pub discount_price: Option<ProductPrice>,
    pub status: bool,
    pub stock: StockCount,
    pub brand_id: Option<BrandId>,
    pub supplier_id: Option<SupplierId>,
    pub is_visible_brand: bool,
    pub is_visible_supplier: bool,
    pub delivery_time: i32,
    pub free_cargo_status: bool,
    pub homepage_visible: bool,
    pub order_count: i32,
    pub preview_video: Option<StoredFileName>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Information required to create a new [`Product`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewProduct {
    pub name: ProductName,
    pub slug: Slug,
    pub description: Option<ProductDescription>,
    pub price: ProductPrice,
    pub discount_price: Option<ProductPrice>,
    pub status: bool,
    pub stock: StockCount,
    pub brand_id: Option<BrandId>,
    pub supplier_id: Option<SupplierId>,
    pub is_visible_brand: bool,
    pub is_visible_supplier: bool,
    pub delivery_time: i32,
    pub free_cargo_status: bool,
    pub preview_video: Option<StoredFileName>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl NewProduct {
    /// Maps an import record to an insertable product.
    ///
    /// Bulk import forces safe defaults: active status, all visibility and
    /// marketing flags off, brand/supplier unset, no video.
    pub fn from_import_record(record: &ImportRecord, slug: Slug, now: NaiveDateTime) -> Self {
        Self {
            name: record.title.clone(),
            slug,
            description: record.description.clone(),
            price: record.price,
            discount_price: record.discount_price,
            status: true,
            stock: record.stock,
            brand_id: None,
            supplier_id: None,
            is_visible_brand: false,
            is_visible_supplier: false,
            delivery_time: 0,
            free_cargo_status: false,
            preview_video: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Clones an existing product into an insertable copy under a new slug.
    pub fn replica_of(product: &Product, slug: Slug, now: NaiveDateTime) -> Self {
        Self {
            name: product.name.clone(),
            slug,
            description: product.description.clone(),
            price: product.price,
            discount_price: product.discount_price,
            status: product.status,
            stock: product.stock,
            brand_id: product.brand_id,
            supplier_id: product.supplier_id,
            is_visible_brand: product.is_visible_brand,
            is_visible_supplier: product.is_visible_supplier,
            delivery_time: product.delivery_time,
            free_cargo_status: product.free_cargo_status,
            preview_video: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Full-field update applied to an existing [`Product`].
///
/// `preview_video` is `Some` only when a replacement video was uploaded;
/// `None` leaves the stored file name untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductUpdate {
    pub name: ProductName,
    pub slug: Slug,
    pub description: Option<ProductDescription>,
    pub price: ProductPrice,
    pub discount_price: Option<ProductPrice>,
    pub status: bool,
    pub stock: StockCount,
    pub brand_id: Option<BrandId>,
    pub supplier_id: Option<SupplierId>,
    pub is_visible_brand: bool,
    pub is_visible_supplier: bool,
    pub delivery_time: i32,
    pub free_cargo_status: bool,
    pub preview_video: Option<StoredFileName>,
    pub updated_at: NaiveDateTime,
}
