use serde::{Deserialize, Serialize};

use crate::domain::types::{ImageId, ProductId, StoredFileName};

/// A stored product image row.
///
/// The lifecycle is strictly nested inside the owning product: deleting the
/// product removes its image rows and files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductImage {
    pub id: ImageId,
    pub product_id: ProductId,
    /// File name under `<image_root>/<product_id>/`.
    pub file_name: StoredFileName,
    /// Whether this image is the primary display image.
    pub is_cover: bool,
}

/// Image row to attach to a product; the owning product id is supplied by
/// the repository call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewProductImage {
    pub file_name: StoredFileName,
    pub is_cover: bool,
}
