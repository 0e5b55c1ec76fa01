use chrono::Utc;

use crate::domain::category::Category;
use crate::domain::image::{NewProductImage, ProductImage};
use crate::domain::product::{NewProduct, Product, ProductUpdate};
use crate::domain::slug;
use crate::domain::types::{
    BrandId, CategoryId, ImageId, ProductDescription, ProductId, ProductName, ProductPrice, Slug,
    StockCount, StoredFileName, SupplierId,
};
use crate::feed::assets::AssetStore;
use crate::pagination::{DEFAULT_ITEMS_PER_PAGE, Paginated};
use crate::repository::{
    CategoryReader, ProductListQuery, ProductReader, ProductWriter, RepositoryResult,
};

use super::{ServiceError, ServiceResult};

/// Admin-entered fields for creating or updating a product.
#[derive(Debug, Clone)]
pub struct ProductInput {
    pub name: ProductName,
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
}

/// Bytes of an uploaded asset together with its client file name.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Pick a globally unique slug for `name`.
///
/// The base slug is derived deterministically; when it is already held by
/// another product the smallest free numeric suffix (starting at `-2`) is
/// appended, so identical names never overwrite each other.
pub(crate) fn unique_slug<R: ProductReader>(
    repo: &R,
    name: &str,
    exclude: Option<ProductId>,
) -> RepositoryResult<Slug> {
    let base = slug::slugify(name);

    let mut n = 1;
    loop {
        let candidate = Slug::new(slug::numbered(&base, n))?;
        let taken = match exclude {
            None => repo.slug_exists(candidate.as_str())?,
            Some(id) => repo
                .get_product_by_slug(&candidate)?
                .is_some_and(|other| other.id != id),
        };
        if !taken {
            return Ok(candidate);
        }
        n += 1;
    }
}

/// Core business logic for the product index page.
pub fn list_products<R: ProductReader>(page: usize, repo: &R) -> ServiceResult<Paginated<Product>> {
    match repo.list_products(ProductListQuery::default().paginate(page, DEFAULT_ITEMS_PER_PAGE)) {
        Ok((total, products)) => Ok(Paginated::new(
            products,
            page,
            total.div_ceil(DEFAULT_ITEMS_PER_PAGE),
        )),
        Err(e) => {
            log::error!("Failed to list products: {e}");
            Err(ServiceError::Internal)
        }
    }
}

/// Name-substring product search, newest first.
pub fn search_products<R: ProductReader>(
    keyword: &str,
    page: usize,
    repo: &R,
) -> ServiceResult<Paginated<Product>> {
    match repo.list_products(
        ProductListQuery::default()
            .search(keyword)
            .paginate(page, DEFAULT_ITEMS_PER_PAGE),
    ) {
        Ok((total, products)) => Ok(Paginated::new(
            products,
            page,
            total.div_ceil(DEFAULT_ITEMS_PER_PAGE),
        )),
        Err(e) => {
            log::error!("Failed to search products: {e}");
            Err(ServiceError::Internal)
        }
    }
}

/// Fetch one product together with its images and category links.
pub fn show_product<R>(
    product_id: i32,
    repo: &R,
) -> ServiceResult<(Product, Vec<ProductImage>, Vec<Category>)>
where
    R: ProductReader + CategoryReader,
{
    let product_id = ProductId::new(product_id).map_err(|_| ServiceError::NotFound)?;

    let product = match repo.get_product_by_id(product_id) {
        Ok(Some(product)) => product,
        Ok(None) => return Err(ServiceError::NotFound),
        Err(e) => {
            log::error!("Failed to get product: {e}");
            return Err(ServiceError::Internal);
        }
    };

    let images = match repo.list_product_images(product_id) {
        Ok(images) => images,
        Err(e) => {
            log::error!("Failed to list product images: {e}");
            return Err(ServiceError::Internal);
        }
    };

    let categories = match repo.list_product_categories(product_id) {
        Ok(categories) => categories,
        Err(e) => {
            log::error!("Failed to list product categories: {e}");
            return Err(ServiceError::Internal);
        }
    };

    Ok((product, images, categories))
}

/// Create a product with its uploaded images, preview video and category
/// links.
///
/// The row, links and slug are committed as one transactional unit; image
/// files are stored afterwards under the new product's directory and a
/// failed image is logged without aborting the others.
pub fn create_product<R>(
    input: ProductInput,
    images: Vec<UploadedFile>,
    preview_video: Option<UploadedFile>,
    category_ids: Vec<CategoryId>,
    repo: &R,
    assets: &AssetStore,
) -> ServiceResult<Product>
where
    R: ProductReader + ProductWriter,
{
    let slug = match unique_slug(repo, input.name.as_str(), None) {
        Ok(slug) => slug,
        Err(e) => {
            log::error!("Failed to derive product slug: {e}");
            return Err(ServiceError::Internal);
        }
    };

    let video_name = match &preview_video {
        Some(upload) => match assets.store_video(&upload.file_name, &upload.bytes) {
            Ok(name) => Some(name),
            Err(e) => {
                log::error!("Failed to store preview video: {e}");
                return Err(ServiceError::Internal);
            }
        },
        None => None,
    };

    let now = Utc::now().naive_utc();
    let new_product = NewProduct {
        name: input.name,
        slug,
        description: input.description,
        price: input.price,
        discount_price: input.discount_price,
        status: input.status,
        stock: input.stock,
        brand_id: input.brand_id,
        supplier_id: input.supplier_id,
        is_visible_brand: input.is_visible_brand,
        is_visible_supplier: input.is_visible_supplier,
        delivery_time: input.delivery_time,
        free_cargo_status: input.free_cargo_status,
        preview_video: video_name.clone(),
        created_at: now,
        updated_at: now,
    };

    let product = match repo.create_product(&new_product, &[], &category_ids) {
        Ok(product) => product,
        Err(e) => {
            log::error!("Failed to create product: {e}");
            // Compensate for the already-stored video file.
            if let Some(name) = &video_name {
                assets.remove_video(name.as_str());
            }
            return Err(ServiceError::Internal);
        }
    };

    attach_uploaded_images(product.id, &images, true, repo, assets);

    Ok(product)
}

/// Apply a full-field update, replace category links and append any newly
/// uploaded images.
pub fn update_product<R>(
    product_id: i32,
    input: ProductInput,
    images: Vec<UploadedFile>,
    preview_video: Option<UploadedFile>,
    category_ids: Vec<CategoryId>,
    repo: &R,
    assets: &AssetStore,
) -> ServiceResult<()>
where
    R: ProductReader + ProductWriter,
{
    let product_id = ProductId::new(product_id).map_err(|_| ServiceError::NotFound)?;

    let product = match repo.get_product_by_id(product_id) {
        Ok(Some(product)) => product,
        Ok(None) => return Err(ServiceError::NotFound),
        Err(e) => {
            log::error!("Failed to get product: {e}");
            return Err(ServiceError::Internal);
        }
    };

    let slug = match unique_slug(repo, input.name.as_str(), Some(product_id)) {
        Ok(slug) => slug,
        Err(e) => {
            log::error!("Failed to derive product slug: {e}");
            return Err(ServiceError::Internal);
        }
    };

    let video_name = match &preview_video {
        Some(upload) => match assets.store_video(&upload.file_name, &upload.bytes) {
            Ok(name) => {
                // The replaced file is gone from the row; a missing file is
                // logged, not an error.
                if let Some(old) = &product.preview_video {
                    assets.remove_video(old.as_str());
                }
                Some(name)
            }
            Err(e) => {
                log::error!("Failed to store preview video: {e}");
                return Err(ServiceError::Internal);
            }
        },
        None => None,
    };

    let update = ProductUpdate {
        name: input.name,
        slug,
        description: input.description,
        price: input.price,
        discount_price: input.discount_price,
        status: input.status,
        stock: input.stock,
        brand_id: input.brand_id,
        supplier_id: input.supplier_id,
        is_visible_brand: input.is_visible_brand,
        is_visible_supplier: input.is_visible_supplier,
        delivery_time: input.delivery_time,
        free_cargo_status: input.free_cargo_status,
        preview_video: video_name,
        updated_at: Utc::now().naive_utc(),
    };

    match repo.update_product(product_id, &update, &category_ids) {
        Ok(0) => return Err(ServiceError::NotFound),
        Ok(_) => {}
        Err(e) => {
            log::error!("Failed to update product: {e}");
            return Err(ServiceError::Internal);
        }
    }

    // Only promote an upload to cover when the product has no images yet.
    let first_is_cover = matches!(
        repo.list_product_images(product_id).as_deref(),
        Ok([]) | Err(_)
    );
    attach_uploaded_images(product_id, &images, first_is_cover, repo, assets);

    Ok(())
}

/// Delete a product, its image files and rows, links and preview video.
///
/// Files are removed first (forgiving, logged), then the rows disappear in
/// one transaction.
pub fn delete_product<R>(product_id: i32, repo: &R, assets: &AssetStore) -> ServiceResult<()>
where
    R: ProductReader + ProductWriter,
{
    let product_id = ProductId::new(product_id).map_err(|_| ServiceError::NotFound)?;

    let product = match repo.get_product_by_id(product_id) {
        Ok(Some(product)) => product,
        Ok(None) => return Err(ServiceError::NotFound),
        Err(e) => {
            log::error!("Failed to get product: {e}");
            return Err(ServiceError::Internal);
        }
    };

    let images = match repo.list_product_images(product_id) {
        Ok(images) => images,
        Err(e) => {
            log::error!("Failed to list product images: {e}");
            return Err(ServiceError::Internal);
        }
    };

    for image in &images {
        assets.remove_image(product_id, image.file_name.as_str());
    }
    if let Some(video) = &product.preview_video {
        assets.remove_video(video.as_str());
    }

    match repo.delete_product(product_id) {
        Ok(0) => Err(ServiceError::NotFound),
        Ok(_) => Ok(()),
        Err(e) => {
            log::error!("Failed to delete product: {e}");
            Err(ServiceError::Internal)
        }
    }
}

/// Remove one product image, file first, then the row.
pub fn delete_product_image<R>(image_id: i32, repo: &R, assets: &AssetStore) -> ServiceResult<()>
where
    R: ProductReader + ProductWriter,
{
    let image_id = ImageId::new(image_id).map_err(|_| ServiceError::NotFound)?;

    let image = match repo.get_product_image(image_id) {
        Ok(Some(image)) => image,
        Ok(None) => return Err(ServiceError::NotFound),
        Err(e) => {
            log::error!("Failed to get product image: {e}");
            return Err(ServiceError::Internal);
        }
    };

    assets.remove_image(image.product_id, image.file_name.as_str());

    match repo.delete_product_image(image_id) {
        Ok(_) => Ok(()),
        Err(e) => {
            log::error!("Failed to delete product image: {e}");
            Err(ServiceError::Internal)
        }
    }
}

/// Clone a product together with its image rows and files under a newly
/// disambiguated slug. Category links are not copied.
pub fn replicate_product<R>(product_id: i32, repo: &R, assets: &AssetStore) -> ServiceResult<Product>
where
    R: ProductReader + ProductWriter,
{
    let product_id = ProductId::new(product_id).map_err(|_| ServiceError::NotFound)?;

    let source = match repo.get_product_by_id(product_id) {
        Ok(Some(product)) => product,
        Ok(None) => return Err(ServiceError::NotFound),
        Err(e) => {
            log::error!("Failed to get product: {e}");
            return Err(ServiceError::Internal);
        }
    };

    let images = match repo.list_product_images(product_id) {
        Ok(images) => images,
        Err(e) => {
            log::error!("Failed to list product images: {e}");
            return Err(ServiceError::Internal);
        }
    };

    let slug = match unique_slug(repo, source.name.as_str(), None) {
        Ok(slug) => slug,
        Err(e) => {
            log::error!("Failed to derive product slug: {e}");
            return Err(ServiceError::Internal);
        }
    };

    let new_product = NewProduct::replica_of(&source, slug, Utc::now().naive_utc());
    let image_rows: Vec<NewProductImage> = images
        .iter()
        .map(|image| NewProductImage {
            file_name: image.file_name.clone(),
            is_cover: image.is_cover,
        })
        .collect();

    let clone = match repo.create_product(&new_product, &image_rows, &[]) {
        Ok(product) => product,
        Err(e) => {
            log::error!("Failed to replicate product: {e}");
            return Err(ServiceError::Internal);
        }
    };

    for image in &images {
        if let Err(e) = assets.copy_image(source.id, clone.id, image.file_name.as_str()) {
            log::error!("Failed to copy image for replicated product: {e}");
        }
    }

    Ok(clone)
}

/// Flip the homepage visibility flag; returns the new value.
pub fn toggle_homepage_visible<R>(product_id: i32, repo: &R) -> ServiceResult<bool>
where
    R: ProductReader + ProductWriter,
{
    let product_id = ProductId::new(product_id).map_err(|_| ServiceError::NotFound)?;

    let product = match repo.get_product_by_id(product_id) {
        Ok(Some(product)) => product,
        Ok(None) => return Err(ServiceError::NotFound),
        Err(e) => {
            log::error!("Failed to get product: {e}");
            return Err(ServiceError::Internal);
        }
    };

    let visible = !product.homepage_visible;
    match repo.set_homepage_visible(product_id, visible) {
        Ok(_) => Ok(visible),
        Err(e) => {
            log::error!("Failed to toggle homepage visibility: {e}");
            Err(ServiceError::Internal)
        }
    }
}

/// Store uploaded image files and attach one row per stored file. Failures
/// are logged and the remaining images continue.
fn attach_uploaded_images<R>(
    product_id: ProductId,
    images: &[UploadedFile],
    first_is_cover: bool,
    repo: &R,
    assets: &AssetStore,
) where
    R: ProductWriter,
{
    for (position, upload) in images.iter().enumerate() {
        let stored: StoredFileName =
            match assets.store_image(product_id, &upload.file_name, &upload.bytes) {
                Ok(name) => name,
                Err(e) => {
                    log::error!("Failed to store product image: {e}");
                    continue;
                }
            };

        let image = NewProductImage {
            file_name: stored,
            is_cover: first_is_cover && position == 0,
        };
        if let Err(e) = repo.add_product_image(product_id, &image) {
            log::error!("Failed to record product image: {e}");
        }
    }
}
