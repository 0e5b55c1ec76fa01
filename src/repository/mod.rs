use crate::db::{DbConnection, DbPool};
use crate::domain::category::{Category, CategoryUpdate, NewCategory};
use crate::domain::image::{NewProductImage, ProductImage};
use crate::domain::product::{NewProduct, Product, ProductUpdate};
use crate::domain::types::{CategoryId, ImageId, ProductId, Slug};
use crate::pagination::Pagination;

pub mod category;
pub mod errors;
pub mod product;

pub use errors::{RepositoryError, RepositoryResult};

/// Repository implementation backed by Diesel and SQLite.
///
/// The underlying `r2d2::Pool` is cheap to clone, allowing the repository to
/// be passed around freely.
#[derive(Clone)]
pub struct DieselRepository {
    pool: DbPool,
}

impl DieselRepository {
    /// Create a new repository from an established database pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get a pooled database connection.
    fn conn(&self) -> RepositoryResult<DbConnection> {
        Ok(self.pool.get()?)
    }
}

/// Query parameters used when listing or searching products.
#[derive(Debug, Clone, Default)]
pub struct ProductListQuery {
    /// Name substring search.
    pub search: Option<String>,
    /// Restrict to products linked to a category.
    pub category_id: Option<CategoryId>,
    /// Pagination parameters.
    pub pagination: Option<Pagination>,
}

impl ProductListQuery {
    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }
    pub fn category(mut self, category_id: CategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }
    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}

/// Query parameters for listing categories.
#[derive(Debug, Clone, Default)]
pub struct CategoryListQuery {
    /// `Some(None)` lists roots, `Some(Some(id))` lists children of `id`,
    /// `None` lists the whole tree.
    pub parent_id: Option<Option<CategoryId>>,
    /// Pagination parameters.
    pub pagination: Option<Pagination>,
}

impl CategoryListQuery {
    pub fn roots(mut self) -> Self {
        self.parent_id = Some(None);
        self
    }
    pub fn children_of(mut self, parent_id: CategoryId) -> Self {
        self.parent_id = Some(Some(parent_id));
        self
    }
    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}

/// Read-only operations for product entities.
pub trait ProductReader {
    /// List products matching the supplied query parameters, newest first.
    fn list_products(&self, query: ProductListQuery) -> RepositoryResult<(usize, Vec<Product>)>;
    /// Retrieve a product by its identifier.
    fn get_product_by_id(&self, id: ProductId) -> RepositoryResult<Option<Product>>;
    /// Retrieve a product by its slug.
    fn get_product_by_slug(&self, slug: &Slug) -> RepositoryResult<Option<Product>>;
    /// Whether any product already holds the given slug.
    fn slug_exists(&self, slug: &str) -> RepositoryResult<bool>;
    /// List the image rows of a product, cover first.
    fn list_product_images(&self, product_id: ProductId) -> RepositoryResult<Vec<ProductImage>>;
    /// Retrieve a single image row.
    fn get_product_image(&self, id: ImageId) -> RepositoryResult<Option<ProductImage>>;
}

/// Write operations for product entities and their dependents.
pub trait ProductWriter {
    /// Insert a product, its image rows and its category links as one
    /// transactional unit.
    fn create_product(
        &self,
        product: &NewProduct,
        images: &[NewProductImage],
        categories: &[CategoryId],
    ) -> RepositoryResult<Product>;
    /// Apply a full-field update and replace the category links wholesale.
    fn update_product(
        &self,
        id: ProductId,
        update: &ProductUpdate,
        categories: &[CategoryId],
    ) -> RepositoryResult<usize>;
    /// Delete a product together with its image rows and category links.
    /// File cleanup is the caller's responsibility and must happen first.
    fn delete_product(&self, id: ProductId) -> RepositoryResult<usize>;
    /// Attach one image row to an existing product.
    fn add_product_image(
        &self,
        product_id: ProductId,
        image: &NewProductImage,
    ) -> RepositoryResult<usize>;
    /// Delete a single image row.
    fn delete_product_image(&self, id: ImageId) -> RepositoryResult<usize>;
    /// Flip the homepage visibility flag.
    fn set_homepage_visible(&self, id: ProductId, visible: bool) -> RepositoryResult<usize>;
}

/// Read-only operations for category entities.
pub trait CategoryReader {
    /// List categories using the supplied query options, ordered by
    /// position.
    fn list_categories(&self, query: CategoryListQuery)
    -> RepositoryResult<(usize, Vec<Category>)>;
    /// Retrieve a category by its identifier.
    fn get_category_by_id(&self, id: CategoryId) -> RepositoryResult<Option<Category>>;
    /// Retrieve a category by its slug.
    fn get_category_by_slug(&self, slug: &Slug) -> RepositoryResult<Option<Category>>;
    /// List the categories a product is linked to.
    fn list_product_categories(&self, product_id: ProductId) -> RepositoryResult<Vec<Category>>;
}

/// Write operations for category entities.
pub trait CategoryWriter {
    /// Persist a new category.
    fn create_category(&self, category: &NewCategory) -> RepositoryResult<Category>;
    /// Update a category in place.
    fn update_category(&self, id: CategoryId, update: &CategoryUpdate) -> RepositoryResult<usize>;
    /// Delete a category; children are promoted to the deleted node's
    /// parent and product links are removed, all in one transaction.
    fn delete_category(&self, id: CategoryId) -> RepositoryResult<usize>;
}
