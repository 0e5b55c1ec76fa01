use diesel::prelude::*;

use crate::domain::image::{NewProductImage, ProductImage};
use crate::domain::product::{NewProduct, Product, ProductUpdate};
use crate::domain::types::{CategoryId, ImageId, ProductId, Slug};
use crate::models::product::{
    NewProduct as DbNewProduct, Product as DbProduct, ProductChangeset,
};
use crate::models::product_image::ProductImage as DbProductImage;
use crate::repository::{
    DieselRepository, ProductListQuery, ProductReader, ProductWriter, RepositoryResult,
};

impl ProductReader for DieselRepository {
    fn list_products(&self, query: ProductListQuery) -> RepositoryResult<(usize, Vec<Product>)> {
        use crate::schema::{product_categories, products};

        let mut conn = self.conn()?;

        let query_builder = || {
            let mut items = products::table.into_boxed::<diesel::sqlite::Sqlite>();

            if let Some(search) = &query.search {
                items = items.filter(products::name.like(format!("%{search}%")));
            }

            if let Some(category_id) = query.category_id {
                items = items.filter(
                    products::id.eq_any(
                        product_categories::table
                            .filter(product_categories::category_id.eq(category_id.get()))
                            .select(product_categories::product_id),
                    ),
                );
            }

            items
        };

        let total = query_builder().count().get_result::<i64>(&mut conn)? as usize;

        let mut items = query_builder();

        if let Some(pagination) = &query.pagination {
            let offset = ((pagination.page.max(1) - 1) * pagination.per_page) as i64;
            let limit = pagination.per_page as i64;
            items = items.offset(offset).limit(limit);
        }

        let items = items
            .order(products::created_at.desc())
            .load::<DbProduct>(&mut conn)?
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<Product>, _>>()?;

        Ok((total, items))
    }

    fn get_product_by_id(&self, id: ProductId) -> RepositoryResult<Option<Product>> {
        use crate::schema::products;

        let mut conn = self.conn()?;

        let product = products::table
            .filter(products::id.eq(id.get()))
            .first::<DbProduct>(&mut conn)
            .optional()?;

        Ok(product.map(TryInto::try_into).transpose()?)
    }

    fn get_product_by_slug(&self, slug: &Slug) -> RepositoryResult<Option<Product>> {
        use crate::schema::products;

        let mut conn = self.conn()?;

        let product = products::table
            .filter(products::slug.eq(slug.as_str()))
            .first::<DbProduct>(&mut conn)
            .optional()?;

        Ok(product.map(TryInto::try_into).transpose()?)
    }

    fn slug_exists(&self, slug: &str) -> RepositoryResult<bool> {
        use crate::schema::products;

        let mut conn = self.conn()?;

        let count: i64 = products::table
            .filter(products::slug.eq(slug))
            .count()
            .get_result(&mut conn)?;

        Ok(count > 0)
    }

    fn list_product_images(&self, product_id: ProductId) -> RepositoryResult<Vec<ProductImage>> {
        use crate::schema::product_images;

        let mut conn = self.conn()?;

        let images = product_images::table
            .filter(product_images::product_id.eq(product_id.get()))
            .order((product_images::is_cover.desc(), product_images::id.asc()))
            .load::<DbProductImage>(&mut conn)?
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<ProductImage>, _>>()?;

        Ok(images)
    }

    fn get_product_image(&self, id: ImageId) -> RepositoryResult<Option<ProductImage>> {
        use crate::schema::product_images;

        let mut conn = self.conn()?;

        let image = product_images::table
            .filter(product_images::id.eq(id.get()))
            .first::<DbProductImage>(&mut conn)
            .optional()?;

        Ok(image.map(TryInto::try_into).transpose()?)
    }
}

impl ProductWriter for DieselRepository {
    fn create_product(
        &self,
        product: &NewProduct,
        images: &[NewProductImage],
        categories: &[CategoryId],
    ) -> RepositoryResult<Product> {
        use crate::schema::{product_categories, product_images, products};

        let mut conn = self.conn()?;
        let db_product: DbNewProduct = product.clone().into();

        let created = conn.transaction(|conn| {
            let created: DbProduct = diesel::insert_into(products::table)
                .values(db_product)
                .get_result(conn)?;

            for image in images {
                diesel::insert_into(product_images::table)
                    .values((
                        product_images::product_id.eq(created.id),
                        product_images::file_name.eq(image.file_name.as_str()),
                        product_images::is_cover.eq(image.is_cover),
                    ))
                    .execute(conn)?;
            }

            for category_id in categories {
                diesel::insert_into(product_categories::table)
                    .values((
                        product_categories::product_id.eq(created.id),
                        product_categories::category_id.eq(category_id.get()),
                    ))
                    .execute(conn)?;
            }

            Ok::<_, diesel::result::Error>(created)
        })?;

        Ok(created.try_into()?)
    }

    fn update_product(
        &self,
        id: ProductId,
        update: &ProductUpdate,
        categories: &[CategoryId],
    ) -> RepositoryResult<usize> {
        use crate::schema::{product_categories, products};

        let mut conn = self.conn()?;
        let changeset: ProductChangeset = update.into();

        let affected = conn.transaction(|conn| {
            let target = products::table.filter(products::id.eq(id.get()));

            let affected = match &update.preview_video {
                Some(video) => diesel::update(target)
                    .set((changeset, products::preview_video.eq(video.as_str())))
                    .execute(conn)?,
                None => diesel::update(target).set(changeset).execute(conn)?,
            };

            diesel::delete(
                product_categories::table.filter(product_categories::product_id.eq(id.get())),
            )
            .execute(conn)?;

            for category_id in categories {
                diesel::insert_into(product_categories::table)
                    .values((
                        product_categories::product_id.eq(id.get()),
                        product_categories::category_id.eq(category_id.get()),
                    ))
                    .execute(conn)?;
            }

            Ok::<_, diesel::result::Error>(affected)
        })?;

        Ok(affected)
    }

    fn delete_product(&self, id: ProductId) -> RepositoryResult<usize> {
        use crate::schema::{product_categories, product_images, products};

        let mut conn = self.conn()?;

        let affected = conn.transaction(|conn| {
            diesel::delete(
                product_images::table.filter(product_images::product_id.eq(id.get())),
            )
            .execute(conn)?;

            diesel::delete(
                product_categories::table.filter(product_categories::product_id.eq(id.get())),
            )
            .execute(conn)?;

            diesel::delete(products::table.filter(products::id.eq(id.get()))).execute(conn)
        })?;

        Ok(affected)
    }

    fn add_product_image(
        &self,
        product_id: ProductId,
        image: &NewProductImage,
    ) -> RepositoryResult<usize> {
        use crate::schema::product_images;

        let mut conn = self.conn()?;

        let affected = diesel::insert_into(product_images::table)
            .values((
                product_images::product_id.eq(product_id.get()),
                product_images::file_name.eq(image.file_name.as_str()),
                product_images::is_cover.eq(image.is_cover),
            ))
            .execute(&mut conn)?;

        Ok(affected)
    }

    fn delete_product_image(&self, id: ImageId) -> RepositoryResult<usize> {
        use crate::schema::product_images;

        let mut conn = self.conn()?;

        let affected =
            diesel::delete(product_images::table.filter(product_images::id.eq(id.get())))
                .execute(&mut conn)?;

        Ok(affected)
    }

    fn set_homepage_visible(&self, id: ProductId, visible: bool) -> RepositoryResult<usize> {
        use crate::schema::products;

        let mut conn = self.conn()?;

        let affected = diesel::update(products::table.filter(products::id.eq(id.get())))
            .set(products::homepage_visible.eq(visible))
            .execute(&mut conn)?;

        Ok(affected)
    }
}
