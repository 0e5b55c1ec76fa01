use diesel::prelude::*;

use crate::domain::category::{Category, CategoryUpdate, NewCategory};
use crate::domain::types::{CategoryId, ProductId, Slug};
use crate::models::category::{
    Category as DbCategory, CategoryChangeset, NewCategory as DbNewCategory,
};
use crate::repository::{
    CategoryListQuery, CategoryReader, CategoryWriter, DieselRepository, RepositoryResult,
};

impl CategoryReader for DieselRepository {
    fn list_categories(
        &self,
        query: CategoryListQuery,
    ) -> RepositoryResult<(usize, Vec<Category>)> {
        use crate::schema::categories;

        let mut conn = self.conn()?;

        let query_builder = || {
            let mut items = categories::table.into_boxed::<diesel::sqlite::Sqlite>();

            match query.parent_id {
                Some(None) => items = items.filter(categories::parent_id.is_null()),
                Some(Some(parent_id)) => {
                    items = items.filter(categories::parent_id.eq(parent_id.get()));
                }
                None => {}
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
            .order(categories::position.asc())
            .load::<DbCategory>(&mut conn)?
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<Category>, _>>()?;

        Ok((total, items))
    }

    fn get_category_by_id(&self, id: CategoryId) -> RepositoryResult<Option<Category>> {
        use crate::schema::categories;

        let mut conn = self.conn()?;

        let category = categories::table
            .filter(categories::id.eq(id.get()))
            .first::<DbCategory>(&mut conn)
            .optional()?;

        Ok(category.map(TryInto::try_into).transpose()?)
    }

    fn get_category_by_slug(&self, slug: &Slug) -> RepositoryResult<Option<Category>> {
        use crate::schema::categories;

        let mut conn = self.conn()?;

        let category = categories::table
            .filter(categories::slug.eq(slug.as_str()))
            .first::<DbCategory>(&mut conn)
            .optional()?;

        Ok(category.map(TryInto::try_into).transpose()?)
    }

    fn list_product_categories(&self, product_id: ProductId) -> RepositoryResult<Vec<Category>> {
        use crate::schema::{categories, product_categories};

        let mut conn = self.conn()?;

        let items = categories::table
            .filter(
                categories::id.eq_any(
                    product_categories::table
                        .filter(product_categories::product_id.eq(product_id.get()))
                        .select(product_categories::category_id),
                ),
            )
            .order(categories::position.asc())
            .load::<DbCategory>(&mut conn)?
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<Category>, _>>()?;

        Ok(items)
    }
}

impl CategoryWriter for DieselRepository {
    fn create_category(&self, category: &NewCategory) -> RepositoryResult<Category> {
        use crate::schema::categories;

        let mut conn = self.conn()?;
        let db_category: DbNewCategory = category.clone().into();

        let created: DbCategory = diesel::insert_into(categories::table)
            .values(db_category)
            .get_result(&mut conn)?;

        Ok(created.try_into()?)
    }

    fn update_category(&self, id: CategoryId, update: &CategoryUpdate) -> RepositoryResult<usize> {
        use crate::schema::categories;

        let mut conn = self.conn()?;
        let changeset: CategoryChangeset = update.into();

        let affected = diesel::update(categories::table.filter(categories::id.eq(id.get())))
            .set(changeset)
            .execute(&mut conn)?;

        Ok(affected)
    }

    fn delete_category(&self, id: CategoryId) -> RepositoryResult<usize> {
        use crate::schema::{categories, product_categories};

        let mut conn = self.conn()?;

        let affected = conn.transaction(|conn| {
            let parent: Option<Option<i32>> = categories::table
                .filter(categories::id.eq(id.get()))
                .select(categories::parent_id)
                .first(conn)
                .optional()?;

            let Some(parent_id) = parent else {
                return Ok(0);
            };

            // Promote children before the node disappears.
            diesel::update(categories::table.filter(categories::parent_id.eq(id.get())))
                .set(categories::parent_id.eq(parent_id))
                .execute(conn)?;

            diesel::delete(
                product_categories::table.filter(product_categories::category_id.eq(id.get())),
            )
            .execute(conn)?;

            diesel::delete(categories::table.filter(categories::id.eq(id.get()))).execute(conn)
        })?;

        Ok(affected)
    }
}
