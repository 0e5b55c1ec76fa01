use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::category::{
    Category as DomainCategory, CategoryUpdate, NewCategory as DomainNewCategory,
};
use crate::domain::types::{CategoryName, Slug, TypeConstraintError};

/// Diesel model representing the `categories` table.
#[derive(Debug, Clone, Identifiable, Queryable)]
#[diesel(table_name = crate::schema::categories)]
pub struct Category {
    pub id: i32,
    pub parent_id: Option<i32>,
    pub name: String,
    pub slug: String,
    pub position: i32,
    pub status: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Insertable form of [`Category`].
#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::categories)]
pub struct NewCategory {
    pub parent_id: Option<i32>,
    pub name: String,
    pub slug: String,
    pub position: i32,
    pub status: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Changeset form of [`Category`].
#[derive(Debug, AsChangeset)]
#[diesel(table_name = crate::schema::categories)]
pub struct CategoryChangeset {
    pub parent_id: Option<Option<i32>>,
    pub name: String,
    pub slug: String,
    pub position: i32,
    pub status: bool,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<Category> for DomainCategory {
    type Error = TypeConstraintError;

    fn try_from(category: Category) -> Result<Self, Self::Error> {
        Ok(Self {
            id: category.id.try_into()?,
            parent_id: category.parent_id.map(TryInto::try_into).transpose()?,
            name: CategoryName::new(category.name)?,
            slug: Slug::new(category.slug)?,
            position: category.position,
            status: category.status,
            created_at: category.created_at,
            updated_at: category.updated_at,
        })
    }
}

impl From<DomainNewCategory> for NewCategory {
    fn from(category: DomainNewCategory) -> Self {
        Self {
            parent_id: category.parent_id.map(Into::into),
            name: category.name.into_inner(),
            slug: category.slug.into_inner(),
            position: category.position,
            status: category.status,
            created_at: category.created_at,
            updated_at: category.updated_at,
        }
    }
}

impl From<&CategoryUpdate> for CategoryChangeset {
    fn from(update: &CategoryUpdate) -> Self {
        Self {
            parent_id: Some(update.parent_id.map(Into::into)),
            name: update.name.as_str().to_string(),
            slug: update.slug.as_str().to_string(),
            position: update.position,
            status: update.status,
            updated_at: update.updated_at,
        }
    }
}
