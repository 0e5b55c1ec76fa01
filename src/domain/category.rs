use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{CategoryId, CategoryName, Slug};

/// A node of the category tree.
///
/// `parent_id` of `None` marks a root category. The tree must stay acyclic;
/// reparent operations are validated in the service layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub parent_id: Option<CategoryId>,
    pub name: CategoryName,
    pub slug: Slug,
    /// Display position among siblings.
    pub position: i32,
    pub status: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Data required to insert a new [`Category`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewCategory {
    pub parent_id: Option<CategoryId>,
    pub name: CategoryName,
    pub slug: Slug,
    pub position: i32,
    pub status: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Field update applied to an existing [`Category`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryUpdate {
    pub parent_id: Option<CategoryId>,
    pub name: CategoryName,
    pub slug: Slug,
    pub position: i32,
    pub status: bool,
    pub updated_at: NaiveDateTime,
}
