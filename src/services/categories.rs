use std::collections::{HashMap, HashSet};

use chrono::Utc;

use crate::domain::category::{Category, CategoryUpdate, NewCategory};
use crate::domain::slug;
use crate::domain::types::{CategoryId, CategoryName, Slug};
use crate::pagination::{DEFAULT_ITEMS_PER_PAGE, Paginated};
use crate::repository::{CategoryListQuery, CategoryReader, CategoryWriter, RepositoryResult};

use super::{ServiceError, ServiceResult};

/// Separator used when rendering a category's ancestor chain.
const FULL_NAME_SEPARATOR: &str = " / ";

/// Admin-entered fields for creating or updating a category.
#[derive(Debug, Clone)]
pub struct CategoryInput {
    pub parent_id: Option<CategoryId>,
    pub name: CategoryName,
    pub position: i32,
    pub status: bool,
}

fn unique_category_slug<R: CategoryReader>(
    repo: &R,
    name: &str,
    exclude: Option<CategoryId>,
) -> RepositoryResult<Slug> {
    let base = slug::slugify(name);

    let mut n = 1;
    loop {
        let candidate = Slug::new(slug::numbered(&base, n))?;
        let taken = repo
            .get_category_by_slug(&candidate)?
            .is_some_and(|other| exclude != Some(other.id));
        if !taken {
            return Ok(candidate);
        }
        n += 1;
    }
}

/// Core business logic for the root category listing.
pub fn list_root_categories<R: CategoryReader>(
    page: usize,
    repo: &R,
) -> ServiceResult<Paginated<Category>> {
    match repo.list_categories(
        CategoryListQuery::default()
            .roots()
            .paginate(page, DEFAULT_ITEMS_PER_PAGE),
    ) {
        Ok((total, categories)) => Ok(Paginated::new(
            categories,
            page,
            total.div_ceil(DEFAULT_ITEMS_PER_PAGE),
        )),
        Err(e) => {
            log::error!("Failed to list categories: {e}");
            Err(ServiceError::Internal)
        }
    }
}

/// Subcategories of one node, ordered by display position.
pub fn list_subcategories<R: CategoryReader>(
    parent_id: i32,
    page: usize,
    repo: &R,
) -> ServiceResult<Paginated<Category>> {
    let parent_id = CategoryId::new(parent_id).map_err(|_| ServiceError::NotFound)?;

    match repo.list_categories(
        CategoryListQuery::default()
            .children_of(parent_id)
            .paginate(page, DEFAULT_ITEMS_PER_PAGE),
    ) {
        Ok((total, categories)) => Ok(Paginated::new(
            categories,
            page,
            total.div_ceil(DEFAULT_ITEMS_PER_PAGE),
        )),
        Err(e) => {
            log::error!("Failed to list subcategories: {e}");
            Err(ServiceError::Internal)
        }
    }
}

/// Derived "Parent / Child / Grandchild" labels for every category, sorted
/// alphabetically. Used by selection lists in the admin forms.
pub fn category_full_names<R: CategoryReader>(
    repo: &R,
) -> ServiceResult<Vec<(CategoryId, String)>> {
    let categories = match repo.list_categories(CategoryListQuery::default()) {
        Ok((_total, categories)) => categories,
        Err(e) => {
            log::error!("Failed to list categories: {e}");
            return Err(ServiceError::Internal);
        }
    };

    let by_id: HashMap<CategoryId, &Category> = categories.iter().map(|c| (c.id, c)).collect();

    let mut names: Vec<(CategoryId, String)> = categories
        .iter()
        .map(|category| (category.id, full_name(category, &by_id)))
        .collect();
    names.sort_by(|a, b| a.1.cmp(&b.1));

    Ok(names)
}

/// Walk the ancestor chain of one category; a visited set guards against a
/// corrupted tree looping forever.
fn full_name(category: &Category, by_id: &HashMap<CategoryId, &Category>) -> String {
    let mut chain = vec![category.name.as_str().to_string()];
    let mut seen = HashSet::from([category.id]);

    let mut parent_id = category.parent_id;
    while let Some(id) = parent_id {
        let Some(parent) = by_id.get(&id) else { break };
        if !seen.insert(id) {
            log::error!("category tree contains a cycle at {id}");
            break;
        }
        chain.push(parent.name.as_str().to_string());
        parent_id = parent.parent_id;
    }

    chain.reverse();
    chain.join(FULL_NAME_SEPARATOR)
}

/// Create a category under an optional parent.
pub fn create_category<R>(input: CategoryInput, repo: &R) -> ServiceResult<Category>
where
    R: CategoryReader + CategoryWriter,
{
    if let Some(parent_id) = input.parent_id {
        match repo.get_category_by_id(parent_id) {
            Ok(Some(_)) => {}
            Ok(None) => return Err(ServiceError::NotFound),
            Err(e) => {
                log::error!("Failed to get parent category: {e}");
                return Err(ServiceError::Internal);
            }
        }
    }

    let slug = match unique_category_slug(repo, input.name.as_str(), None) {
        Ok(slug) => slug,
        Err(e) => {
            log::error!("Failed to derive category slug: {e}");
            return Err(ServiceError::Internal);
        }
    };

    let now = Utc::now().naive_utc();
    let category = NewCategory {
        parent_id: input.parent_id,
        name: input.name,
        slug,
        position: input.position,
        status: input.status,
        created_at: now,
        updated_at: now,
    };

    match repo.create_category(&category) {
        Ok(created) => Ok(created),
        Err(e) => {
            log::error!("Failed to create category: {e}");
            Err(ServiceError::Internal)
        }
    }
}

/// Update a category; moving it under its own descendant (or itself) is
/// rejected to keep the tree acyclic.
pub fn update_category<R>(category_id: i32, input: CategoryInput, repo: &R) -> ServiceResult<()>
where
    R: CategoryReader + CategoryWriter,
{
    let category_id = CategoryId::new(category_id).map_err(|_| ServiceError::NotFound)?;

    match repo.get_category_by_id(category_id) {
        Ok(Some(_)) => {}
        Ok(None) => return Err(ServiceError::NotFound),
        Err(e) => {
            log::error!("Failed to get category: {e}");
            return Err(ServiceError::Internal);
        }
    }

    if let Some(parent_id) = input.parent_id {
        reject_cycle(category_id, parent_id, repo)?;
    }

    let slug = match unique_category_slug(repo, input.name.as_str(), Some(category_id)) {
        Ok(slug) => slug,
        Err(e) => {
            log::error!("Failed to derive category slug: {e}");
            return Err(ServiceError::Internal);
        }
    };

    let update = CategoryUpdate {
        parent_id: input.parent_id,
        name: input.name,
        slug,
        position: input.position,
        status: input.status,
        updated_at: Utc::now().naive_utc(),
    };

    match repo.update_category(category_id, &update) {
        Ok(0) => Err(ServiceError::NotFound),
        Ok(_) => Ok(()),
        Err(e) => {
            log::error!("Failed to update category: {e}");
            Err(ServiceError::Internal)
        }
    }
}

/// Ensure `new_parent` is neither `category_id` itself nor one of its
/// descendants by walking up from the proposed parent.
fn reject_cycle<R: CategoryReader>(
    category_id: CategoryId,
    new_parent: CategoryId,
    repo: &R,
) -> ServiceResult<()> {
    let mut seen = HashSet::new();
    let mut cursor = Some(new_parent);

    while let Some(id) = cursor {
        if id == category_id {
            return Err(ServiceError::Validation(
                "category cannot be moved under itself or its descendants".to_string(),
            ));
        }
        if !seen.insert(id) {
            // Existing corruption; refuse to make it worse.
            return Err(ServiceError::Validation(
                "category tree contains a cycle".to_string(),
            ));
        }

        cursor = match repo.get_category_by_id(id) {
            Ok(Some(parent)) => parent.parent_id,
            Ok(None) => return Err(ServiceError::NotFound),
            Err(e) => {
                log::error!("Failed to get category: {e}");
                return Err(ServiceError::Internal);
            }
        };
    }

    Ok(())
}

/// Delete a category. Children are promoted to the deleted node's parent
/// and product links removed by the repository transaction.
pub fn delete_category<R>(category_id: i32, repo: &R) -> ServiceResult<()>
where
    R: CategoryReader + CategoryWriter,
{
    let category_id = CategoryId::new(category_id).map_err(|_| ServiceError::NotFound)?;

    match repo.delete_category(category_id) {
        Ok(0) => Err(ServiceError::NotFound),
        Ok(_) => Ok(()),
        Err(e) => {
            log::error!("Failed to delete category: {e}");
            Err(ServiceError::Internal)
        }
    }
}
