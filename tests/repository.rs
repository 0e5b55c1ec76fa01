use chrono::{Duration, Utc};

use pazar_catalog::domain::category::NewCategory;
use pazar_catalog::domain::image::NewProductImage;
use pazar_catalog::domain::product::{NewProduct, ProductUpdate};
use pazar_catalog::domain::types::{
    CategoryName, ProductName, ProductPrice, Slug, StockCount, StoredFileName,
};
use pazar_catalog::repository::{
    CategoryListQuery, CategoryReader, CategoryWriter, DieselRepository, ProductListQuery,
    ProductReader, ProductWriter,
};

mod common;

fn new_product(name: &str, slug: &str) -> NewProduct {
    let now = Utc::now().naive_utc();
    NewProduct {
        name: ProductName::new(name).expect("valid product name"),
        slug: Slug::new(slug).expect("valid slug"),
        description: None,
        price: ProductPrice::new(100.0).expect("valid price"),
        discount_price: None,
        status: true,
        stock: StockCount::new(5).expect("valid stock"),
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

fn new_category(name: &str, slug: &str, parent_id: Option<i32>) -> NewCategory {
    let now = Utc::now().naive_utc();
    NewCategory {
        parent_id: parent_id.map(|id| id.try_into().expect("valid category id")),
        name: CategoryName::new(name).expect("valid category name"),
        slug: Slug::new(slug).expect("valid slug"),
        position: 0,
        status: true,
        created_at: now,
        updated_at: now,
    }
}

fn image(file_name: &str, is_cover: bool) -> NewProductImage {
    NewProductImage {
        file_name: StoredFileName::new(file_name).expect("valid file name"),
        is_cover,
    }
}

#[test]
fn create_product_persists_images_and_links_together() {
    let test_db = common::TestDb::new();
    let repo = DieselRepository::new(test_db.pool());

    let category = repo
        .create_category(&new_category("Tablolar", "tablolar", None))
        .expect("should create category");

    let product = repo
        .create_product(
            &new_product("Kırmızı Kazak", "kirmizi-kazak"),
            &[image("a.jpg", true), image("b.jpg", false)],
            &[category.id],
        )
        .expect("should create product");

    assert_eq!(product.name.as_str(), "Kırmızı Kazak");
    assert!(!product.homepage_visible);
    assert_eq!(product.order_count, 0);

    let images = repo
        .list_product_images(product.id)
        .expect("should list images");
    assert_eq!(images.len(), 2);
    assert!(images[0].is_cover);
    assert_eq!(images[0].file_name.as_str(), "a.jpg");

    let categories = repo
        .list_product_categories(product.id)
        .expect("should list product categories");
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0].id, category.id);
}

#[test]
fn slug_probe_sees_existing_products() {
    let test_db = common::TestDb::new();
    let repo = DieselRepository::new(test_db.pool());

    repo.create_product(&new_product("Kırmızı Kazak", "kirmizi-kazak"), &[], &[])
        .expect("should create product");

    assert!(repo.slug_exists("kirmizi-kazak").expect("probe"));
    assert!(!repo.slug_exists("kirmizi-kazak-2").expect("probe"));

    let found = repo
        .get_product_by_slug(&Slug::new("kirmizi-kazak").unwrap())
        .expect("should query by slug");
    assert!(found.is_some());
}

#[test]
fn delete_product_cascades_to_images_and_links() {
    let test_db = common::TestDb::new();
    let repo = DieselRepository::new(test_db.pool());

    let category = repo
        .create_category(&new_category("Tablolar", "tablolar", None))
        .expect("should create category");
    let product = repo
        .create_product(
            &new_product("Tablo", "tablo"),
            &[image("a.jpg", true)],
            &[category.id],
        )
        .expect("should create product");

    let affected = repo.delete_product(product.id).expect("should delete");
    assert_eq!(affected, 1);

    assert!(
        repo.get_product_by_id(product.id)
            .expect("should query")
            .is_none()
    );
    assert!(
        repo.list_product_images(product.id)
            .expect("should list images")
            .is_empty()
    );
    assert!(
        repo.list_product_categories(product.id)
            .expect("should list categories")
            .is_empty()
    );
}

#[test]
fn update_product_replaces_category_links() {
    let test_db = common::TestDb::new();
    let repo = DieselRepository::new(test_db.pool());

    let first = repo
        .create_category(&new_category("Tablolar", "tablolar", None))
        .expect("category");
    let second = repo
        .create_category(&new_category("Çerçeveler", "cerceveler", None))
        .expect("category");

    let product = repo
        .create_product(&new_product("Tablo", "tablo"), &[], &[first.id])
        .expect("product");

    let update = ProductUpdate {
        name: ProductName::new("Tablo XL").unwrap(),
        slug: Slug::new("tablo-xl").unwrap(),
        description: None,
        price: ProductPrice::new(150.0).unwrap(),
        discount_price: Some(ProductPrice::new(120.0).unwrap()),
        status: true,
        stock: StockCount::new(2).unwrap(),
        brand_id: None,
        supplier_id: None,
        is_visible_brand: false,
        is_visible_supplier: false,
        delivery_time: 3,
        free_cargo_status: true,
        preview_video: None,
        updated_at: Utc::now().naive_utc(),
    };
    repo.update_product(product.id, &update, &[second.id])
        .expect("should update");

    let updated = repo
        .get_product_by_id(product.id)
        .expect("query")
        .expect("still present");
    assert_eq!(updated.name.as_str(), "Tablo XL");
    assert_eq!(updated.slug.as_str(), "tablo-xl");
    assert_eq!(updated.discount_price.unwrap().get(), 120.0);

    let categories = repo
        .list_product_categories(product.id)
        .expect("should list categories");
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0].id, second.id);
}

#[test]
fn list_products_paginates_newest_first() {
    let test_db = common::TestDb::new();
    let repo = DieselRepository::new(test_db.pool());

    let base = Utc::now().naive_utc();
    for i in 0..3i64 {
        let mut product = new_product(&format!("Tablo {i}"), &format!("tablo-{i}"));
        product.created_at = base - Duration::minutes(10 - i);
        product.updated_at = product.created_at;
        repo.create_product(&product, &[], &[]).expect("product");
    }

    let (total, page) = repo
        .list_products(ProductListQuery::default().paginate(1, 2))
        .expect("should list products");

    assert_eq!(total, 3);
    assert_eq!(page.len(), 2);
    // Newest row first.
    assert_eq!(page[0].name.as_str(), "Tablo 2");

    let (_, rest) = repo
        .list_products(ProductListQuery::default().paginate(2, 2))
        .expect("should list second page");
    assert_eq!(rest.len(), 1);
}

#[test]
fn list_products_filters_by_name_substring() {
    let test_db = common::TestDb::new();
    let repo = DieselRepository::new(test_db.pool());

    repo.create_product(&new_product("Kırmızı Kazak", "kirmizi-kazak"), &[], &[])
        .expect("product");
    repo.create_product(&new_product("Mavi Atkı", "mavi-atki"), &[], &[])
        .expect("product");

    let (total, products) = repo
        .list_products(ProductListQuery::default().search("Kazak"))
        .expect("should search");

    assert_eq!(total, 1);
    assert_eq!(products[0].slug.as_str(), "kirmizi-kazak");
}

#[test]
fn category_listing_filters_roots_and_children() {
    let test_db = common::TestDb::new();
    let repo = DieselRepository::new(test_db.pool());

    let root = repo
        .create_category(&new_category("Tablolar", "tablolar", None))
        .expect("category");
    let mut child = new_category("Yağlı Boya", "yagli-boya", Some(root.id.get()));
    child.position = 2;
    repo.create_category(&child).expect("category");
    let mut child2 = new_category("Sulu Boya", "sulu-boya", Some(root.id.get()));
    child2.position = 1;
    repo.create_category(&child2).expect("category");

    let (roots_total, roots) = repo
        .list_categories(CategoryListQuery::default().roots())
        .expect("should list roots");
    assert_eq!(roots_total, 1);
    assert_eq!(roots[0].id, root.id);

    let (children_total, children) = repo
        .list_categories(CategoryListQuery::default().children_of(root.id))
        .expect("should list children");
    assert_eq!(children_total, 2);
    // Ordered by display position.
    assert_eq!(children[0].slug.as_str(), "sulu-boya");
    assert_eq!(children[1].slug.as_str(), "yagli-boya");
}

#[test]
fn deleting_a_category_promotes_children_and_clears_links() {
    let test_db = common::TestDb::new();
    let repo = DieselRepository::new(test_db.pool());

    let root = repo
        .create_category(&new_category("Tablolar", "tablolar", None))
        .expect("category");
    let child = repo
        .create_category(&new_category(
            "Yağlı Boya",
            "yagli-boya",
            Some(root.id.get()),
        ))
        .expect("category");
    let grandchild = repo
        .create_category(&new_category("Manzara", "manzara", Some(child.id.get())))
        .expect("category");

    let product = repo
        .create_product(&new_product("Tablo", "tablo"), &[], &[child.id])
        .expect("product");

    repo.delete_category(child.id).expect("should delete");

    let promoted = repo
        .get_category_by_id(grandchild.id)
        .expect("query")
        .expect("still present");
    assert_eq!(promoted.parent_id, Some(root.id));

    assert!(
        repo.list_product_categories(product.id)
            .expect("should list categories")
            .is_empty()
    );
}
