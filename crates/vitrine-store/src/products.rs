//! Product repository — catalog CRUD with listing filters.

use chrono::Utc;
use rusqlite::{Connection, params};
use tracing::instrument;
use vitrine_core::product::PLACEHOLDER_IMAGE_URL;
use vitrine_core::{Product, ProductCategory, ProductId};

use crate::error::Result;
use crate::row;

/// Input for creating or replacing a product.
#[derive(Clone, Debug)]
pub struct NewProduct {
    /// Display name.
    pub name: String,
    /// Display description.
    pub description: String,
    /// Price, never negative.
    pub price: f64,
    /// Image URL; placeholder when absent.
    pub image_url: Option<String>,
    /// Units in stock.
    pub stock: i64,
    /// Catalog category.
    pub category: ProductCategory,
    /// Whether the product is visible in the shop.
    pub is_active: bool,
}

/// Filters for listing products.
#[derive(Clone, Debug, Default)]
pub struct ProductFilter {
    /// Only active (or only inactive) products.
    pub is_active: Option<bool>,
    /// Only products in this category.
    pub category: Option<ProductCategory>,
    /// Substring match over name and description.
    pub search: Option<String>,
}

const PRODUCT_COLUMNS: &str =
    "id, name, description, price, image_url, stock, category, is_active, created_at, updated_at";

/// Product repository — stateless, every method takes `&Connection`.
pub struct ProductRepo;

impl ProductRepo {
    /// Create a new product.
    #[instrument(skip_all, fields(name = %new.name))]
    pub fn create(conn: &Connection, new: &NewProduct) -> Result<Product> {
        let id = ProductId::new();
        let now = Utc::now().to_rfc3339();
        let image_url = new
            .image_url
            .clone()
            .unwrap_or_else(|| PLACEHOLDER_IMAGE_URL.to_owned());

        let _ = conn.execute(
            "INSERT INTO products (id, name, description, price, image_url, stock, category, is_active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                id.as_str(),
                new.name,
                new.description,
                new.price,
                image_url,
                new.stock,
                new.category.to_string(),
                new.is_active,
                now,
                now,
            ],
        )?;

        Ok(Product {
            id,
            name: new.name.clone(),
            description: new.description.clone(),
            price: new.price,
            image_url,
            stock: new.stock,
            category: new.category,
            is_active: new.is_active,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Get a product by ID.
    pub fn get(conn: &Connection, id: &ProductId) -> Result<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query([id.as_str()])?;
        match rows.next()? {
            Some(r) => Ok(Some(map_product(r)?)),
            None => Ok(None),
        }
    }

    /// Fetch products by ID, preserving the given order and skipping
    /// references that no longer resolve.
    pub fn get_many(conn: &Connection, ids: &[ProductId]) -> Result<Vec<Product>> {
        let mut results = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(product) = Self::get(conn, id)? {
                results.push(product);
            }
        }
        Ok(results)
    }

    /// List products, newest first, applying the given filters.
    pub fn list(conn: &Connection, filter: &ProductFilter) -> Result<Vec<Product>> {
        use std::fmt::Write;

        let mut sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE 1=1");
        let mut args: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(is_active) = filter.is_active {
            let _ = write!(sql, " AND is_active = ?{}", args.len() + 1);
            args.push(Box::new(is_active));
        }
        if let Some(category) = filter.category {
            let _ = write!(sql, " AND category = ?{}", args.len() + 1);
            args.push(Box::new(category.to_string()));
        }
        if let Some(search) = &filter.search {
            let pattern = format!("%{}%", row::escape_like(search));
            let _ = write!(
                sql,
                " AND (name LIKE ?{n} ESCAPE '\\' OR description LIKE ?{n} ESCAPE '\\')",
                n = args.len() + 1
            );
            args.push(Box::new(pattern));
        }
        sql.push_str(" ORDER BY created_at DESC");

        let mut stmt = conn.prepare(&sql)?;
        let args_refs: Vec<&dyn rusqlite::types::ToSql> =
            args.iter().map(Box::as_ref).collect();
        let mut rows = stmt.query(args_refs.as_slice())?;
        let mut results = Vec::new();
        while let Some(r) = rows.next()? {
            results.push(map_product(r)?);
        }
        Ok(results)
    }

    /// Replace a product's fields. Returns the updated record, or `None`
    /// if the product does not exist.
    #[instrument(skip_all, fields(product_id = %id))]
    pub fn update(conn: &Connection, id: &ProductId, new: &NewProduct) -> Result<Option<Product>> {
        let now = Utc::now().to_rfc3339();
        let image_url = new
            .image_url
            .clone()
            .unwrap_or_else(|| PLACEHOLDER_IMAGE_URL.to_owned());
        let changed = conn.execute(
            "UPDATE products SET name = ?2, description = ?3, price = ?4, image_url = ?5,
                                 stock = ?6, category = ?7, is_active = ?8, updated_at = ?9
             WHERE id = ?1",
            params![
                id.as_str(),
                new.name,
                new.description,
                new.price,
                image_url,
                new.stock,
                new.category.to_string(),
                new.is_active,
                now,
            ],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        Self::get(conn, id)
    }

    /// Delete a product.
    pub fn delete(conn: &Connection, id: &ProductId) -> Result<bool> {
        let changed = conn.execute("DELETE FROM products WHERE id = ?1", [id.as_str()])?;
        Ok(changed > 0)
    }
}

fn map_product(r: &rusqlite::Row<'_>) -> Result<Product> {
    let category_raw: String = row::get(r, 6, "products", "category")?;
    Ok(Product {
        id: ProductId::from_raw(row::get::<String>(r, 0, "products", "id")?),
        name: row::get(r, 1, "products", "name")?,
        description: row::get(r, 2, "products", "description")?,
        price: row::get(r, 3, "products", "price")?,
        image_url: row::get(r, 4, "products", "image_url")?,
        stock: row::get(r, 5, "products", "stock")?,
        category: row::parse_enum(&category_raw, "products", "category")?,
        is_active: row::get(r, 7, "products", "is_active")?,
        created_at: row::get(r, 8, "products", "created_at")?,
        updated_at: row::get(r, 9, "products", "updated_at")?,
    })
}
