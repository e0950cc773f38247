//! Product catalog CRUD.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};
use vitrine_core::{ProductCategory, ProductId};
use vitrine_store::{NewProduct, ProductFilter};

use crate::error::ApiError;
use crate::server::AppState;
use crate::validation::{
    MAX_PRODUCT_DESCRIPTION_LENGTH, MAX_PRODUCT_NAME_LENGTH, require_bounded,
    require_non_negative, require_non_negative_count,
};

/// Query parameters for `GET /api/products`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListQuery {
    /// Filter by visibility.
    pub is_active: Option<bool>,
    /// Filter by category name.
    pub category: Option<String>,
    /// Substring search over name and description.
    pub search: Option<String>,
}

/// Request body for creating or replacing a product.
///
/// Fields are optional at the serde layer so missing values produce the
/// envelope's validation messages rather than a bare deserialization error.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductBody {
    /// Display name.
    pub name: Option<String>,
    /// Display description.
    pub description: Option<String>,
    /// Price.
    pub price: Option<f64>,
    /// Image URL.
    pub image_url: Option<String>,
    /// Units in stock (default 0).
    pub stock: Option<i64>,
    /// Category name (default `Other`).
    pub category: Option<String>,
    /// Visibility (default true).
    pub is_active: Option<bool>,
}

fn validate(body: ProductBody) -> Result<NewProduct, ApiError> {
    let name = body
        .name
        .ok_or_else(|| ApiError::Validation("Product name is required".into()))?;
    require_bounded(&name, "Product name", MAX_PRODUCT_NAME_LENGTH)?;

    let description = body
        .description
        .ok_or_else(|| ApiError::Validation("Product description is required".into()))?;
    require_bounded(
        &description,
        "Product description",
        MAX_PRODUCT_DESCRIPTION_LENGTH,
    )?;

    let price = body
        .price
        .ok_or_else(|| ApiError::Validation("Product price is required".into()))?;
    require_non_negative(price, "Price")?;

    let stock = body.stock.unwrap_or(0);
    require_non_negative_count(stock, "Stock")?;

    let category = match body.category {
        Some(raw) => parse_category(&raw)?,
        None => ProductCategory::default(),
    };

    Ok(NewProduct {
        name,
        description,
        price,
        image_url: body.image_url,
        stock,
        category,
        is_active: body.is_active.unwrap_or(true),
    })
}

fn parse_category(raw: &str) -> Result<ProductCategory, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::Validation("Invalid category value".into()))
}

/// `GET /api/products`
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<Value>, ApiError> {
    let category = query.category.as_deref().map(parse_category).transpose()?;
    let filter = ProductFilter {
        is_active: query.is_active,
        category,
        search: query.search,
    };
    let products = state.store.list_products(&filter)?;
    Ok(Json(json!({
        "success": true,
        "count": products.len(),
        "data": products,
    })))
}

/// `GET /api/products/{id}`
pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let product = state
        .store
        .product(&ProductId::from_raw(id))?
        .ok_or_else(|| ApiError::NotFound("Product not found".into()))?;
    Ok(Json(json!({"success": true, "data": product})))
}

/// `POST /api/products`
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<ProductBody>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let new = validate(body)?;
    let product = state.store.create_product(&new)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Product created successfully",
            "data": product,
        })),
    ))
}

/// `PUT /api/products/{id}`
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ProductBody>,
) -> Result<Json<Value>, ApiError> {
    let new = validate(body)?;
    let product = state.store.update_product(&ProductId::from_raw(id), &new)?;
    Ok(Json(json!({
        "success": true,
        "message": "Product updated successfully",
        "data": product,
    })))
}

/// `DELETE /api/products/{id}`
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.store.delete_product(&ProductId::from_raw(id))?;
    Ok(Json(json!({
        "success": true,
        "message": "Product deleted successfully",
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(
        name: Option<&str>,
        description: Option<&str>,
        price: Option<f64>,
    ) -> ProductBody {
        ProductBody {
            name: name.map(Into::into),
            description: description.map(Into::into),
            price,
            image_url: None,
            stock: None,
            category: None,
            is_active: None,
        }
    }

    #[test]
    fn validate_fills_defaults() {
        let new = validate(body(Some("Lamp"), Some("Warm light"), Some(10.0))).unwrap();
        assert_eq!(new.stock, 0);
        assert_eq!(new.category, ProductCategory::Other);
        assert!(new.is_active);
    }

    #[test]
    fn validate_requires_name() {
        let err = validate(body(None, Some("d"), Some(1.0))).unwrap_err();
        assert_eq!(err.to_string(), "Product name is required");
    }

    #[test]
    fn validate_requires_price() {
        let err = validate(body(Some("Lamp"), Some("d"), None)).unwrap_err();
        assert_eq!(err.to_string(), "Product price is required");
    }

    #[test]
    fn validate_rejects_negative_price() {
        let err = validate(body(Some("Lamp"), Some("d"), Some(-1.0))).unwrap_err();
        assert_eq!(err.to_string(), "Price cannot be negative");
    }

    #[test]
    fn validate_rejects_long_name() {
        let long = "x".repeat(MAX_PRODUCT_NAME_LENGTH + 1);
        let err = validate(body(Some(&long), Some("d"), Some(1.0))).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Product name cannot exceed 100 characters"
        );
    }

    #[test]
    fn validate_rejects_bad_category() {
        let mut b = body(Some("Lamp"), Some("d"), Some(1.0));
        b.category = Some("Toys".into());
        let err = validate(b).unwrap_err();
        assert_eq!(err.to_string(), "Invalid category value");
    }

    #[test]
    fn validate_accepts_known_category() {
        let mut b = body(Some("Lamp"), Some("d"), Some(1.0));
        b.category = Some("Beauty".into());
        let new = validate(b).unwrap();
        assert_eq!(new.category, ProductCategory::Beauty);
    }
}
