//! Product catalog records.

use serde::{Deserialize, Serialize};

use crate::ids::ProductId;

/// Default image shown when a product has none of its own.
pub const PLACEHOLDER_IMAGE_URL: &str = "https://via.placeholder.com/400x300?text=Product+Image";

/// Catalog category a product belongs to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductCategory {
    /// Consumer electronics.
    Electronics,
    /// Clothing and accessories.
    Fashion,
    /// Home and living.
    Home,
    /// Beauty and personal care.
    Beauty,
    /// Sports and outdoor.
    Sports,
    /// Everything else.
    #[default]
    Other,
}

impl std::fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Electronics => write!(f, "Electronics"),
            Self::Fashion => write!(f, "Fashion"),
            Self::Home => write!(f, "Home"),
            Self::Beauty => write!(f, "Beauty"),
            Self::Sports => write!(f, "Sports"),
            Self::Other => write!(f, "Other"),
        }
    }
}

impl std::str::FromStr for ProductCategory {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Electronics" => Ok(Self::Electronics),
            "Fashion" => Ok(Self::Fashion),
            "Home" => Ok(Self::Home),
            "Beauty" => Ok(Self::Beauty),
            "Sports" => Ok(Self::Sports),
            "Other" => Ok(Self::Other),
            other => Err(format!("unknown product category: {other}")),
        }
    }
}

/// A catalog product record.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Display name (≤ 100 chars).
    pub name: String,
    /// Display description (≤ 1000 chars).
    pub description: String,
    /// Price in the shop currency, never negative.
    pub price: f64,
    /// Image URL; falls back to [`PLACEHOLDER_IMAGE_URL`].
    pub image_url: String,
    /// Units in stock, never negative.
    pub stock: i64,
    /// Catalog category.
    pub category: ProductCategory,
    /// Whether the product is visible in the shop.
    pub is_active: bool,
    /// Row creation timestamp (RFC 3339).
    pub created_at: String,
    /// Last row update timestamp (RFC 3339).
    pub updated_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_display_roundtrip() {
        for category in [
            ProductCategory::Electronics,
            ProductCategory::Fashion,
            ProductCategory::Home,
            ProductCategory::Beauty,
            ProductCategory::Sports,
            ProductCategory::Other,
        ] {
            let parsed: ProductCategory = category.to_string().parse().unwrap();
            assert_eq!(parsed, category);
        }
    }

    #[test]
    fn category_rejects_unknown() {
        let result: Result<ProductCategory, _> = "Toys".parse();
        assert!(result.is_err());
    }

    #[test]
    fn category_default_is_other() {
        assert_eq!(ProductCategory::default(), ProductCategory::Other);
    }

    #[test]
    fn product_serializes_camel_case() {
        let product = Product {
            id: ProductId::from_raw("prod_1"),
            name: "Desk lamp".into(),
            description: "Warm light".into(),
            price: 29.99,
            image_url: PLACEHOLDER_IMAGE_URL.into(),
            stock: 12,
            category: ProductCategory::Home,
            is_active: true,
            created_at: "2026-08-01T00:00:00Z".into(),
            updated_at: "2026-08-01T00:00:00Z".into(),
        };
        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["imageUrl"], PLACEHOLDER_IMAGE_URL);
        assert_eq!(json["isActive"], true);
        assert_eq!(json["category"], "Home");
        assert_eq!(json["createdAt"], "2026-08-01T00:00:00Z");
    }
}
