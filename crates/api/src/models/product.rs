//! Product catalog types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use fitsphere_core::{Category, ProductId};

/// Reasons a product payload is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProductValidationError {
    #[error("product name is required")]
    MissingName,
    #[error("product image is required")]
    MissingImage,
    #[error("price cannot be negative")]
    NegativePrice,
    #[error("price cannot exceed 99999999.99")]
    PriceTooLarge,
    #[error("price cannot have more than two decimal places")]
    PricePrecision,
    #[error("stock cannot be negative")]
    NegativeStock,
}

/// A catalog product.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i32,
    pub category: Category,
    pub image: String,
    pub trendy: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Product fields shown next to an order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub image: String,
}

/// Body of `POST /api/products`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub stock: i32,
    pub category: Category,
    pub image: String,
    #[serde(default)]
    pub trendy: bool,
}

impl NewProduct {
    /// Check required fields and numeric bounds.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ProductValidationError> {
        if self.name.trim().is_empty() {
            return Err(ProductValidationError::MissingName);
        }
        if self.image.trim().is_empty() {
            return Err(ProductValidationError::MissingImage);
        }
        check_bounds(Some(self.price), Some(self.stock))
    }
}

/// Body of `PUT /api/products/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub category: Option<Category>,
    pub image: Option<String>,
    pub trendy: Option<bool>,
}

impl ProductUpdate {
    /// Check the fields that were provided.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ProductValidationError> {
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(ProductValidationError::MissingName);
        }
        if self.image.as_deref().is_some_and(|i| i.trim().is_empty()) {
            return Err(ProductValidationError::MissingImage);
        }
        check_bounds(self.price, self.stock)
    }
}

/// Largest value the `NUMERIC(10,2)` price column holds.
const MAX_PRICE: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

fn check_bounds(price: Option<Decimal>, stock: Option<i32>) -> Result<(), ProductValidationError> {
    if let Some(price) = price {
        if price < Decimal::ZERO {
            return Err(ProductValidationError::NegativePrice);
        }
        if price > MAX_PRICE {
            return Err(ProductValidationError::PriceTooLarge);
        }
        if price.normalize().scale() > 2 {
            return Err(ProductValidationError::PricePrecision);
        }
    }
    if stock.is_some_and(|s| s < 0) {
        return Err(ProductValidationError::NegativeStock);
    }
    Ok(())
}

/// Query string of `GET /api/products`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ProductFilter {
    pub category: Option<Category>,
    pub trendy: Option<bool>,
}
