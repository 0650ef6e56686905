//! Seed the product catalog from a YAML file.
//!
//! The file is a list of products in the same shape as the body of
//! `POST /api/products`:
//!
//! ```yaml
//! - name: Tapis de yoga
//!   description: Tapis antidérapant 6 mm
//!   price: "29.90"
//!   stock: 40
//!   category: Yoga
//!   image: https://images.example.com/tapis.jpg
//!   trendy: true
//! ```

use std::path::Path;

use fitsphere_api::db::ProductRepository;
use fitsphere_api::models::NewProduct;
use tracing::{error, info};

/// Insert every product from `file_path`.
///
/// The whole file is parsed and validated before anything is written.
///
/// # Errors
///
/// Returns an error if the file is missing or malformed, a product fails
/// validation, or the database rejects an insert.
pub async fn products(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading products from file");

    let content = tokio::fs::read_to_string(path).await?;
    let products: Vec<NewProduct> = serde_yaml::from_str(&content)?;

    info!(products = products.len(), "Parsed catalog");

    let errors: Vec<String> = products
        .iter()
        .filter_map(|p| p.validate().err().map(|e| format!("{}: {e}", p.name)))
        .collect();
    if !errors.is_empty() {
        error!("Catalog validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    let pool = super::connect().await?;
    let repo = ProductRepository::new(&pool);

    for product in &products {
        let created = repo.create(product).await?;
        info!(product_id = %created.id, name = %created.name, "Product inserted");
    }

    info!("Seeding complete! {} products inserted", products.len());
    Ok(())
}
