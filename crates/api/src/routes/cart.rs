//! Cart route handlers.
//!
//! The cart lives in the visitor's session, so it works without an account.
//! Prices are captured from the catalog when a product is first added;
//! checkout re-prices everything anyway.

use axum::{Json, extract::State};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use fitsphere_core::{Cart, CartItem, ProductId};

use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::extract::{AppJson, AppPath};
use crate::models::session_keys;
use crate::state::AppState;

/// Cart as returned to the client.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub total: Decimal,
    pub count: u32,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart.items().to_vec(),
            total: cart.total(),
            count: cart.item_count(),
        }
    }
}

/// Body of `POST /api/cart/items`.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

const fn default_quantity() -> u32 {
    1
}

/// Body of `PATCH /api/cart/items/{productId}`.
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i64,
}

// =============================================================================
// Session Helpers
// =============================================================================

async fn load_cart(session: &Session) -> Result<Cart> {
    session
        .get::<Cart>(session_keys::CART)
        .await
        .map(Option::unwrap_or_default)
        .map_err(|e| AppError::Internal(format!("failed to read cart session: {e}")))
}

async fn save_cart(session: &Session, cart: &Cart) -> Result<()> {
    session
        .insert(session_keys::CART, cart)
        .await
        .map_err(|e| AppError::Internal(format!("failed to write cart session: {e}")))
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /api/cart
pub async fn show(session: Session) -> Result<Json<CartView>> {
    let cart = load_cart(&session).await?;
    Ok(Json(CartView::from(&cart)))
}

/// Add a product, merging with an existing line.
///
/// POST /api/cart/items
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    AppJson(body): AppJson<AddItemRequest>,
) -> Result<Json<CartView>> {
    let product = ProductRepository::new(state.pool())
        .get_by_id(body.product)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    let mut cart = load_cart(&session).await?;
    cart.add(CartItem {
        product_id: product.id,
        name: product.name,
        image: Some(product.image),
        quantity: body.quantity,
        price: product.price,
    })?;
    save_cart(&session, &cart).await?;

    Ok(Json(CartView::from(&cart)))
}

/// Set a line's quantity. Quantities below 1 leave the cart unchanged.
///
/// PATCH /api/cart/items/{productId}
pub async fn update(
    session: Session,
    AppPath(product_id): AppPath<ProductId>,
    AppJson(body): AppJson<UpdateItemRequest>,
) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await?;

    if let Some(quantity) = u32::try_from(body.quantity).ok().filter(|q| *q >= 1) {
        cart.set_quantity(product_id, quantity)?;
        save_cart(&session, &cart).await?;
    }

    Ok(Json(CartView::from(&cart)))
}

/// DELETE /api/cart/items/{productId}
pub async fn remove(
    session: Session,
    AppPath(product_id): AppPath<ProductId>,
) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await?;
    if cart.remove(product_id) {
        save_cart(&session, &cart).await?;
    }
    Ok(Json(CartView::from(&cart)))
}

/// DELETE /api/cart
pub async fn clear(session: Session) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await?;
    cart.clear();
    save_cart(&session, &cart).await?;
    Ok(Json(CartView::from(&cart)))
}
