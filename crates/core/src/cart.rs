//! Shopping cart.
//!
//! A cart is an ordered list of lines, at most one per product. Adding a
//! product that is already in the cart bumps the existing line's quantity;
//! the price captured when the line was first added is kept.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::ProductId;

/// Errors from cart operations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// Quantities start at 1.
    #[error("quantity must be at least 1")]
    ZeroQuantity,
    /// The product is not in the cart.
    #[error("product {0} is not in the cart")]
    ItemNotFound(ProductId),
}

/// One cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: ProductId,
    /// Product name at the time it was added, for display.
    pub name: String,
    pub image: Option<String>,
    pub quantity: u32,
    /// Unit price snapshot.
    pub price: Decimal,
}

impl CartItem {
    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// A shopping cart.
///
/// ```
/// use fitsphere_core::{Cart, CartItem, ProductId};
/// use rust_decimal::Decimal;
///
/// let mat = CartItem {
///     product_id: ProductId::new(1),
///     name: "Yoga mat".to_owned(),
///     image: None,
///     quantity: 1,
///     price: Decimal::new(2999, 2),
/// };
///
/// let mut cart = Cart::default();
/// cart.add(mat.clone()).unwrap();
/// cart.add(mat).unwrap();
///
/// assert_eq!(cart.items().len(), 1);
/// assert_eq!(cart.item_count(), 2);
/// assert_eq!(cart.total(), Decimal::new(5998, 2));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Add a line, merging with an existing line for the same product.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ZeroQuantity` if `item.quantity` is 0.
    pub fn add(&mut self, item: CartItem) -> Result<(), CartError> {
        if item.quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }

        match self.find_mut(item.product_id) {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(item.quantity);
            }
            None => self.items.push(item),
        }

        Ok(())
    }

    /// Replace the quantity of an existing line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ZeroQuantity` for 0 (use [`Cart::remove`] instead)
    /// and `CartError::ItemNotFound` if the product is not in the cart.
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }

        let item = self
            .find_mut(product_id)
            .ok_or(CartError::ItemNotFound(product_id))?;
        item.quantity = quantity;
        Ok(())
    }

    /// Remove the line for a product. Returns whether a line was removed.
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.product_id != product_id);
        self.items.len() != before
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0_u32, |acc, item| acc.saturating_add(item.quantity))
    }

    /// Sum of line totals.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }

    fn find_mut(&mut self, product_id: ProductId) -> Option<&mut CartItem> {
        self.items
            .iter_mut()
            .find(|item| item.product_id == product_id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(id: i32, quantity: u32, cents: i64) -> CartItem {
        CartItem {
            product_id: ProductId::new(id),
            name: format!("product-{id}"),
            image: Some(format!("https://img.example.com/{id}.jpg")),
            quantity,
            price: Decimal::new(cents, 2),
        }
    }

    #[test]
    fn test_add_new_product_appends() {
        let mut cart = Cart::default();
        cart.add(item(1, 1, 1000)).unwrap();
        cart.add(item(2, 3, 250)).unwrap();

        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.item_count(), 4);
        assert_eq!(cart.total(), Decimal::new(1750, 2));
    }

    #[test]
    fn test_add_existing_product_merges() {
        let mut cart = Cart::default();
        cart.add(item(1, 1, 1000)).unwrap();
        cart.add(item(2, 1, 500)).unwrap();
        cart.add(item(1, 2, 1000)).unwrap();

        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.items()[0].product_id, ProductId::new(1));
        assert_eq!(cart.items()[0].quantity, 3);
    }

    #[test]
    fn test_merge_keeps_first_price() {
        let mut cart = Cart::default();
        cart.add(item(1, 1, 1000)).unwrap();
        cart.add(item(1, 1, 1200)).unwrap();

        assert_eq!(cart.items()[0].price, Decimal::new(1000, 2));
        assert_eq!(cart.total(), Decimal::new(2000, 2));
    }

    #[test]
    fn test_add_zero_quantity_rejected() {
        let mut cart = Cart::default();
        assert_eq!(cart.add(item(1, 0, 1000)), Err(CartError::ZeroQuantity));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity() {
        let mut cart = Cart::default();
        cart.add(item(1, 1, 1000)).unwrap();

        cart.set_quantity(ProductId::new(1), 5).unwrap();
        assert_eq!(cart.item_count(), 5);

        assert_eq!(
            cart.set_quantity(ProductId::new(1), 0),
            Err(CartError::ZeroQuantity)
        );
        assert_eq!(cart.item_count(), 5);

        assert_eq!(
            cart.set_quantity(ProductId::new(9), 2),
            Err(CartError::ItemNotFound(ProductId::new(9)))
        );
    }

    #[test]
    fn test_remove_and_clear() {
        let mut cart = Cart::default();
        cart.add(item(1, 1, 1000)).unwrap();
        cart.add(item(2, 1, 1000)).unwrap();

        assert!(cart.remove(ProductId::new(1)));
        assert!(!cart.remove(ProductId::new(1)));
        assert_eq!(cart.items().len(), 1);

        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Decimal::ZERO);
    }

    #[test]
    fn test_serializes_as_array() {
        let mut cart = Cart::default();
        cart.add(item(4, 2, 1999)).unwrap();

        let json = serde_json::to_value(&cart).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["productId"], 4);
        assert_eq!(json[0]["quantity"], 2);
        assert_eq!(json[0]["price"], "19.99");
    }
}
