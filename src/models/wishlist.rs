use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A saved-for-later product. No quantity: presence is a boolean per product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WishlistItem {
    pub product_id: Uuid,
    pub name: String,
    pub unit_price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// A shopper's wishlist, unique by product id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Wishlist {
    items: Vec<WishlistItem>,
}

impl Wishlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an item unless the product is already saved.
    pub fn add_item(&mut self, item: WishlistItem) {
        if !self.contains(item.product_id) {
            self.items.push(item);
        }
    }

    pub fn remove_item(&mut self, product_id: Uuid) {
        self.items.retain(|i| i.product_id != product_id);
    }

    pub fn contains(&self, product_id: Uuid) -> bool {
        self.items.iter().any(|i| i.product_id == product_id)
    }

    /// Add if absent, remove if present. Returns `true` when the item ended
    /// up saved. Read-then-write is fine here: the list is single-shopper
    /// session state.
    pub fn toggle(&mut self, item: WishlistItem) -> bool {
        if self.contains(item.product_id) {
            self.remove_item(item.product_id);
            false
        } else {
            self.add_item(item);
            true
        }
    }

    pub fn items(&self) -> &[WishlistItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
