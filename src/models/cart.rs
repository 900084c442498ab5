use crate::errors::ServiceError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// The attribute tuple that decides whether two cart rows are "the same"
/// line item. Merging, quantity updates and removal all use this key, so a
/// shopper operating on one variant of a product never touches the others.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct VariantKey {
    pub product_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

/// One selected line in a shopper's cart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CartItem {
    pub product_id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub unit_price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    pub quantity: u32,
}

impl CartItem {
    pub fn key(&self) -> VariantKey {
        VariantKey {
            product_id: self.product_id,
            color: self.color.clone(),
            size: self.size.clone(),
        }
    }

    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// A shopper's cart: an explicitly constructed state container, private to
/// one session. The subtotal is always derived from the item list and never
/// stored, so it cannot drift.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an item, merging with an existing row that shares the variant
    /// key. Invariant: no two rows ever share a key.
    pub fn add_item(&mut self, item: CartItem) {
        let key = item.key();
        if let Some(existing) = self.items.iter_mut().find(|i| i.key() == key) {
            existing.quantity += item.quantity;
        } else {
            self.items.push(item);
        }
    }

    /// Removes the row with the given variant key, if present.
    pub fn remove_item(&mut self, key: &VariantKey) {
        self.items.retain(|i| &i.key() != key);
    }

    /// Overwrites the quantity of the row with the given variant key.
    ///
    /// Quantities below one are rejected; removal is an explicit operation,
    /// not a side effect of a zero write.
    pub fn update_quantity(&mut self, key: &VariantKey, quantity: i64) -> Result<(), ServiceError> {
        if quantity < 1 {
            return Err(ServiceError::InvalidQuantity(quantity));
        }

        let item = self
            .items
            .iter_mut()
            .find(|i| &i.key() == key)
            .ok_or_else(|| {
                ServiceError::NotFound(format!("No cart item for product {}", key.product_id))
            })?;

        item.quantity = quantity as u32;
        Ok(())
    }

    /// Empties the cart. Called exactly once, as the final step of a
    /// successful checkout.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of `unit_price * quantity` over all rows, recomputed on demand.
    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}
