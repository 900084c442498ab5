use crate::{
    db::DbPool,
    entities::{
        order::{self, Entity as OrderEntity, Model as OrderModel},
        order_item::{self, Entity as OrderItemEntity, Model as OrderItemModel},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    models::{
        address::ShippingAddress,
        cart::CartItem,
        payment::{PaymentDetails, PaymentMethod, PaymentStatus},
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

/// The in-memory order payload assembled by the checkout orchestrator prior
/// to persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDraft {
    pub user_id: String,
    pub user_email: String,
    pub items: Vec<CartItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub payment_details: Option<PaymentDetails>,
    pub currency: String,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    /// Client-generated token deduplicating resubmitted checkout attempts
    pub idempotency_key: Option<String>,
}

impl OrderDraft {
    /// Defensive re-check of what the orchestrator already validated.
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.items.is_empty() {
            return Err(ServiceError::EmptyCart);
        }
        self.shipping_address.ensure_valid_for_order()
    }
}

/// Identifier pair returned once an order document has been appended.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderConfirmation {
    pub order_id: Uuid,
    pub order_number: String,
}

/// Persistence contract the checkout orchestrator depends on.
#[async_trait]
pub trait OrderWriter: Send + Sync {
    async fn create_order(&self, draft: OrderDraft) -> Result<OrderConfirmation, ServiceError>;
}

/// Full order view for the read endpoints.
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: String,
    pub user_email: String,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub payment_details: Option<serde_json::Value>,
    pub shipping_address: serde_json::Value,
    pub currency: String,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItemModel>,
}

/// Service persisting orders through sea-orm.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl OrderService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    async fn find_by_idempotency_key(
        &self,
        key: &str,
    ) -> Result<Option<OrderModel>, ServiceError> {
        OrderEntity::find()
            .filter(order::Column::IdempotencyKey.eq(key))
            .one(&*self.db)
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// Retrieves an order with its items.
    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<OrderResponse, ServiceError> {
        let order = OrderEntity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let items = order.find_related(OrderItemEntity).all(&*self.db).await?;

        Ok(Self::model_to_response(order, items))
    }

    /// Lists orders, newest first, with pagination.
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<OrderResponse>, u64), ServiceError> {
        let paginator = OrderEntity::find()
            .order_by_desc(order::Column::CreatedAt)
            .paginate(&*self.db, per_page.max(1));

        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page.saturating_sub(1)).await?;

        let responses = orders
            .into_iter()
            .map(|o| Self::model_to_response(o, Vec::new()))
            .collect();

        Ok((responses, total))
    }

    fn model_to_response(model: OrderModel, items: Vec<OrderItemModel>) -> OrderResponse {
        OrderResponse {
            id: model.id,
            order_number: model.order_number,
            user_id: model.user_id,
            user_email: model.user_email,
            payment_method: model.payment_method,
            payment_status: model.payment_status,
            payment_details: model.payment_details,
            shipping_address: model.shipping_address,
            currency: model.currency,
            subtotal: model.subtotal,
            tax: model.tax,
            total: model.total,
            created_at: model.created_at,
            updated_at: model.updated_at,
            items,
        }
    }
}

#[async_trait]
impl OrderWriter for OrderService {
    /// Appends one order document plus its line rows in a single
    /// transaction. Never mutates an existing order.
    #[instrument(skip(self, draft), fields(user_id = %draft.user_id, method = ?draft.payment_method))]
    async fn create_order(&self, draft: OrderDraft) -> Result<OrderConfirmation, ServiceError> {
        draft.validate()?;

        if let Some(key) = draft.idempotency_key.as_deref() {
            if let Some(existing) = self.find_by_idempotency_key(key).await? {
                info!(order_id = %existing.id, "returning existing order for idempotency key");
                return Ok(OrderConfirmation {
                    order_id: existing.id,
                    order_number: existing.order_number,
                });
            }
        }

        let now = Utc::now();
        let order_id = Uuid::new_v4();
        let order_number = format!("ORD-{}", order_id.to_string()[..8].to_uppercase());

        let txn = self.db.begin().await.map_err(|e| {
            error!(error = %e, "failed to start transaction for order creation");
            ServiceError::DatabaseError(e)
        })?;

        let order_model = order::ActiveModel {
            id: Set(order_id),
            order_number: Set(order_number.clone()),
            user_id: Set(draft.user_id.clone()),
            user_email: Set(draft.user_email.clone()),
            payment_method: Set(draft.payment_method),
            payment_status: Set(draft.payment_status),
            payment_details: Set(draft
                .payment_details
                .as_ref()
                .and_then(|d| serde_json::to_value(d).ok())),
            shipping_address: Set(serde_json::to_value(&draft.shipping_address)?),
            currency: Set(draft.currency.clone()),
            subtotal: Set(draft.subtotal),
            tax: Set(draft.tax),
            total: Set(draft.total),
            idempotency_key: Set(draft.idempotency_key.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        order_model.insert(&txn).await?;

        for item in &draft.items {
            let row = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(item.product_id),
                name: Set(item.name.clone()),
                image: Set(item.image.clone()),
                color: Set(item.color.clone()),
                size: Set(item.size.clone()),
                quantity: Set(item.quantity as i32),
                unit_price: Set(item.unit_price),
                line_total: Set(item.line_total()),
                created_at: Set(now),
            };
            row.insert(&txn).await?;
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "failed to commit order creation");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id = %order_id, order_number = %order_number, "order created");

        self.event_sender
            .send_or_log(Event::OrderCreated(order_id))
            .await;

        Ok(OrderConfirmation {
            order_id,
            order_number,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    fn draft_with_items(items: Vec<CartItem>) -> OrderDraft {
        OrderDraft {
            user_id: "shopper-1".into(),
            user_email: "shopper@example.com".into(),
            items,
            shipping_address: ShippingAddress {
                name: "Asha Verma".into(),
                email: None,
                phone: "9876543210".into(),
                line1: "14 Lakeview Road".into(),
                city: None,
                state: None,
                postal_code: None,
            },
            payment_method: PaymentMethod::Cod,
            payment_status: PaymentStatus::Pending,
            payment_details: None,
            currency: "INR".into(),
            subtotal: dec!(1749),
            tax: dec!(315),
            total: dec!(2064),
            idempotency_key: None,
        }
    }

    fn one_item() -> CartItem {
        CartItem {
            product_id: Uuid::from_u128(1),
            name: "Oversized Tee".into(),
            image: None,
            unit_price: dec!(1749),
            color: None,
            size: Some("M".into()),
            quantity: 1,
        }
    }

    #[test]
    fn draft_with_no_items_fails_validation() {
        assert_matches!(
            draft_with_items(vec![]).validate(),
            Err(ServiceError::EmptyCart)
        );
    }

    #[test]
    fn draft_with_blank_address_fails_validation() {
        let mut draft = draft_with_items(vec![one_item()]);
        draft.shipping_address.line1 = String::new();
        assert_matches!(draft.validate(), Err(ServiceError::InvalidAddress(_)));
    }

    #[test]
    fn complete_draft_passes_validation() {
        assert!(draft_with_items(vec![one_item()]).validate().is_ok());
    }
}
