use crate::{
    db::DbPool,
    entities::product::{self, Entity as ProductEntity, Model as ProductModel},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

/// Input for creating a catalog product
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductInput {
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub price: Decimal,
    pub image_url: Option<String>,
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
}

fn default_in_stock() -> bool {
    true
}

/// Input for updating a catalog product; absent fields are left untouched
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<Decimal>,
    pub image_url: Option<String>,
    pub in_stock: Option<bool>,
}

/// Catalog service for product reads and writes.
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl CatalogService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Lists products, optionally filtered by category and limited in count.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        category: Option<String>,
        limit: Option<u64>,
    ) -> Result<Vec<ProductModel>, ServiceError> {
        let mut query = ProductEntity::find().order_by_asc(product::Column::Name);

        if let Some(category) = category {
            query = query.filter(product::Column::Category.eq(category));
        }
        if let Some(limit) = limit {
            query = query.limit(limit);
        }

        Ok(query.all(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, id: Uuid) -> Result<ProductModel, ServiceError> {
        ProductEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_product(
        &self,
        input: CreateProductInput,
    ) -> Result<ProductModel, ServiceError> {
        let now = Utc::now();
        let id = Uuid::new_v4();

        let model = product::ActiveModel {
            id: Set(id),
            name: Set(input.name),
            description: Set(input.description),
            category: Set(input.category),
            price: Set(input.price),
            image_url: Set(input.image_url),
            in_stock: Set(input.in_stock),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = model.insert(&*self.db).await?;

        info!(product_id = %id, "product created");
        self.event_sender
            .send_or_log(Event::ProductCreated(id))
            .await;

        Ok(created)
    }

    #[instrument(skip(self, input))]
    pub async fn update_product(
        &self,
        id: Uuid,
        input: UpdateProductInput,
    ) -> Result<ProductModel, ServiceError> {
        let existing = ProductEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))?;

        let mut model: product::ActiveModel = existing.into();
        if let Some(name) = input.name {
            model.name = Set(name);
        }
        if let Some(description) = input.description {
            model.description = Set(Some(description));
        }
        if let Some(category) = input.category {
            model.category = Set(category);
        }
        if let Some(price) = input.price {
            model.price = Set(price);
        }
        if let Some(image_url) = input.image_url {
            model.image_url = Set(Some(image_url));
        }
        if let Some(in_stock) = input.in_stock {
            model.in_stock = Set(in_stock);
        }
        model.updated_at = Set(Utc::now());

        let updated = model.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ProductUpdated(id))
            .await;

        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = ProductEntity::delete_by_id(id).exec(&*self.db).await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("Product {} not found", id)));
        }

        info!(product_id = %id, "product deleted");
        self.event_sender
            .send_or_log(Event::ProductDeleted(id))
            .await;

        Ok(())
    }
}
