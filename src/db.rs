// src/db.rs
mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

use crate::config::{Config, StoreBackend};
use crate::models::{Stock, StockPatch, User};
use async_trait::async_trait;
use log::info;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Duplicate {field}: {value}")]
    Duplicate { field: &'static str, value: String },

    #[error("{0} is not set")]
    NotConfigured(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] mongodb::bson::ser::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence for stocks and users. Stocks are keyed by their business `id`,
/// users by `email`.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn find_stock_by_id(&self, id: &str) -> StoreResult<Option<Stock>>;

    /// Every stock, in insertion order.
    async fn find_all_stocks(&self) -> StoreResult<Vec<Stock>>;

    async fn insert_stock(&self, stock: Stock) -> StoreResult<Stock>;

    /// Validates the whole batch before writing any of it.
    async fn insert_stocks_bulk(&self, stocks: Vec<Stock>) -> StoreResult<Vec<Stock>>;

    /// Merges `patch` into the stored record and returns the updated record.
    async fn update_stock_by_id(&self, id: &str, patch: StockPatch)
        -> StoreResult<Option<Stock>>;

    async fn delete_stock_by_id(&self, id: &str) -> StoreResult<Option<Stock>>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// `user.password` must already be hashed.
    async fn insert_user(&self, user: User) -> StoreResult<User>;
}

/// Opens the backend named by the configuration.
pub async fn connect(config: &Config) -> StoreResult<Arc<dyn RecordStore>> {
    match config.backend {
        StoreBackend::Memory => {
            info!("Using in-memory record store; data is lost on exit.");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Mongo => {
            let uri = config
                .mongo_uri
                .as_deref()
                .ok_or(StoreError::NotConfigured("MONGO_URI"))?;
            let store = MongoStore::connect(uri, config.mongo_database.as_deref()).await?;
            Ok(Arc::new(store))
        }
    }
}

/// Checks a bulk batch on its own: every record valid, no id repeated.
fn validate_batch(stocks: &[Stock]) -> StoreResult<()> {
    let mut seen = HashSet::new();
    for stock in stocks {
        stock.validate().map_err(StoreError::Validation)?;
        if !seen.insert(stock.id.as_str()) {
            return Err(StoreError::Duplicate {
                field: "id",
                value: stock.id.clone(),
            });
        }
    }
    Ok(())
}
