// src/db/memory.rs
use super::{validate_batch, RecordStore, StoreError, StoreResult};
use crate::models::{Stock, StockPatch, User};
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Process-local store. Vectors keep insertion order, matching what a full
/// collection scan returns from the document store.
#[derive(Default)]
pub struct MemoryStore {
    stocks: RwLock<Vec<Stock>>,
    users: RwLock<Vec<User>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn duplicate_id(id: &str) -> StoreError {
    StoreError::Duplicate {
        field: "id",
        value: id.to_string(),
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn find_stock_by_id(&self, id: &str) -> StoreResult<Option<Stock>> {
        let stocks = self.stocks.read().await;
        Ok(stocks.iter().find(|s| s.id == id).cloned())
    }

    async fn find_all_stocks(&self) -> StoreResult<Vec<Stock>> {
        Ok(self.stocks.read().await.clone())
    }

    async fn insert_stock(&self, stock: Stock) -> StoreResult<Stock> {
        stock.validate().map_err(StoreError::Validation)?;
        let mut stocks = self.stocks.write().await;
        if stocks.iter().any(|s| s.id == stock.id) {
            return Err(duplicate_id(&stock.id));
        }
        stocks.push(stock.clone());
        Ok(stock)
    }

    async fn insert_stocks_bulk(&self, batch: Vec<Stock>) -> StoreResult<Vec<Stock>> {
        validate_batch(&batch)?;
        let mut stocks = self.stocks.write().await;
        if let Some(taken) = batch
            .iter()
            .find(|new| stocks.iter().any(|s| s.id == new.id))
        {
            return Err(duplicate_id(&taken.id));
        }
        stocks.extend(batch.iter().cloned());
        Ok(batch)
    }

    async fn update_stock_by_id(
        &self,
        id: &str,
        patch: StockPatch,
    ) -> StoreResult<Option<Stock>> {
        patch.validate().map_err(StoreError::Validation)?;
        let mut stocks = self.stocks.write().await;
        let index = match stocks.iter().position(|s| s.id == id) {
            Some(index) => index,
            None => return Ok(None),
        };
        if let Some(new_id) = patch.id.as_deref() {
            if new_id != id && stocks.iter().any(|s| s.id == new_id) {
                return Err(duplicate_id(new_id));
            }
        }
        let stock = &mut stocks[index];
        patch.apply(stock);
        Ok(Some(stock.clone()))
    }

    async fn delete_stock_by_id(&self, id: &str) -> StoreResult<Option<Stock>> {
        let mut stocks = self.stocks.write().await;
        Ok(stocks
            .iter()
            .position(|s| s.id == id)
            .map(|index| stocks.remove(index)))
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn insert_user(&self, user: User) -> StoreResult<User> {
        user.validate().map_err(StoreError::Validation)?;
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate {
                field: "email",
                value: user.email,
            });
        }
        users.push(user.clone());
        Ok(user)
    }
}
