// src/db/mongo.rs
use super::{validate_batch, RecordStore, StoreError, StoreResult};
use crate::models::{Stock, StockPatch, User};
use async_trait::async_trait;
use futures::TryStreamExt;
use log::info;
use mongodb::bson::{doc, to_document};
use mongodb::error::{Error, ErrorKind, WriteFailure};
use mongodb::options::{FindOneAndUpdateOptions, IndexOptions, ReturnDocument};
use mongodb::{Client, Collection, Database, IndexModel};

const DEFAULT_DATABASE: &str = "test";
const DUPLICATE_KEY: i32 = 11000;

pub struct MongoStore {
    stocks: Collection<Stock>,
    users: Collection<User>,
}

impl MongoStore {
    /// Connects, pings the server and makes sure the unique indexes exist.
    pub async fn connect(uri: &str, database: Option<&str>) -> StoreResult<Self> {
        let client = Client::with_uri_str(uri).await?;
        let db = match database {
            Some(name) => client.database(name),
            None => client
                .default_database()
                .unwrap_or_else(|| client.database(DEFAULT_DATABASE)),
        };
        db.run_command(doc! { "ping": 1 }, None).await?;

        let store = Self::from_database(&db);
        store.ensure_indexes().await?;
        info!("MongoDB connected (database `{}`).", db.name());
        Ok(store)
    }

    pub fn from_database(db: &Database) -> Self {
        MongoStore {
            stocks: db.collection("stocks"),
            users: db.collection("users"),
        }
    }

    async fn ensure_indexes(&self) -> StoreResult<()> {
        let unique = || IndexOptions::builder().unique(true).build();
        self.stocks
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "id": 1 })
                    .options(unique())
                    .build(),
                None,
            )
            .await?;
        self.users
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "email": 1 })
                    .options(unique())
                    .build(),
                None,
            )
            .await?;
        Ok(())
    }
}

fn is_duplicate_key(err: &Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY,
        ErrorKind::BulkWrite(failure) => failure
            .write_errors
            .as_ref()
            .map_or(false, |errors| errors.iter().any(|e| e.code == DUPLICATE_KEY)),
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY,
        _ => false,
    }
}

/// Position in the batch of the first rejected document of an `insert_many`.
fn failed_index(err: &Error) -> Option<usize> {
    match err.kind.as_ref() {
        ErrorKind::BulkWrite(failure) => failure
            .write_errors
            .as_ref()
            .and_then(|errors| errors.first())
            .map(|e| e.index),
        _ => None,
    }
}

/// Maps duplicate-key failures onto `StoreError::Duplicate`.
fn classify(err: Error, field: &'static str, value: &str) -> StoreError {
    if is_duplicate_key(&err) {
        StoreError::Duplicate {
            field,
            value: value.to_string(),
        }
    } else {
        StoreError::Database(err)
    }
}

#[async_trait]
impl RecordStore for MongoStore {
    async fn find_stock_by_id(&self, id: &str) -> StoreResult<Option<Stock>> {
        Ok(self.stocks.find_one(doc! { "id": id }, None).await?)
    }

    async fn find_all_stocks(&self) -> StoreResult<Vec<Stock>> {
        let cursor = self.stocks.find(None, None).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn insert_stock(&self, stock: Stock) -> StoreResult<Stock> {
        stock.validate().map_err(StoreError::Validation)?;
        self.stocks
            .insert_one(&stock, None)
            .await
            .map_err(|e| classify(e, "id", &stock.id))?;
        Ok(stock)
    }

    async fn insert_stocks_bulk(&self, stocks: Vec<Stock>) -> StoreResult<Vec<Stock>> {
        validate_batch(&stocks)?;
        if stocks.is_empty() {
            return Ok(stocks);
        }

        let ids: Vec<String> = stocks.iter().map(|s| s.id.clone()).collect();
        if let Some(existing) = self
            .stocks
            .find_one(doc! { "id": { "$in": ids } }, None)
            .await?
        {
            return Err(StoreError::Duplicate {
                field: "id",
                value: existing.id,
            });
        }

        if let Err(e) = self.stocks.insert_many(&stocks, None).await {
            let clashing = failed_index(&e)
                .and_then(|index| stocks.get(index))
                .map(|s| s.id.as_str())
                .unwrap_or_default();
            return Err(classify(e, "id", clashing));
        }
        Ok(stocks)
    }

    async fn update_stock_by_id(
        &self,
        id: &str,
        patch: StockPatch,
    ) -> StoreResult<Option<Stock>> {
        patch.validate().map_err(StoreError::Validation)?;
        if patch.is_empty() {
            return self.find_stock_by_id(id).await;
        }

        let new_id = patch.id.clone().unwrap_or_else(|| id.to_string());
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        self.stocks
            .find_one_and_update(doc! { "id": id }, doc! { "$set": to_document(&patch)? }, options)
            .await
            .map_err(|e| classify(e, "id", &new_id))
    }

    async fn delete_stock_by_id(&self, id: &str) -> StoreResult<Option<Stock>> {
        Ok(self.stocks.find_one_and_delete(doc! { "id": id }, None).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.users.find_one(doc! { "email": email }, None).await?)
    }

    async fn insert_user(&self, user: User) -> StoreResult<User> {
        user.validate().map_err(StoreError::Validation)?;
        self.users
            .insert_one(&user, None)
            .await
            .map_err(|e| classify(e, "email", &user.email))?;
        Ok(user)
    }
}
