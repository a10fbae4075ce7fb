// src/models.rs
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stock {
    pub id: String,
    pub name: String,
    pub code: String,
    pub price: f64,
    #[serde(default)]
    pub previous_price: f64,
    pub exchange: String,
    #[serde(default)]
    pub favorite: bool,
}

impl Stock {
    /// Rejects records whose required string fields are empty.
    pub fn validate(&self) -> Result<(), String> {
        for (field, value) in [
            ("id", &self.id),
            ("name", &self.name),
            ("code", &self.code),
            ("exchange", &self.exchange),
        ] {
            if value.trim().is_empty() {
                return Err(required(field));
            }
        }
        Ok(())
    }
}

/// Partial update body for `PUT /stocks/:id`. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favorite: Option<bool>,
}

impl StockPatch {
    pub fn is_empty(&self) -> bool {
        *self == StockPatch::default()
    }

    pub fn validate(&self) -> Result<(), String> {
        for (field, value) in [
            ("id", &self.id),
            ("name", &self.name),
            ("code", &self.code),
            ("exchange", &self.exchange),
        ] {
            if matches!(value, Some(v) if v.trim().is_empty()) {
                return Err(required(field));
            }
        }
        Ok(())
    }

    pub fn apply(self, stock: &mut Stock) {
        if let Some(id) = self.id {
            stock.id = id;
        }
        if let Some(name) = self.name {
            stock.name = name;
        }
        if let Some(code) = self.code {
            stock.code = code;
        }
        if let Some(price) = self.price {
            stock.price = price;
        }
        if let Some(previous_price) = self.previous_price {
            stock.previous_price = previous_price;
        }
        if let Some(exchange) = self.exchange {
            stock.exchange = exchange;
        }
        if let Some(favorite) = self.favorite {
            stock.favorite = favorite;
        }
    }
}

/// A registered account. `password` always holds a bcrypt hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub username: String,
    pub email: String,
    pub password: String,
}

impl User {
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        User {
            id: ObjectId::new(),
            username,
            email,
            password: password_hash,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        for (field, value) in [
            ("username", &self.username),
            ("email", &self.email),
            ("password", &self.password),
        ] {
            if value.trim().is_empty() {
                return Err(required(field));
            }
        }
        Ok(())
    }
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

fn required(field: &str) -> String {
    format!("Path `{}` is required.", field)
}
