// src/auth.rs
use crate::config::Config;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("token signing failed: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("no token signing secret configured")]
    MissingSecret,

    #[error("hashing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: usize,
    pub exp: usize,
}

/// Password hashing and session-token issuance.
pub struct Credentials {
    secret: Option<String>,
    token_ttl: Duration,
    hash_cost: u32,
}

impl Credentials {
    pub fn new(secret: Option<String>, token_ttl_secs: i64, hash_cost: u32) -> Self {
        Credentials {
            secret,
            token_ttl: Duration::seconds(token_ttl_secs),
            hash_cost,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.jwt_secret.clone(),
            config.token_ttl_secs,
            config.bcrypt_cost,
        )
    }

    pub fn can_issue_tokens(&self) -> bool {
        self.secret.is_some()
    }

    // bcrypt work runs on the blocking pool.
    pub async fn hash_password(&self, password: String) -> Result<String, CredentialError> {
        let cost = self.hash_cost;
        let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
        Ok(hashed)
    }

    pub async fn verify_password(
        &self,
        password: String,
        hash: String,
    ) -> Result<bool, CredentialError> {
        let matched = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await??;
        Ok(matched)
    }

    pub fn create_token(&self, user_id: &str) -> Result<String, CredentialError> {
        let secret = self.secret.as_ref().ok_or(CredentialError::MissingSecret)?;
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp() as usize,
            exp: (now + self.token_ttl).timestamp() as usize,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )?;
        Ok(token)
    }
}
