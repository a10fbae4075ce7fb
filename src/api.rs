// src/api.rs
use crate::auth::Credentials;
use crate::db::{RecordStore, StoreError};
use crate::error::{handle_rejection, ApiError};
use crate::models::{LoginRequest, RegisterRequest, Stock, StockPatch, User};
use log::{error, info, warn};
use percent_encoding::percent_decode_str;
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

const STOCK_NOT_FOUND: &str = "Stock not found";
const INVALID_CREDENTIALS: &str = "Invalid credentials";

pub fn routes(
    store: Arc<dyn RecordStore>,
    credentials: Arc<Credentials>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let get_one = warp::path!("stocks" / "id" / String)
        .and(warp::get())
        .and(with_store(store.clone()))
        .and_then(get_stock_handler);

    let get_all = warp::path!("stocks")
        .and(warp::get())
        .and(with_store(store.clone()))
        .and_then(list_stocks_handler);

    let add = warp::path!("stocks")
        .and(warp::post())
        .and(with_store(store.clone()))
        .and(warp::body::json())
        .and_then(add_stock_handler);

    let add_bulk = warp::path!("stocks" / "bulk")
        .and(warp::post())
        .and(with_store(store.clone()))
        .and(warp::body::json())
        .and_then(add_stocks_bulk_handler);

    let update = warp::path!("stocks" / String)
        .and(warp::put())
        .and(with_store(store.clone()))
        .and(warp::body::json())
        .and_then(update_stock_handler);

    let delete = warp::path!("stocks" / String)
        .and(warp::delete())
        .and(with_store(store.clone()))
        .and_then(delete_stock_handler);

    let register = warp::path!("register")
        .and(warp::post())
        .and(with_store(store.clone()))
        .and(with_credentials(credentials.clone()))
        .and(warp::body::json())
        .and_then(register_handler);

    let login = warp::path!("login")
        .and(warp::post())
        .and(with_store(store))
        .and(with_credentials(credentials))
        .and(warp::body::json())
        .and_then(login_handler);

    let cors = warp::cors()
        .allow_any_origin()
        .allow_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allow_headers(vec!["content-type", "authorization"]);

    get_one
        .or(get_all)
        .or(add)
        .or(add_bulk)
        .or(update)
        .or(delete)
        .or(register)
        .or(login)
        .recover(handle_rejection)
        .with(cors)
        .with(warp::log("stock_records::http"))
}

fn with_store(
    store: Arc<dyn RecordStore>,
) -> impl Filter<Extract = (Arc<dyn RecordStore>,), Error = Infallible> + Clone {
    warp::any().map(move || store.clone())
}

fn with_credentials(
    credentials: Arc<Credentials>,
) -> impl Filter<Extract = (Arc<Credentials>,), Error = Infallible> + Clone {
    warp::any().map(move || credentials.clone())
}

/// Path segments arrive percent-encoded; stock ids are stored decoded.
fn decode_id(raw: &str) -> Result<String, Rejection> {
    percent_decode_str(raw)
        .decode_utf8()
        .map(|id| id.into_owned())
        .map_err(|e| {
            warn!("Rejected stock id {:?}: {}", raw, e);
            warp::reject::custom(ApiError::bad_request("Invalid stock id", e))
        })
}

/// Bad records and clashing keys are the client's fault and keep their detail;
/// anything else is a 500 with the cause only in the log.
fn store_rejection(message: &str, err: StoreError) -> Rejection {
    match err {
        StoreError::Validation(_) | StoreError::Duplicate { .. } => {
            warn!("{}: {}", message, err);
            warp::reject::custom(ApiError::bad_request(message, err))
        }
        _ => {
            error!("{}: {}", message, err);
            warp::reject::custom(ApiError::internal(message))
        }
    }
}

async fn get_stock_handler(
    raw_id: String,
    store: Arc<dyn RecordStore>,
) -> Result<impl Reply, Rejection> {
    let id = decode_id(&raw_id)?;
    match store.find_stock_by_id(&id).await {
        Ok(Some(stock)) => Ok(warp::reply::json(&stock)),
        Ok(None) => Err(warp::reject::custom(ApiError::not_found(STOCK_NOT_FOUND))),
        Err(e) => {
            error!("Failed to retrieve stock {}: {}", id, e);
            Err(warp::reject::custom(ApiError::internal("Server error")))
        }
    }
}

async fn list_stocks_handler(store: Arc<dyn RecordStore>) -> Result<impl Reply, Rejection> {
    match store.find_all_stocks().await {
        Ok(stocks) => Ok(warp::reply::json(&stocks)),
        Err(e) => {
            error!("Failed to list stocks: {}", e);
            Err(warp::reject::custom(ApiError::internal("Server error")))
        }
    }
}

async fn add_stock_handler(
    store: Arc<dyn RecordStore>,
    stock: Stock,
) -> Result<impl Reply, Rejection> {
    match store.insert_stock(stock).await {
        Ok(stock) => {
            info!("Stock {} added.", stock.id);
            Ok(warp::reply::with_status(
                warp::reply::json(&json!({ "message": "Stock added", "stock": stock })),
                StatusCode::CREATED,
            ))
        }
        Err(e) => Err(store_rejection("Error adding stock", e)),
    }
}

async fn add_stocks_bulk_handler(
    store: Arc<dyn RecordStore>,
    stocks: Vec<Stock>,
) -> Result<impl Reply, Rejection> {
    match store.insert_stocks_bulk(stocks).await {
        Ok(stocks) => {
            info!("{} stocks added.", stocks.len());
            Ok(warp::reply::with_status(
                warp::reply::json(&json!({ "message": "Stocks added", "stocks": stocks })),
                StatusCode::CREATED,
            ))
        }
        Err(e) => Err(store_rejection("Error adding stocks", e)),
    }
}

async fn update_stock_handler(
    raw_id: String,
    store: Arc<dyn RecordStore>,
    patch: StockPatch,
) -> Result<impl Reply, Rejection> {
    let id = decode_id(&raw_id)?;
    match store.update_stock_by_id(&id, patch).await {
        Ok(Some(stock)) => {
            info!("Stock {} updated.", id);
            Ok(warp::reply::json(
                &json!({ "message": "Stock updated", "stock": stock }),
            ))
        }
        Ok(None) => Err(warp::reject::custom(ApiError::not_found(STOCK_NOT_FOUND))),
        Err(e) => Err(store_rejection("Error updating stock", e)),
    }
}

async fn delete_stock_handler(
    raw_id: String,
    store: Arc<dyn RecordStore>,
) -> Result<impl Reply, Rejection> {
    let id = decode_id(&raw_id)?;
    match store.delete_stock_by_id(&id).await {
        Ok(Some(stock)) => {
            info!("Stock {} deleted.", id);
            Ok(warp::reply::json(
                &json!({ "message": "Stock deleted", "stock": stock }),
            ))
        }
        Ok(None) => Err(warp::reject::custom(ApiError::not_found(STOCK_NOT_FOUND))),
        Err(e) => {
            error!("Failed to delete stock {}: {}", id, e);
            Err(warp::reject::custom(ApiError::internal("Error deleting stock")))
        }
    }
}

async fn register_handler(
    store: Arc<dyn RecordStore>,
    credentials: Arc<Credentials>,
    request: RegisterRequest,
) -> Result<impl Reply, Rejection> {
    let RegisterRequest {
        username,
        email,
        password,
    } = request;

    let hashed = match credentials.hash_password(password).await {
        Ok(hashed) => hashed,
        Err(e) => {
            error!("Failed to hash password: {}", e);
            return Err(warp::reject::custom(ApiError::internal(
                "Error registering user",
            )));
        }
    };

    match store.insert_user(User::new(username, email, hashed)).await {
        Ok(user) => {
            info!("User {} registered.", user.email);
            Ok(warp::reply::with_status(
                warp::reply::json(&json!({ "message": "User registered successfully" })),
                StatusCode::CREATED,
            ))
        }
        Err(e) => Err(store_rejection("Error registering user", e)),
    }
}

async fn login_handler(
    store: Arc<dyn RecordStore>,
    credentials: Arc<Credentials>,
    request: LoginRequest,
) -> Result<impl Reply, Rejection> {
    let user = match store.find_user_by_email(&request.email).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            info!("Login rejected: unknown email.");
            return Err(warp::reject::custom(ApiError::rejected(INVALID_CREDENTIALS)));
        }
        Err(e) => {
            error!("Failed to look up user: {}", e);
            return Err(warp::reject::custom(ApiError::internal("Server error")));
        }
    };

    let matched = match credentials
        .verify_password(request.password, user.password.clone())
        .await
    {
        Ok(matched) => matched,
        Err(e) => {
            error!("Failed to verify password for {}: {}", user.email, e);
            return Err(warp::reject::custom(ApiError::internal("Server error")));
        }
    };
    if !matched {
        info!("Login rejected for {}: wrong password.", user.email);
        return Err(warp::reject::custom(ApiError::rejected(INVALID_CREDENTIALS)));
    }

    match credentials.create_token(&user.id.to_hex()) {
        Ok(token) => {
            info!("User {} logged in.", user.email);
            Ok(warp::reply::json(&json!({ "token": token })))
        }
        Err(e) => {
            error!("Failed to issue token for {}: {}", user.email, e);
            Err(warp::reject::custom(ApiError::internal("Server error")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Claims;
    use crate::db::{MemoryStore, StoreResult};
    use jsonwebtoken::{decode, DecodingKey, Validation};
    use serde_json::Value;
    use warp::http::Response;
    use warp::hyper::body::Bytes;

    const SECRET: &str = "route-test-secret";

    fn api() -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone + 'static {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
        let credentials = Arc::new(Credentials::new(Some(SECRET.to_string()), 3600, 4));
        routes(store, credentials)
    }

    fn body(response: &Response<Bytes>) -> Value {
        serde_json::from_slice(response.body()).expect("json body")
    }

    fn apple() -> Value {
        json!({
            "id": "AAPL",
            "name": "Apple",
            "code": "AAPL",
            "price": 150,
            "exchange": "NASDAQ"
        })
    }

    async fn post_json<F>(api: &F, path: &str, payload: &Value) -> Response<Bytes>
    where
        F: Filter + 'static,
        F::Extract: Reply + Send,
    {
        warp::test::request()
            .method("POST")
            .path(path)
            .json(payload)
            .reply(api)
            .await
    }

    async fn get<F>(api: &F, path: &str) -> Response<Bytes>
    where
        F: Filter + 'static,
        F::Extract: Reply + Send,
    {
        warp::test::request().method("GET").path(path).reply(api).await
    }

    #[tokio::test]
    async fn create_read_delete_scenario() {
        let api = api();

        let created = post_json(&api, "/stocks", &apple()).await;
        assert_eq!(created.status(), StatusCode::CREATED);
        let created = body(&created);
        assert_eq!(created["message"], "Stock added");
        assert_eq!(created["stock"]["id"], "AAPL");
        assert_eq!(created["stock"]["price"].as_f64(), Some(150.0));
        assert_eq!(created["stock"]["previousPrice"].as_f64(), Some(0.0));
        assert_eq!(created["stock"]["favorite"], false);

        let fetched = get(&api, "/stocks/id/AAPL").await;
        assert_eq!(fetched.status(), StatusCode::OK);
        assert_eq!(body(&fetched), created["stock"]);

        let deleted = warp::test::request()
            .method("DELETE")
            .path("/stocks/AAPL")
            .reply(&api)
            .await;
        assert_eq!(deleted.status(), StatusCode::OK);
        let deleted = body(&deleted);
        assert_eq!(deleted["message"], "Stock deleted");
        assert_eq!(deleted["stock"], created["stock"]);

        let missing = get(&api, "/stocks/id/AAPL").await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert_eq!(body(&missing)["message"], "Stock not found");
    }

    #[tokio::test]
    async fn duplicate_id_is_a_client_error() {
        let api = api();
        post_json(&api, "/stocks", &apple()).await;

        let mut clone = apple();
        clone["price"] = json!(1);
        let second = post_json(&api, "/stocks", &clone).await;
        assert_eq!(second.status(), StatusCode::BAD_REQUEST);
        let second = body(&second);
        assert_eq!(second["message"], "Error adding stock");
        assert!(second["error"].as_str().unwrap().contains("AAPL"));

        let original = body(&get(&api, "/stocks/id/AAPL").await);
        assert_eq!(original["price"].as_f64(), Some(150.0));
    }

    #[tokio::test]
    async fn missing_or_blank_fields_are_rejected() {
        let api = api();

        let mut no_price = apple();
        no_price.as_object_mut().unwrap().remove("price");
        let response = post_json(&api, "/stocks", &no_price).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let mut blank_name = apple();
        blank_name["name"] = json!("");
        let response = post_json(&api, "/stocks", &blank_name).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body(&response)["message"], "Error adding stock");

        let listed = body(&get(&api, "/stocks").await);
        assert_eq!(listed, json!([]));
    }

    #[tokio::test]
    async fn update_changes_only_price() {
        let api = api();
        post_json(&api, "/stocks", &apple()).await;

        let updated = warp::test::request()
            .method("PUT")
            .path("/stocks/AAPL")
            .json(&json!({ "price": 162.5 }))
            .reply(&api)
            .await;
        assert_eq!(updated.status(), StatusCode::OK);
        let updated = body(&updated);
        assert_eq!(updated["message"], "Stock updated");
        assert_eq!(updated["stock"]["price"].as_f64(), Some(162.5));
        assert_eq!(updated["stock"]["name"], "Apple");
        assert_eq!(updated["stock"]["exchange"], "NASDAQ");
        assert_eq!(updated["stock"]["previousPrice"].as_f64(), Some(0.0));

        let missing = warp::test::request()
            .method("PUT")
            .path("/stocks/MSFT")
            .json(&json!({ "price": 1 }))
            .reply(&api)
            .await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let bad_type = warp::test::request()
            .method("PUT")
            .path("/stocks/AAPL")
            .json(&json!({ "price": "lots" }))
            .reply(&api)
            .await;
        assert_eq!(bad_type.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn delete_unknown_stock_is_not_found() {
        let response = warp::test::request()
            .method("DELETE")
            .path("/stocks/NOPE")
            .reply(&api())
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn bulk_insert_then_list_returns_all() {
        let api = api();
        let batch = json!([
            { "id": "AAPL", "name": "Apple", "code": "AAPL", "price": 150, "exchange": "NASDAQ" },
            { "id": "MSFT", "name": "Microsoft", "code": "MSFT", "price": 310, "exchange": "NASDAQ" },
            { "id": "VNM", "name": "Vinamilk", "code": "VNM", "price": 70, "exchange": "HOSE", "favorite": true }
        ]);

        let created = post_json(&api, "/stocks/bulk", &batch).await;
        assert_eq!(created.status(), StatusCode::CREATED);
        let created = body(&created);
        assert_eq!(created["message"], "Stocks added");
        assert_eq!(created["stocks"].as_array().unwrap().len(), 3);

        let listed = body(&get(&api, "/stocks").await);
        let ids: Vec<&str> = listed
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, ["AAPL", "MSFT", "VNM"]);
        assert_eq!(listed[2]["favorite"], true);
    }

    #[tokio::test]
    async fn bulk_insert_with_clash_writes_nothing() {
        let api = api();
        post_json(&api, "/stocks", &apple()).await;

        let batch = json!([
            { "id": "MSFT", "name": "Microsoft", "code": "MSFT", "price": 310, "exchange": "NASDAQ" },
            apple()
        ]);
        let response = post_json(&api, "/stocks/bulk", &batch).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body(&response)["message"], "Error adding stocks");

        let missing = get(&api, "/stocks/id/MSFT").await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn register_then_login() {
        let api = api();
        let registered = post_json(
            &api,
            "/register",
            &json!({ "username": "linh", "email": "linh@example.com", "password": "correct horse" }),
        )
        .await;
        assert_eq!(registered.status(), StatusCode::CREATED);
        assert_eq!(body(&registered)["message"], "User registered successfully");

        let login = post_json(
            &api,
            "/login",
            &json!({ "email": "linh@example.com", "password": "correct horse" }),
        )
        .await;
        assert_eq!(login.status(), StatusCode::OK);
        let token = body(&login)["token"].as_str().unwrap().to_string();
        let claims = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(SECRET.as_bytes()),
            &Validation::default(),
        )
        .unwrap()
        .claims;
        assert_eq!(claims.sub.len(), 24);

        let wrong = post_json(
            &api,
            "/login",
            &json!({ "email": "linh@example.com", "password": "battery staple" }),
        )
        .await;
        assert_eq!(wrong.status(), StatusCode::BAD_REQUEST);
        let wrong = body(&wrong);
        assert!(wrong.get("token").is_none());

        let unknown = post_json(
            &api,
            "/login",
            &json!({ "email": "nobody@example.com", "password": "correct horse" }),
        )
        .await;
        assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body(&unknown), wrong);
    }

    #[tokio::test]
    async fn login_without_secret_is_a_server_error() {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
        let api = routes(store, Arc::new(Credentials::new(None, 3600, 4)));
        post_json(
            &api,
            "/register",
            &json!({ "username": "an", "email": "an@example.com", "password": "pw" }),
        )
        .await;

        let login = post_json(
            &api,
            "/login",
            &json!({ "email": "an@example.com", "password": "pw" }),
        )
        .await;
        assert_eq!(login.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body(&login), json!({ "message": "Server error" }));
    }

    #[tokio::test]
    async fn duplicate_registration_is_a_client_error() {
        let api = api();
        let user = json!({ "username": "an", "email": "an@example.com", "password": "pw" });
        post_json(&api, "/register", &user).await;
        let again = post_json(&api, "/register", &user).await;
        assert_eq!(again.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body(&again)["message"], "Error registering user");
    }

    #[tokio::test]
    async fn missing_or_blank_username_are_both_client_errors() {
        let api = api();

        let missing = post_json(
            &api,
            "/register",
            &json!({ "email": "an@example.com", "password": "pw" }),
        )
        .await;
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body(&missing)["message"], "Invalid request body");

        let blank = post_json(
            &api,
            "/register",
            &json!({ "username": "", "email": "an@example.com", "password": "pw" }),
        )
        .await;
        assert_eq!(blank.status(), StatusCode::BAD_REQUEST);
        let blank = body(&blank);
        assert_eq!(blank["message"], "Error registering user");
        assert!(blank["error"].as_str().unwrap().contains("username"));

        let login = post_json(
            &api,
            "/login",
            &json!({ "email": "an@example.com", "password": "pw" }),
        )
        .await;
        assert_eq!(login.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn encoded_ids_round_trip_through_every_route() {
        let api = api();
        for (id, encoded) in [("BRK B", "BRK%20B"), ("VNĐ", "VN%C4%90")] {
            let mut record = apple();
            record["id"] = json!(id);
            let created = post_json(&api, "/stocks", &record).await;
            assert_eq!(created.status(), StatusCode::CREATED);

            let fetched = get(&api, &format!("/stocks/id/{}", encoded)).await;
            assert_eq!(fetched.status(), StatusCode::OK);
            assert_eq!(body(&fetched)["id"], id);

            let updated = warp::test::request()
                .method("PUT")
                .path(&format!("/stocks/{}", encoded))
                .json(&json!({ "favorite": true }))
                .reply(&api)
                .await;
            assert_eq!(updated.status(), StatusCode::OK);
            assert_eq!(body(&updated)["stock"]["favorite"], true);

            let deleted = warp::test::request()
                .method("DELETE")
                .path(&format!("/stocks/{}", encoded))
                .reply(&api)
                .await;
            assert_eq!(deleted.status(), StatusCode::OK);
            assert_eq!(body(&deleted)["stock"]["id"], id);

            let gone = get(&api, &format!("/stocks/id/{}", encoded)).await;
            assert_eq!(gone.status(), StatusCode::NOT_FOUND);
        }
    }

    #[tokio::test]
    async fn id_that_is_not_utf8_is_rejected() {
        let response = get(&api(), "/stocks/id/%FF%FE").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body(&response)["message"], "Invalid stock id");
    }

    /// Every call fails as if the database were unreachable.
    struct UnreachableStore;

    fn unreachable() -> StoreError {
        let io = std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connect to db-internal:27017 refused",
        );
        StoreError::Database(io.into())
    }

    #[async_trait::async_trait]
    impl RecordStore for UnreachableStore {
        async fn find_stock_by_id(&self, _id: &str) -> StoreResult<Option<Stock>> {
            Err(unreachable())
        }

        async fn find_all_stocks(&self) -> StoreResult<Vec<Stock>> {
            Err(unreachable())
        }

        async fn insert_stock(&self, _stock: Stock) -> StoreResult<Stock> {
            Err(unreachable())
        }

        async fn insert_stocks_bulk(&self, _stocks: Vec<Stock>) -> StoreResult<Vec<Stock>> {
            Err(unreachable())
        }

        async fn update_stock_by_id(
            &self,
            _id: &str,
            _patch: StockPatch,
        ) -> StoreResult<Option<Stock>> {
            Err(unreachable())
        }

        async fn delete_stock_by_id(&self, _id: &str) -> StoreResult<Option<Stock>> {
            Err(unreachable())
        }

        async fn find_user_by_email(&self, _email: &str) -> StoreResult<Option<User>> {
            Err(unreachable())
        }

        async fn insert_user(&self, _user: User) -> StoreResult<User> {
            Err(unreachable())
        }
    }

    #[tokio::test]
    async fn store_outage_is_a_server_error_without_detail() {
        let store: Arc<dyn RecordStore> = Arc::new(UnreachableStore);
        let credentials = Arc::new(Credentials::new(Some(SECRET.to_string()), 3600, 4));
        let api = routes(store, credentials);

        let added = post_json(&api, "/stocks", &apple()).await;
        assert_eq!(added.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body(&added), json!({ "message": "Error adding stock" }));

        let bulk = post_json(&api, "/stocks/bulk", &json!([apple()])).await;
        assert_eq!(bulk.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body(&bulk), json!({ "message": "Error adding stocks" }));

        let updated = warp::test::request()
            .method("PUT")
            .path("/stocks/AAPL")
            .json(&json!({ "price": 1 }))
            .reply(&api)
            .await;
        assert_eq!(updated.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body(&updated), json!({ "message": "Error updating stock" }));

        let registered = post_json(
            &api,
            "/register",
            &json!({ "username": "an", "email": "an@example.com", "password": "pw" }),
        )
        .await;
        assert_eq!(registered.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body(&registered), json!({ "message": "Error registering user" }));

        let fetched = get(&api, "/stocks/id/AAPL").await;
        assert_eq!(fetched.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!String::from_utf8_lossy(fetched.body()).contains("db-internal"));
    }

    #[tokio::test]
    async fn malformed_json_and_unknown_routes() {
        let api = api();

        let garbage = warp::test::request()
            .method("POST")
            .path("/stocks")
            .header("content-type", "application/json")
            .body("{not json")
            .reply(&api)
            .await;
        assert_eq!(garbage.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body(&garbage)["message"], "Invalid request body");

        let unknown = get(&api, "/portfolio").await;
        assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
        assert_eq!(body(&unknown)["message"], "Not found");
    }
}
