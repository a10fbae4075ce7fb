// src/error.rs
use log::error;
use serde::Serialize;
use std::convert::Infallible;
use std::fmt;
use warp::http::StatusCode;
use warp::reject::Reject;
use warp::{Rejection, Reply};

/// A handler failure already mapped onto the HTTP status it should produce.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub detail: Option<String>,
}

impl ApiError {
    pub fn not_found(message: &str) -> Self {
        ApiError {
            status: StatusCode::NOT_FOUND,
            message: message.to_string(),
            detail: None,
        }
    }

    pub fn bad_request(message: &str, detail: impl fmt::Display) -> Self {
        ApiError {
            status: StatusCode::BAD_REQUEST,
            message: message.to_string(),
            detail: Some(detail.to_string()),
        }
    }

    /// A 400 that carries no detail, used where the detail would reveal too much.
    pub fn rejected(message: &str) -> Self {
        ApiError {
            status: StatusCode::BAD_REQUEST,
            message: message.to_string(),
            detail: None,
        }
    }

    /// A 500 whose body is only `message`; callers log the cause themselves.
    pub fn internal(message: &str) -> Self {
        ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.to_string(),
            detail: None,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{}: {}", self.message, detail),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ApiError {}

impl Reject for ApiError {}

#[derive(Serialize)]
struct ErrorBody<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

fn reply_error(status: StatusCode, message: &str, detail: Option<&str>) -> warp::reply::Response {
    let body = ErrorBody {
        message,
        error: detail,
    };
    warp::reply::with_status(warp::reply::json(&body), status).into_response()
}

/// Turns every rejection produced by the route table into a JSON response.
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    if let Some(api_error) = err.find::<ApiError>() {
        return Ok(reply_error(
            api_error.status,
            &api_error.message,
            api_error.detail.as_deref(),
        ));
    }

    if err.is_not_found() {
        Ok(reply_error(StatusCode::NOT_FOUND, "Not found", None))
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        let detail = e.to_string();
        Ok(reply_error(
            StatusCode::BAD_REQUEST,
            "Invalid request body",
            Some(&detail),
        ))
    } else if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        Ok(reply_error(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Unsupported media type",
            None,
        ))
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        Ok(reply_error(
            StatusCode::METHOD_NOT_ALLOWED,
            "Method not allowed",
            None,
        ))
    } else {
        error!("Unhandled rejection: {:?}", err);
        Ok(reply_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Server error",
            None,
        ))
    }
}
