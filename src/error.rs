use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::{
    models::CartLine,
    response::{ApiResponse, Meta},
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    /// Validation failure tied to a single request field.
    #[error("{message}")]
    Field { field: &'static str, message: String },

    #[error("{0}")]
    Unauthorized(String),

    #[error("Forbidden")]
    Forbidden,

    /// Checkout was aborted because stock changed; carries the corrected cart.
    #[error("{message}")]
    CartChanged {
        message: String,
        updated_cart: Vec<CartLine>,
    },

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Email error: {0}")]
    Email(#[from] crate::services::email::EmailError),

    #[error("Storage error: {0}")]
    Storage(#[from] crate::services::storage::StorageError),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field_error: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cart_updated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    updated_cart: Option<Vec<CartLine>>,
}

const TRY_AGAIN: &str = "An unexpected error occurred. Please try again later.";

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::Field { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::CartChanged { .. } => StatusCode::CONFLICT,
            AppError::DbError(_)
            | AppError::OrmError(_)
            | AppError::Email(_)
            | AppError::Storage(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn field(field: &'static str, message: impl Into<String>) -> Self {
        AppError::Field {
            field,
            message: message.into(),
        }
    }

    pub fn unauthorized() -> Self {
        AppError::Unauthorized("Authentication required.".into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        }

        let message = if status.is_server_error() {
            TRY_AGAIN.to_string()
        } else {
            self.to_string()
        };

        let data = match self {
            AppError::Field { field, .. } => ErrorData {
                error: message.clone(),
                field_error: Some(field),
                cart_updated: None,
                updated_cart: None,
            },
            AppError::CartChanged { updated_cart, .. } => ErrorData {
                error: message.clone(),
                field_error: None,
                cart_updated: Some(true),
                updated_cart: Some(updated_cart),
            },
            _ => ErrorData {
                error: message.clone(),
                field_error: None,
                cart_updated: None,
                updated_cart: None,
            },
        };

        let body = ApiResponse {
            success: false,
            message,
            data: Some(data),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        (status, serde_json::from_slice(&bytes).expect("json"))
    }

    #[tokio::test]
    async fn cart_changed_maps_to_conflict_with_cart() {
        let err = AppError::CartChanged {
            message: "Your cart has been updated".into(),
            updated_cart: vec![CartLine {
                id: "item002".into(),
                name: "Urban Comfort Kurti".into(),
                quantity: 3,
            }],
        };
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["success"], false);
        assert_eq!(body["data"]["cart_updated"], true);
        assert_eq!(body["data"]["updated_cart"][0]["quantity"], 3);
    }

    #[tokio::test]
    async fn server_errors_hide_details() {
        let err = AppError::Internal(anyhow::anyhow!("connection reset by peer"));
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["data"]["error"], TRY_AGAIN);
    }

    #[tokio::test]
    async fn field_errors_name_the_field() {
        let (status, body) = body_json(AppError::field("email", "Invalid email")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["data"]["field_error"], "email");
    }
}
