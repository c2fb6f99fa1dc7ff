//! Request schemas and the extractors that enforce them.
//!
//! Every schema derives `validator::Validate`. A failed validation produces a
//! single 400 listing every violated field, nested fields in dotted form.

pub mod profile;
pub mod rules;
pub mod tickets;
pub mod users;

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use std::ops::Deref;
use uuid::Uuid;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use crate::error::{ApiError, FieldError};

pub use profile::{AdminProfileUpdateRequest, UpdateOwnProfileRequest};
pub use tickets::{CommentListQuery, CreateCommentRequest, CreateTicketRequest, TicketListQuery, UpdateTicketRequest};
pub use users::{
    AssignTeamsRequest, AuditLogListQuery, BulkStatusRequest, BulkTeamsRequest, NotificationListQuery,
    UpdateUserRequest, UserListQuery,
};

/// JSON body extractor that runs schema validation before the handler
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<T> Deref for ValidatedJson<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
        value.validate().map_err(validation_failed)?;
        Ok(ValidatedJson(value))
    }
}

/// Query string extractor with defaults applied by serde and validation after
#[derive(Debug)]
pub struct ValidatedQuery<T>(pub T);

impl<T> Deref for ValidatedQuery<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
        value.validate().map_err(validation_failed)?;
        Ok(ValidatedQuery(value))
    }
}

pub fn validation_failed(errors: ValidationErrors) -> ApiError {
    ApiError::validation_error("Validation failed", field_errors(&errors))
}

/// Flatten validator output into `{field, message}` pairs, sorted by field
pub fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut out = Vec::new();
    collect(errors, "", &mut out);
    out.sort_by(|a, b| a.field.cmp(&b.field));
    out
}

fn collect(errors: &ValidationErrors, prefix: &str, out: &mut Vec<FieldError>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };
        match kind {
            ValidationErrorsKind::Field(errs) => {
                for err in errs {
                    let message = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid ({})", path, err.code));
                    out.push(FieldError::new(path.clone(), message));
                }
            }
            ValidationErrorsKind::Struct(inner) => collect(inner, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect(inner, &format!("{}[{}]", path, index), out);
                }
            }
        }
    }
}

/// Parse a UUID path segment, reporting a field error instead of a plain-text rejection
pub fn parse_uuid(field: &str, raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::invalid_field(field, format!("{} must be a valid UUID", field)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_violated_field_is_reported() {
        let request: CreateTicketRequest = serde_json::from_value(json!({
            "title": "",
            "description": "",
            "priority": "URGENT",
            "type": "PARTY",
            "location": {"latitude": 91.0, "longitude": 0.0}
        }))
        .unwrap();
        let errors = field_errors(&request.validate().unwrap_err());
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["description", "location.latitude", "priority", "title", "type"]);
    }

    #[test]
    fn bad_uuid_is_a_field_error() {
        let err = parse_uuid("id", "not-a-uuid").unwrap_err();
        match err {
            ApiError::ValidationError { errors, .. } => assert_eq!(errors[0].field, "id"),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
