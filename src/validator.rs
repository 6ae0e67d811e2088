use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use contacthub_core::{
    AppError,
    validation::{VALIDATION_FAILED, from_validation_errors, missing_field},
};
use serde::de::DeserializeOwned;
use validator::Validate;

/// JSON body that has passed `validator` rules.
///
/// A validation failure reports every failing field at once, never just the first.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

fn missing_field_name(body_text: &str) -> Option<&str> {
    body_text
        .split("missing field `")
        .nth(1)
        .and_then(|s| s.split('`').next())
        .filter(|s| !s.is_empty())
}

fn rejection_error(rejection: JsonRejection) -> AppError {
    let body_text = rejection.body_text();

    if let Some(field) = missing_field_name(&body_text) {
        return AppError::validation(VALIDATION_FAILED, vec![missing_field(field)]);
    }

    let message = match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            "Missing 'Content-Type: application/json' header"
        }
        JsonRejection::JsonSyntaxError(_) => "Request body is not valid JSON",
        JsonRejection::JsonDataError(_) => "Invalid field type in request",
        _ => "Invalid request body",
    };
    AppError::bad_request(message).with_detail(body_text)
}

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(rejection_error)?;

        value
            .validate()
            .map_err(|errors| from_validation_errors(&errors))?;

        Ok(ValidatedJson(value))
    }
}
