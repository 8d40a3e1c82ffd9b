use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

/// Handler success value: the resource itself as the JSON body.
///
/// Errors go through `ApiError`, so there is no success envelope.
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub body: T,
    pub status: StatusCode,
    pub location: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 OK
    pub fn success(body: T) -> Self {
        Self {
            body,
            status: StatusCode::OK,
            location: None,
        }
    }

    /// 201 Created, with the new resource's path in `Location`
    pub fn created(body: T, location: impl Into<String>) -> Self {
        Self {
            body,
            status: StatusCode::CREATED,
            location: Some(location.into()),
        }
    }
}

impl ApiResponse<()> {
    /// 204 No Content
    pub fn no_content() -> Self {
        Self {
            body: (),
            status: StatusCode::NO_CONTENT,
            location: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        if self.status == StatusCode::NO_CONTENT {
            return self.status.into_response();
        }

        let mut response = (self.status, Json(self.body)).into_response();
        if let Some(value) = self.location.and_then(|l| HeaderValue::from_str(&l).ok()) {
            response.headers_mut().insert(header::LOCATION, value);
        }
        response
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_sets_location() {
        let response = ApiResponse::created(serde_json::json!({ "id": 1 }), "/api/connectors/1").into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/api/connectors/1");
    }

    #[test]
    fn no_content_has_no_body_type() {
        let response = ApiResponse::no_content().into_response();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.headers().get(header::CONTENT_TYPE).is_none());
    }
}
