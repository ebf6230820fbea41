// src/handlers/error.rs
use std::fmt;
use warp::http::StatusCode;
use warp::reject::Reject;

use crate::error::DashboardError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    BadRequest,
    NotFound,
    Upstream,
    Internal,
}

#[derive(Debug, Clone)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        ApiError {
            kind,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::new(ApiErrorKind::BadRequest, message)
    }

    pub fn status_code(&self) -> StatusCode {
        match self.kind {
            ApiErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ApiErrorKind::NotFound => StatusCode::NOT_FOUND,
            ApiErrorKind::Upstream => StatusCode::BAD_GATEWAY,
            ApiErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DashboardError> for ApiError {
    fn from(e: DashboardError) -> Self {
        let kind = match &e {
            DashboardError::NoData { .. } | DashboardError::UnknownIndustry(_) => ApiErrorKind::NotFound,
            DashboardError::InvalidTicker(_) => ApiErrorKind::BadRequest,
            DashboardError::Network(_) | DashboardError::Upstream(_) => ApiErrorKind::Upstream,
            DashboardError::Config(_) => ApiErrorKind::Internal,
        };
        ApiError::new(kind, e.to_string())
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}
impl Reject for ApiError {}

/// Log and convert a service error into a warp rejection.
pub fn reject(e: DashboardError) -> warp::Rejection {
    log::error!("Request failed: {}", e);
    warp::reject::custom(ApiError::from(e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn no_data_maps_to_not_found() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let err = ApiError::from(DashboardError::NoData { ticker: "ZZZZ".into(), start: day, end: day });
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert!(err.message.contains("ZZZZ"));
    }

    #[test]
    fn upstream_maps_to_bad_gateway() {
        let err = ApiError::from(DashboardError::upstream("boom"));
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(ApiError::bad_request("x").status_code(), StatusCode::BAD_REQUEST);
    }
}
