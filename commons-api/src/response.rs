//! Success response envelopes.

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;

/// Standard `{"status":"success","data":...}` envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    /// Response status
    pub status: &'static str,
    /// Response data
    pub data: T,
    /// Optional message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response with data.
    #[must_use]
    pub fn success(data: T) -> Self {
        Self {
            status: "success",
            data,
            message: None,
        }
    }

    /// Creates a successful response with data and message.
    #[must_use]
    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            status: "success",
            data,
            message: Some(message.into()),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> axum::response::Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Same envelope as [`ApiResponse`], returned with HTTP 201.
#[derive(Debug, Serialize)]
pub struct CreatedResponse<T>
where
    T: Serialize,
{
    /// Response status
    pub status: &'static str,
    /// Created resource
    pub data: T,
}

impl<T: Serialize> CreatedResponse<T> {
    /// Creates a new created response.
    #[must_use]
    pub fn new(data: T) -> Self {
        Self {
            status: "success",
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for CreatedResponse<T> {
    fn into_response(self) -> axum::response::Response {
        (StatusCode::CREATED, Json(self)).into_response()
    }
}

/// Paginated list envelope.
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T>
where
    T: Serialize,
{
    /// Response status
    pub status: &'static str,
    /// Items of the requested page
    pub data: Vec<T>,
    /// Pagination info
    pub pagination: PaginationInfo,
}

/// Pagination information.
#[derive(Debug, Serialize)]
pub struct PaginationInfo {
    /// Current page number (1-indexed)
    pub page: u32,
    /// Items per page
    pub per_page: u32,
    /// Total number of items
    pub total: u64,
    /// Total number of pages
    pub total_pages: u64,
    /// Has next page
    pub has_next: bool,
}

impl PaginationInfo {
    /// Creates pagination info from parameters.
    #[must_use]
    pub fn new(page: u32, per_page: u32, total: u64) -> Self {
        let total_pages = total.div_ceil(u64::from(per_page.max(1)));
        Self {
            page,
            per_page,
            total,
            total_pages,
            has_next: u64::from(page) < total_pages,
        }
    }
}

impl<T: Serialize> PaginatedResponse<T> {
    /// Slices one page out of the full item list.
    #[must_use]
    pub fn paginate(items: Vec<T>, page: u32, per_page: u32) -> Self {
        let page = page.max(1);
        let per_page = per_page.max(1);
        let total = items.len() as u64;
        let skip = usize::try_from((page - 1).saturating_mul(per_page)).unwrap_or(usize::MAX);
        let data = items
            .into_iter()
            .skip(skip)
            .take(per_page as usize)
            .collect();

        Self {
            status: "success",
            data,
            pagination: PaginationInfo::new(page, per_page, total),
        }
    }
}

impl<T: Serialize> IntoResponse for PaginatedResponse<T> {
    fn into_response(self) -> axum::response::Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_response_success() {
        let response = ApiResponse::success("test data");
        assert_eq!(response.status, "success");
        assert_eq!(response.data, "test data");
        assert!(response.message.is_none());

        let response = ApiResponse::success_with_message(1, "Domain verified");
        assert_eq!(response.message.as_deref(), Some("Domain verified"));
    }

    #[test]
    fn test_pagination_info() {
        let info = PaginationInfo::new(2, 10, 45);
        assert_eq!(info.total_pages, 5);
        assert!(info.has_next);

        let info = PaginationInfo::new(5, 10, 45);
        assert!(!info.has_next);

        let info = PaginationInfo::new(1, 10, 0);
        assert_eq!(info.total_pages, 0);
        assert!(!info.has_next);
    }

    #[test]
    fn test_paginate_slices_items() {
        let response = PaginatedResponse::paginate((1..=25).collect(), 3, 10);
        assert_eq!(response.data, vec![21, 22, 23, 24, 25]);
        assert_eq!(response.pagination.total, 25);

        let response = PaginatedResponse::paginate((1..=5).collect::<Vec<_>>(), 0, 0);
        assert_eq!(response.data, vec![1]);
        assert_eq!(response.pagination.page, 1);
    }
}
