pub mod ingredients;
pub mod public;
pub mod recipes;
pub mod tags;
pub mod toggle;
pub mod users;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{IntoParams, OpenApi, ToSchema};

/// Shared error response used by all endpoints
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Validation failure with one message per offending payload field
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FieldErrorResponse {
    pub errors: BTreeMap<String, String>,
}

pub const DEFAULT_PAGE_SIZE: i64 = 6;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Page-number pagination parameters shared by list endpoints.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct PageParams {
    /// 1-based page number (default: 1)
    pub page: Option<i64>,
    /// Items per page (default: 6, max: 100)
    pub limit: Option<i64>,
}

impl PageParams {
    /// Clamp to valid bounds and return (page, limit, offset).
    pub fn resolve(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        (page, limit, (page - 1) * limit)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginationMetadata {
    /// Total number of items across all pages
    pub count: i64,
    /// Current 1-based page number
    pub page: i64,
    /// Items per page
    pub limit: i64,
}

/// Generate the complete OpenAPI spec by merging all module specs
pub fn openapi() -> utoipa::openapi::OpenApi {
    // Base spec with shared components and security
    #[derive(OpenApi)]
    #[openapi(components(schemas(ErrorResponse, FieldErrorResponse, PaginationMetadata)))]
    struct BaseApi;

    let mut spec = BaseApi::openapi();

    if let Some(components) = spec.components.as_mut() {
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }

    // Merge in each module's spec
    let modules: Vec<utoipa::openapi::OpenApi> = vec![
        public::ApiDoc::openapi(),
        users::ApiDoc::openapi(),
        tags::ApiDoc::openapi(),
        ingredients::ApiDoc::openapi(),
        recipes::ApiDoc::openapi(),
    ];

    for module_spec in modules {
        spec.paths.paths.extend(module_spec.paths.paths);

        if let Some(module_components) = module_spec.components {
            if let Some(spec_components) = spec.components.as_mut() {
                spec_components.schemas.extend(module_components.schemas);
            }
        }
    }

    spec
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_params_defaults() {
        let (page, limit, offset) = PageParams::default().resolve();
        assert_eq!((page, limit, offset), (1, DEFAULT_PAGE_SIZE, 0));
    }

    #[test]
    fn test_page_params_clamped() {
        let params = PageParams {
            page: Some(0),
            limit: Some(100_000),
        };
        let (page, limit, offset) = params.resolve();
        assert_eq!((page, limit, offset), (1, MAX_PAGE_SIZE, 0));
    }

    #[test]
    fn test_page_params_offset() {
        let params = PageParams {
            page: Some(3),
            limit: Some(6),
        };
        let (_, _, offset) = params.resolve();
        assert_eq!(offset, 12);
    }

    #[test]
    fn test_error_response_shape() {
        let body = serde_json::to_value(ErrorResponse {
            error: "Recipe not found".to_string(),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "error": "Recipe not found" }));
    }

    #[test]
    fn test_field_error_response_shape() {
        let mut errors = BTreeMap::new();
        errors.insert("name".to_string(), "Name must not be empty".to_string());
        let body = serde_json::to_value(FieldErrorResponse { errors }).unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "errors": { "name": "Name must not be empty" } })
        );
    }
}
