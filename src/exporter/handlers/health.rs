use crate::exporter::GIT_COMMIT_HASH;
use axum::{
    body::Body,
    http::{HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

#[derive(Serialize, Deserialize, Debug)]
pub struct Health {
    #[serde(skip_serializing_if = "Option::is_none")]
    commit: Option<String>,
    name: String,
    version: String,
}

fn build_health() -> Health {
    Health {
        commit: Some(GIT_COMMIT_HASH.to_string()).filter(|hash| hash != ":-("),
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }
}

fn create_response_body(method: Method, health: &Health) -> Body {
    if method == Method::GET {
        Json(health).into_response().into_body()
    } else {
        Body::empty()
    }
}

fn create_app_headers(health: &Health) -> HeaderMap {
    let short_hash = health
        .commit
        .as_deref()
        .filter(|s| s.len() > 7)
        .and_then(|s| s.get(0..7))
        .unwrap_or("");

    let header_value = if short_hash.is_empty() {
        format!("{}:{}", health.name, health.version)
    } else {
        format!("{}:{}:{}", health.name, health.version, short_hash)
    };

    match header_value.parse::<HeaderValue>() {
        Ok(x_app_header_value) => {
            debug!("X-App header: {:?}", x_app_header_value);
            let mut headers = HeaderMap::new();
            headers.insert("X-App", x_app_header_value);
            headers
        }
        Err(err) => {
            debug!("Failed to parse X-App header: {}", err);
            HeaderMap::new()
        }
    }
}

/// Liveness endpoint: reports build info unconditionally. There is no local
/// dependency to ping here (unlike the teacher's Postgres connection check)
/// — a region-level scrape failure against AWS is already surfaced through
/// that region's `up` sample on `/metrics`, not through `/health`.
#[instrument(fields(http.route = "/health"))]
pub async fn health(method: Method) -> impl IntoResponse {
    let health = build_health();
    let body = create_response_body(method, &health);
    let headers = create_app_headers(&health);

    debug!("health check ok");
    (StatusCode::OK, headers, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_struct_serialization_with_commit() {
        let health = Health {
            commit: Some("abc123".to_string()),
            name: "test_app".to_string(),
            version: "1.0.0".to_string(),
        };

        let json = serde_json::to_string(&health).unwrap();
        assert!(json.contains("abc123"));
        assert!(json.contains("test_app"));
        assert!(json.contains("1.0.0"));
    }

    #[test]
    fn test_health_struct_serialization_without_commit() {
        let health = Health {
            commit: None,
            name: "test_app".to_string(),
            version: "1.0.0".to_string(),
        };

        let json = serde_json::to_string(&health).unwrap();
        assert!(!json.contains("commit"));
        assert!(json.contains("test_app"));
    }

    #[test]
    fn test_build_health_reports_crate_version() {
        let health = build_health();
        assert_eq!(health.name, env!("CARGO_PKG_NAME"));
        assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_create_response_body_get_is_non_empty() {
        let health = Health {
            commit: Some("test".to_string()),
            name: "test".to_string(),
            version: "1.0".to_string(),
        };

        let body = create_response_body(Method::GET, &health);
        assert!(std::mem::size_of_val(&body) > 0);
    }

    #[test]
    fn test_create_app_headers_full_hash() {
        let health = Health {
            commit: Some("abc123def456".to_string()),
            name: "myapp".to_string(),
            version: "1.2.3".to_string(),
        };

        let headers = create_app_headers(&health);

        let x_app = headers.get("X-App").expect("X-App header should exist");
        let x_app_str = x_app.to_str().unwrap();
        assert_eq!(x_app_str, "myapp:1.2.3:abc123d");
    }

    #[test]
    fn test_create_app_headers_short_hash() {
        let health = Health {
            commit: Some("abc".to_string()),
            name: "myapp".to_string(),
            version: "1.0.0".to_string(),
        };

        let headers = create_app_headers(&health);

        let x_app = headers.get("X-App").expect("X-App header should exist");
        let x_app_str = x_app.to_str().unwrap();
        assert_eq!(x_app_str, "myapp:1.0.0");
    }

    #[test]
    fn test_create_app_headers_no_commit() {
        let health = Health {
            commit: None,
            name: "myapp".to_string(),
            version: "1.0.0".to_string(),
        };

        let headers = create_app_headers(&health);

        let x_app = headers.get("X-App").expect("X-App header should exist");
        let x_app_str = x_app.to_str().unwrap();
        assert_eq!(x_app_str, "myapp:1.0.0");
    }
}
