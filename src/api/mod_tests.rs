// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `api/mod.rs`

#[cfg(test)]
mod tests {
    use crate::api::{ApiRequest, ApiResponse, HttpMethod};
    use crate::errors::ProbeError;

    fn response(status_code: u16, text: &str) -> ApiResponse {
        ApiResponse {
            operation: "graphNamespaces".to_string(),
            status_code,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_request_builder() {
        let request = ApiRequest::new("serviceDetails")
            .with_path("namespace", "bookinfo")
            .with_path("service", "details")
            .with_param("validate", "true")
            .with_method(HttpMethod::Patch)
            .with_data(serde_json::json!({"metadata": {}}));

        assert_eq!(request.method_name, "serviceDetails");
        assert_eq!(request.path.len(), 2);
        assert_eq!(request.params.get("validate").map(String::as_str), Some("true"));
        assert_eq!(request.method, Some(HttpMethod::Patch));
        assert!(request.data.is_some());
    }

    #[test]
    fn test_expect_status_accepts_listed_codes() {
        let ok = response(400, "{}");
        assert!(ok.expect_status(&[200, 400]).is_ok());
    }

    #[test]
    fn test_expect_status_rejects_other_codes() {
        let err = response(500, "boom").expect_status(&[200]).unwrap_err();

        match err {
            ProbeError::UnexpectedStatus {
                operation,
                expected,
                actual,
                reason,
                body,
            } => {
                assert_eq!(operation, "graphNamespaces");
                assert_eq!(expected, vec![200]);
                assert_eq!(actual, 500);
                assert_eq!(reason, "Kiali API internal error (500)");
                assert_eq!(body, "boom");
            }
            other => panic!("expected UnexpectedStatus, got {other:?}"),
        }
    }

    #[test]
    fn test_json_decode_error_names_operation() {
        let err = response(200, "<html>").json_value().unwrap_err();
        assert!(matches!(err, ProbeError::Decode { .. }));
        assert!(err.to_string().contains("graphNamespaces response"));
    }

    #[test]
    fn test_is_success() {
        assert!(response(204, "").is_success());
        assert!(!response(404, "").is_success());
    }

    #[test]
    fn test_http_method_yaml() {
        let method: HttpMethod = serde_yaml::from_str("POST").unwrap();
        assert_eq!(method, HttpMethod::Post);
        assert_eq!(HttpMethod::default().to_string(), "GET");
    }
}
