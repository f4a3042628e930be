// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! HTTP status code classification for Kiali API responses.
//!
//! Expected status codes are suite data, not part of the probe core: the same
//! invalid request answers 403, 404 or 500 depending on the Kiali release. This
//! module only turns a code into a stable reason label and a readable message so
//! that `UnexpectedStatus` errors and metrics stay consistent.
//!
//! # Usage
//!
//! ```rust
//! use kiali_probe::status_codes::map_status_to_reason;
//!
//! let (reason, message) = map_status_to_reason(404);
//! assert_eq!(reason, "NotFound");
//!
//! let (reason, message) = map_status_to_reason(500);
//! assert_eq!(reason, "KialiInternalError");
//! ```

/// Reason for 2xx responses
pub const REASON_OK: &str = "Ok";

/// Reason for 400 responses
pub const REASON_BAD_REQUEST: &str = "BadRequest";

/// Reason for 401 and 403 responses
pub const REASON_AUTH_FAILED: &str = "AuthFailed";

/// Reason for 404 responses
pub const REASON_NOT_FOUND: &str = "NotFound";

/// Reason for 500 responses
pub const REASON_INTERNAL_ERROR: &str = "KialiInternalError";

/// Reason for 502, 503 and 504 responses
pub const REASON_GATEWAY_ERROR: &str = "GatewayError";

/// Reason for any other code
pub const REASON_UNEXPECTED: &str = "UnexpectedStatus";

/// Map HTTP status code to a reason label and message.
///
/// # HTTP Code Mapping
///
/// | HTTP Code | Reason | Meaning |
/// |-----------|--------|---------|
/// | 2xx | `Ok` | Request served |
/// | 400 | `BadRequest` | Invalid parameters (bad graph type, bad duration) |
/// | 401 | `AuthFailed` | Authentication required |
/// | 403 | `AuthFailed` | Namespace not accessible |
/// | 404 | `NotFound` | Object not found |
/// | 500 | `KialiInternalError` | Internal server error |
/// | 502-504 | `GatewayError` | Route or proxy in front of Kiali failed |
/// | Other | `UnexpectedStatus` | Anything else |
///
/// # Example
///
/// ```rust
/// use kiali_probe::status_codes::map_status_to_reason;
///
/// let (reason, message) = map_status_to_reason(503);
/// assert_eq!(reason, "GatewayError");
/// assert!(message.contains("503"));
/// ```
#[must_use]
pub fn map_status_to_reason(status_code: u16) -> (&'static str, String) {
    match status_code {
        200..=299 => (REASON_OK, format!("Kiali API request served ({status_code})")),
        400 => (
            REASON_BAD_REQUEST,
            "Invalid request to Kiali API (400)".into(),
        ),
        401 => (
            REASON_AUTH_FAILED,
            "Kiali authentication required (401)".into(),
        ),
        403 => (
            REASON_AUTH_FAILED,
            "Kiali authorization failed (403)".into(),
        ),
        404 => (
            REASON_NOT_FOUND,
            "Object not found in Kiali (404)".into(),
        ),
        500 => (
            REASON_INTERNAL_ERROR,
            "Kiali API internal error (500)".into(),
        ),
        502 => (
            REASON_GATEWAY_ERROR,
            "Bad gateway reaching Kiali (502)".into(),
        ),
        503 => (
            REASON_GATEWAY_ERROR,
            "Kiali service unavailable (503)".into(),
        ),
        504 => (
            REASON_GATEWAY_ERROR,
            "Gateway timeout reaching Kiali (504)".into(),
        ),
        _ => (
            REASON_UNEXPECTED,
            format!("Unexpected HTTP status from Kiali ({status_code})"),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_status_200() {
        let (reason, message) = map_status_to_reason(200);
        assert_eq!(reason, REASON_OK);
        assert!(message.contains("200"));
    }

    #[test]
    fn test_map_status_204_is_ok() {
        let (reason, _) = map_status_to_reason(204);
        assert_eq!(reason, REASON_OK);
    }

    #[test]
    fn test_map_status_400() {
        let (reason, message) = map_status_to_reason(400);
        assert_eq!(reason, REASON_BAD_REQUEST);
        assert!(message.contains("400"));
        assert!(message.contains("Invalid"));
    }

    #[test]
    fn test_map_status_401_and_403() {
        assert_eq!(map_status_to_reason(401).0, REASON_AUTH_FAILED);
        assert_eq!(map_status_to_reason(403).0, REASON_AUTH_FAILED);
    }

    #[test]
    fn test_map_status_404() {
        let (reason, message) = map_status_to_reason(404);
        assert_eq!(reason, REASON_NOT_FOUND);
        assert!(message.contains("not found"));
    }

    #[test]
    fn test_map_status_500() {
        let (reason, message) = map_status_to_reason(500);
        assert_eq!(reason, REASON_INTERNAL_ERROR);
        assert!(message.contains("500"));
    }

    #[test]
    fn test_map_status_gateway_errors() {
        for code in [502, 503, 504] {
            let (reason, message) = map_status_to_reason(code);
            assert_eq!(reason, REASON_GATEWAY_ERROR);
            assert!(message.contains(&code.to_string()));
        }
    }

    #[test]
    fn test_map_status_unknown() {
        let (reason, message) = map_status_to_reason(418);
        assert_eq!(reason, REASON_UNEXPECTED);
        assert!(message.contains("418"));
    }
}
