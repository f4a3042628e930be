// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `constants.rs`

#[cfg(test)]
mod tests {
    use super::super::*;

    #[test]
    fn test_poll_defaults_are_positive() {
        #[allow(clippy::assertions_on_constants)]
        {
            assert!(DEFAULT_POLL_INTERVAL_SECS > 0, "interval must not be zero");
            assert!(
                DEFAULT_POLL_TIMEOUT_SECS > DEFAULT_POLL_INTERVAL_SECS,
                "deadline should allow more than one attempt"
            );
        }
    }

    #[test]
    fn test_timeout_messages() {
        assert_eq!(CREATE_TIMEOUT_MESSAGE, "Timed out waiting for Create");
        assert_eq!(DELETE_TIMEOUT_MESSAGE, "Timed out waiting for Delete");
    }

    #[test]
    fn test_token_strategies() {
        assert!(TOKEN_AUTH_STRATEGIES.contains(&"openshift"));
        assert!(!TOKEN_AUTH_STRATEGIES.contains(&"anonymous"));
    }
}
