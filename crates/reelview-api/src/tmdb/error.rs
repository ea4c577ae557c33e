//! Failure classification for TMDB requests.

use reqwest::StatusCode;

/// Classified TMDB request failure.
///
/// Carried as the root cause inside `anyhow::Error`; callers that need to
/// tell failures apart use `anyhow::Error::downcast_ref::<TmdbError>()`.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum TmdbError {
    /// No API token was configured.
    ConfigurationMissing(String),
    /// Connection failure, timeout, or interrupted body read.
    Network(reqwest::Error),
    /// The server answered with a non-2xx status.
    HttpStatus {
        /// HTTP status code.
        status: StatusCode,
        /// TMDB `status_message`, or the raw body when it was not JSON.
        message: String,
    },
    /// The response body was not the expected JSON shape.
    Decode(serde_json::Error),
}

impl TmdbError {
    /// Returns a short message suitable for showing to a user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::ConfigurationMissing(_) => String::from("TMDB API token is not configured."),
            Self::Network(e) if e.is_timeout() => {
                String::from("The movie service took too long to respond. Please try again.")
            }
            Self::Network(_) => {
                String::from("Could not reach the movie service. Check your connection.")
            }
            Self::HttpStatus { status, .. } if *status == StatusCode::NOT_FOUND => {
                String::from("That movie could not be found.")
            }
            Self::HttpStatus { status, .. } if *status == StatusCode::UNAUTHORIZED => {
                String::from("The movie service rejected the API token.")
            }
            Self::HttpStatus { status, .. } => {
                format!("Failed to fetch movies (HTTP {}).", status.as_u16())
            }
            Self::Decode(_) => String::from("The movie service sent an unexpected response."),
        }
    }
}

impl std::fmt::Display for TmdbError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConfigurationMissing(what) => write!(f, "configuration missing: {what}"),
            Self::Network(e) => write!(f, "network failure: {e}"),
            Self::HttpStatus { status, message } => {
                write!(f, "TMDB API error (HTTP {status}): {message}")
            }
            Self::Decode(e) => write!(f, "failed to decode JSON response: {e}"),
        }
    }
}

impl std::error::Error for TmdbError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Network(e) => Some(e),
            Self::Decode(e) => Some(e),
            Self::ConfigurationMissing(_) | Self::HttpStatus { .. } => None,
        }
    }
}

/// Returns the user-facing message for any error produced by the client.
///
/// Errors that were not classified as [`TmdbError`] fall back to a generic
/// message; the full chain belongs in the logs, not on screen.
#[must_use]
pub fn user_message(err: &anyhow::Error) -> String {
    err.downcast_ref::<TmdbError>().map_or_else(
        || String::from("Something went wrong while fetching movies."),
        TmdbError::user_message,
    )
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use anyhow::Context;

    use super::*;

    #[test]
    fn test_http_status_display_includes_message() {
        // Arrange
        let err = TmdbError::HttpStatus {
            status: StatusCode::UNAUTHORIZED,
            message: String::from("Invalid API key"),
        };

        // Act
        let text = err.to_string();

        // Assert
        assert!(text.contains("TMDB API error"));
        assert!(text.contains("401"));
        assert!(text.contains("Invalid API key"));
    }

    #[test]
    fn test_user_message_hides_details() {
        // Arrange
        let err = TmdbError::HttpStatus {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: String::from("stack trace goes here"),
        };

        // Act
        let text = err.user_message();

        // Assert
        assert_eq!(text, "Failed to fetch movies (HTTP 500).");
    }

    #[test]
    fn test_user_message_through_context() {
        // Arrange
        let result: Result<(), TmdbError> = Err(TmdbError::HttpStatus {
            status: StatusCode::NOT_FOUND,
            message: String::from("The resource you requested could not be found."),
        });
        let err = result.context("movie/0 request failed").unwrap_err();

        // Act
        let text = user_message(&err);

        // Assert
        assert_eq!(text, "That movie could not be found.");
    }

    #[test]
    fn test_user_message_unclassified() {
        // Arrange
        let err = anyhow::anyhow!("boom");

        // Act
        let text = user_message(&err);

        // Assert
        assert_eq!(text, "Something went wrong while fetching movies.");
    }
}
