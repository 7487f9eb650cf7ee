//! Error types and handling for the travel curator

use thiserror::Error;

/// Main error type for the travel curator
#[derive(Error, Debug)]
pub enum CuratorError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Form or request validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Completion endpoint errors
    #[error("API error{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    Api {
        status: Option<u16>,
        message: String,
    },

    /// The model answered without any text
    #[error("No itinerary generated. Check API key or request.")]
    EmptyCompletion,

    /// Activity search and scraping errors
    #[error("Search error: {message}")]
    Search { message: String },

    /// Page or export template failures
    #[error("Render error: {message}")]
    Render { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl CuratorError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create an API error without an HTTP status (transport failures)
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            status: None,
            message: message.into(),
        }
    }

    /// Create an API error for a non-success HTTP status
    pub fn api_status<S: Into<String>>(status: u16, message: S) -> Self {
        Self::Api {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Create a new search error
    pub fn search<S: Into<String>>(message: S) -> Self {
        Self::Search {
            message: message.into(),
        }
    }

    /// Whether the error was caused by the user's input rather than a collaborator
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, CuratorError::Validation { .. })
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            CuratorError::Config { .. } => {
                "Configuration error. Please check your config file and API key.".to_string()
            }
            CuratorError::Validation { message } => message.clone(),
            CuratorError::Api {
                status: Some(401 | 403),
                ..
            } => "The language model rejected the API key. Please check OPENAI_API_KEY.".to_string(),
            CuratorError::Api { .. } => {
                "Could not generate itinerary. Check API key and connection.".to_string()
            }
            CuratorError::EmptyCompletion => self.to_string(),
            CuratorError::Search { .. } => {
                "Activity search failed. Try again without scraping enabled.".to_string()
            }
            CuratorError::Render { .. } => "Could not render the page.".to_string(),
            CuratorError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}

impl From<askama::Error> for CuratorError {
    fn from(err: askama::Error) -> Self {
        Self::Render {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for CuratorError {
    fn from(err: reqwest::Error) -> Self {
        Self::Api {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

impl From<reqwest_middleware::Error> for CuratorError {
    fn from(err: reqwest_middleware::Error) -> Self {
        match err {
            reqwest_middleware::Error::Reqwest(e) => e.into(),
            reqwest_middleware::Error::Middleware(e) => Self::api(format!("{e:#}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = CuratorError::config("missing API key");
        assert!(matches!(config_err, CuratorError::Config { .. }));

        let api_err = CuratorError::api("connection failed");
        assert!(matches!(api_err, CuratorError::Api { status: None, .. }));

        let validation_err = CuratorError::validation("Please enter a destination.");
        assert!(validation_err.is_validation());
    }

    #[test]
    fn test_api_error_display_includes_status() {
        let err = CuratorError::api_status(500, "boom");
        assert_eq!(err.to_string(), "API error (500): boom");

        let err = CuratorError::api("timed out");
        assert_eq!(err.to_string(), "API error: timed out");
    }

    #[test]
    fn test_user_messages() {
        let config_err = CuratorError::config("test");
        assert!(config_err.user_message().contains("Configuration error"));

        let auth_err = CuratorError::api_status(401, "unauthorized");
        assert!(auth_err.user_message().contains("OPENAI_API_KEY"));

        let api_err = CuratorError::api_status(503, "unavailable");
        assert!(api_err.user_message().contains("Check API key and connection"));

        let validation_err = CuratorError::validation("Please enter a destination.");
        assert_eq!(validation_err.user_message(), "Please enter a destination.");
    }

    #[test]
    fn test_render_error_conversion() {
        let err: CuratorError = askama::Error::from(std::fmt::Error).into();
        assert!(matches!(err, CuratorError::Render { .. }));
        assert_eq!(err.user_message(), "Could not render the page.");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CuratorError = io_err.into();
        assert!(matches!(err, CuratorError::Io { .. }));
    }
}
