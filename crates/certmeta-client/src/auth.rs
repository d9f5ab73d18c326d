//! Request credentials for the CA and CLM services.

use reqwest::RequestBuilder;

/// Header carrying the CA account API key.
pub const CA_API_KEY_HEADER: &str = "X-DC-DEVKEY";

/// Static credentials attached to every request.
///
/// The [`Debug`] impl redacts secrets so credentials can sit inside logged
/// structs.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// API key sent in a named header.
    ApiKey { header: String, key: String },
    /// HTTP Basic authentication.
    Basic { username: String, password: String },
}

impl Credentials {
    /// CA API key credentials.
    #[must_use]
    pub fn ca_api_key(key: impl Into<String>) -> Self {
        Self::ApiKey {
            header: CA_API_KEY_HEADER.to_string(),
            key: key.into(),
        }
    }

    #[must_use]
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Attach the credentials to a request.
    pub(crate) fn apply(&self, builder: RequestBuilder) -> RequestBuilder {
        match self {
            Self::ApiKey { header, key } => builder.header(header.as_str(), key.as_str()),
            Self::Basic { username, password } => builder.basic_auth(username, Some(password)),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ApiKey { header, .. } => f
                .debug_struct("ApiKey")
                .field("header", header)
                .field("key", &"[REDACTED]")
                .finish(),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"[REDACTED]")
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_secrets() {
        let key = format!("{:?}", Credentials::ca_api_key("super-secret"));
        assert!(key.contains("X-DC-DEVKEY"));
        assert!(!key.contains("super-secret"));

        let basic = format!("{:?}", Credentials::basic("DOMAIN\\svc", "hunter2"));
        assert!(basic.contains("DOMAIN\\\\svc"));
        assert!(!basic.contains("hunter2"));
    }
}
