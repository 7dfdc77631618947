use thiserror::Error;

/// Failure talking to an external provider. Callers of the public fetch
/// functions never see this: it is logged and turned into "no data".
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{provider} returned HTTP {status}: {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("failed to parse {provider} response: {message}")]
    Parse {
        provider: &'static str,
        message: String,
    },

    #[error("{provider} reported an error: {message}")]
    Provider {
        provider: &'static str,
        message: String,
    },
}

impl FetchError {
    /// Transport failures, timeouts, throttling and server errors are worth
    /// another attempt; everything else will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Network(_) => true,
            FetchError::Status { status, .. } => *status >= 500 || *status == 429,
            FetchError::Parse { .. } | FetchError::Provider { .. } => false,
        }
    }

    pub(crate) fn status(provider: &'static str, status: reqwest::StatusCode, body: &str) -> Self {
        FetchError::Status {
            provider,
            status: status.as_u16(),
            body: truncate(body, 300),
        }
    }

    pub(crate) fn parse(provider: &'static str, message: impl ToString) -> Self {
        FetchError::Parse {
            provider,
            message: message.to_string(),
        }
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &s[..idx]),
        None => s.to_string(),
    }
}
