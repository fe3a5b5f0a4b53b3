use thiserror::Error;

/// What kind of failure a chain call hit.
///
/// The submitter decides benign vs. hard outcomes from the kind alone; the
/// message is only for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainErrorKind {
    /// The queue had nothing to flush, usually because a competitor got there first.
    AlreadyFlushed,
    /// Execution reverted for a reason the node did not spell out.
    Reverted,
    /// Replaced by a competing transaction, or the fee bump was too small.
    Underpriced,
    /// Transport failure: timeouts, refused connections, HTTP errors.
    Network,
    /// The node answered with something we could not interpret.
    InvalidResponse,
    Other,
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind:?}: {message}")]
pub struct ChainError {
    pub kind: ChainErrorKind,
    pub message: String,
}

impl ChainError {
    pub fn new(kind: ChainErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Builds an error whose kind is inferred from a raw RPC error message.
    pub fn from_rpc_message(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            kind: classify_rpc_message(&message),
            message,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ChainErrorKind::Network, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ChainErrorKind::InvalidResponse, message)
    }
}

/// Maps JSON-RPC error text onto a [`ChainErrorKind`].
///
/// Nodes report these conditions only as free text, so this is the one place
/// in the crate that matches on error strings.
pub fn classify_rpc_message(message: &str) -> ChainErrorKind {
    let msg = message.to_ascii_lowercase().replace('_', " ");

    if msg.contains("already flushed") || msg.contains("nothing to flush") {
        ChainErrorKind::AlreadyFlushed
    } else if msg.contains("replacement fee too low")
        || msg.contains("underpriced")
        || msg.contains("transaction was replaced")
    {
        ChainErrorKind::Underpriced
    } else if msg.contains("revert") {
        ChainErrorKind::Reverted
    } else if msg.contains("timeout")
        || msg.contains("timed out")
        || msg.contains("connection refused")
        || msg.contains("connection reset")
        || msg.contains("error sending request")
        || msg.contains("429")
        || msg.contains("too many requests")
        || msg.contains("service unavailable")
    {
        ChainErrorKind::Network
    } else if msg.contains("deserialization error") || msg.contains("invalid type") {
        ChainErrorKind::InvalidResponse
    } else {
        ChainErrorKind::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifies_race_losses() {
        assert_eq!(
            classify_rpc_message("execution reverted: already flushed"),
            ChainErrorKind::AlreadyFlushed
        );
        assert_eq!(
            classify_rpc_message("(code: 3, message: execution reverted, data: None)"),
            ChainErrorKind::Reverted
        );
        assert_eq!(
            classify_rpc_message("replacement fee too low"),
            ChainErrorKind::Underpriced
        );
        assert_eq!(
            classify_rpc_message("REPLACEMENT_UNDERPRICED"),
            ChainErrorKind::Underpriced
        );
    }

    #[test]
    fn test_classifies_transport_failures() {
        assert_eq!(
            classify_rpc_message("error sending request for url (https://rpc): operation timed out"),
            ChainErrorKind::Network
        );
        assert_eq!(
            classify_rpc_message("HTTP 429 Too Many Requests"),
            ChainErrorKind::Network
        );
        assert_eq!(
            classify_rpc_message("insufficient funds for gas * price + value"),
            ChainErrorKind::Other
        );
    }
}
