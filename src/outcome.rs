//! Terminal request classification.
//!
//! Every request ends up as exactly one `Outcome`, on whichever side observed
//! it: the sender classifies completed or failed exchanges, the receiver
//! classifies what it decided to do with an inbound request. Outcomes are
//! metric labels only; they are never persisted.

use std::fmt;

/// Terminal classification of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// HTTP 200 exchange, or a receiver decision to answer OK.
    Success,
    /// HTTP 500 exchange, or a receiver decision to answer with an error.
    ServerError,
    /// Sender-side: the request hit the client timeout or was aborted.
    Timeout,
    /// Sender-side: the connection could not be established.
    ConnectionError,
    /// Any other status or failure.
    OtherError,
    /// Receiver-side: the request was deliberately left unanswered.
    Hang,
    /// Receiver-side: the request arrived during a scheduled outage.
    Outage,
}

impl Outcome {
    /// Stable label used in metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::ServerError => "server_error",
            Self::Timeout => "timeout",
            Self::ConnectionError => "connection_error",
            Self::OtherError => "other_error",
            Self::Hang => "hang",
            Self::Outage => "outage",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
