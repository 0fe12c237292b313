use futures::channel::oneshot;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier correlating a request with its reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallId(pub u64);

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named request from the UI layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodCall {
    /// Correlation id chosen by the caller. Must be unique among in-flight
    /// directory picks.
    pub id: CallId,
    /// Operation name.
    pub method: String,
    /// Operation arguments; the shape depends on the method.
    #[serde(default)]
    pub args: serde_json::Value,
}

impl MethodCall {
    /// Create a call with no arguments.
    pub fn new(id: CallId, method: impl Into<String>) -> Self {
        Self {
            id,
            method: method.into(),
            args: serde_json::Value::Null,
        }
    }

    /// Attach arguments.
    #[must_use]
    pub fn with_args(mut self, args: serde_json::Value) -> Self {
        self.args = args;
        self
    }
}

/// Error kinds reported to the UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The document or its output stream could not be obtained.
    SaveFailed,
    /// Any other failure; the message carries the underlying error text.
    Exception,
    /// The directory chooser was dismissed, timed out, or abandoned.
    Cancelled,
}

/// The single reply every request resolves with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Reply {
    /// The operation succeeded.
    Success {
        /// Result value, e.g. a folder handle string or `"Saved"`.
        value: serde_json::Value,
    },
    /// The operation failed.
    Error {
        /// Error kind.
        code: ErrorCode,
        /// Human-readable detail, forwarded to the caller verbatim.
        message: String,
    },
    /// The method name is not part of the bridge contract.
    NotImplemented,
}

impl Reply {
    /// Successful reply carrying `value`.
    pub fn success(value: impl Into<serde_json::Value>) -> Self {
        Self::Success {
            value: value.into(),
        }
    }

    /// Error reply with `code` and `message`.
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Error {
            code,
            message: message.into(),
        }
    }
}

/// Typed arguments of the `saveEncryptedFileToUri` method.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveDocumentArgs {
    /// Folder handle obtained from a directory pick.
    pub uri: String,
    /// Requested document name.
    pub file_name: String,
    /// Full payload to write.
    pub bytes: Vec<u8>,
}

/// A request paired with the slot its reply is sent into.
#[derive(Debug)]
pub struct Envelope {
    /// The request.
    pub call: MethodCall,
    /// Oneshot slot receiving the single reply.
    pub reply_to: oneshot::Sender<Reply>,
}

impl Envelope {
    /// Pair a call with a fresh reply slot; await the receiver for the reply.
    #[must_use]
    pub fn new(call: MethodCall) -> (Self, oneshot::Receiver<Reply>) {
        let (reply_to, rx) = oneshot::channel();
        (Self { call, reply_to }, rx)
    }
}
