//! Stream error types

use tessera_shared::SceneError;
use thiserror::Error;

/// Errors raised while writing or reading a scene stream
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("stream I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("stream is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported stream format '{format}' version {version}")]
    UnsupportedFormat { format: String, version: u32 },

    #[error("object {id}: unknown type '{type_name}'")]
    UnknownType { id: u32, type_name: String },

    #[error("object {id} follows object {previous}; ids must be strictly increasing")]
    OutOfOrder { id: u32, previous: u32 },

    #[error("object {id} references object {reference}, which has not been read yet")]
    DanglingReference { id: u32, reference: u32 },

    #[error("object {id} expects a {expected} at reference {reference}, found a {found}")]
    WrongReferenceKind {
        id: u32,
        reference: u32,
        expected: &'static str,
        found: &'static str,
    },

    #[error("object {id} ({type_name}) is malformed: {source}")]
    Malformed {
        id: u32,
        type_name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("root object {0} is not in the stream")]
    MissingRoot(u32),

    #[error("root object {root} is a {found}, not a scene")]
    RootNotScene { root: u32, found: &'static str },

    #[error("stream decoded into an invalid scene: {0}")]
    InvalidScene(#[from] SceneError),
}
