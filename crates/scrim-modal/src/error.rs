#![forbid(unsafe_code)]

use std::path::PathBuf;

use scrim_dom::DomError;

/// Errors returned by the modal controller and options loading.
#[derive(Debug, thiserror::Error)]
pub enum ModalError {
    /// A document operation failed (typically an element from another
    /// document, or the body/root passed as the modal element).
    #[error(transparent)]
    Dom(#[from] DomError),

    #[error("invalid modal options TOML: {0}")]
    InvalidToml(String),

    #[error("invalid modal options JSON: {0}")]
    InvalidJson(String),

    #[error("failed to read modal options from {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
