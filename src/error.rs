//! Error types for the engine.

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error produced by the host's page fetcher.
///
/// The engine never retries a failed fetch; the boxed error is carried out to
/// the caller unchanged inside [`Error::Page`].
pub type PageError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur in the engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A row aspect-ratio threshold below one is a host configuration bug.
    #[error("row aspect ratio threshold must be at least 1, got {0}")]
    Threshold(f64),

    /// The tiler was handed an empty item sequence.
    #[error("cannot tile an empty item sequence")]
    NoItems,

    /// `attach` was called on an engine that already has a viewport.
    #[error("engine is already attached to a viewport")]
    AlreadyAttached,

    /// A method that needs a viewport was called before `attach`.
    #[error("engine is not attached to a viewport")]
    NotAttached,

    /// Any call after `destroy` is a programmer error.
    #[error("engine has been destroyed")]
    Destroyed,

    /// The host's page fetcher failed.
    #[error("page fetch failed: {0}")]
    Page(#[source] PageError),
}

impl Error {
    /// Wraps a host fetch failure.
    pub fn page(source: impl Into<PageError>) -> Self {
        Self::Page(source.into())
    }
}
