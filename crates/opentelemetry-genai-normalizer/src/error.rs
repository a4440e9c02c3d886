//! Error types for the normalizer.

use thiserror::Error;

/// A specialised Result type for normalizer construction.
pub type Result<T> = std::result::Result<T, NormalizerError>;

/// Errors raised while setting the normalizer up.
///
/// None of these can happen per batch; batch processing only fails when the
/// downstream consumer does.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum NormalizerError {
    /// Configuration error.
    #[error("configuration error")]
    Config(#[source] Box<figment::Error>),

    /// The normalizer was built without a downstream consumer.
    #[error("next consumer is nil")]
    MissingConsumer,
}

impl From<figment::Error> for NormalizerError {
    fn from(err: figment::Error) -> Self {
        NormalizerError::Config(Box::new(err))
    }
}
