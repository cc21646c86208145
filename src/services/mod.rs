//! Domain logic and clients for the external collaborators.

pub mod identity;
pub mod llm;
pub mod object_store;
pub mod pairing;
pub mod reflection;
pub mod reflection_job;
pub mod streaks;

/// Failure of a call to an external service (auth provider, object store,
/// language model).
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The service understood the request and refused it.
    #[error("{0}")]
    Rejected(String),

    #[error("credentials rejected: {0}")]
    Unauthorized(String),

    #[error("unexpected response: {0}")]
    Malformed(String),

    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}
