pub mod gcp;

#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("Secret manager error: {0}")]
    Client(Box<dyn std::error::Error + Send + Sync>),
    #[error("Secret '{0}' has no payload")]
    EmptyPayload(String),
    #[error("Secret '{0}' is not valid UTF-8")]
    NotUtf8(String),
}
