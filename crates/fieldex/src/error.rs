#[derive(thiserror::Error, Debug, serde::Deserialize, serde::Serialize)]
pub enum Error {
    #[error("Generic {0}")]
    Generic(String),

    #[error("Cannot read token artifact: {0}")]
    Ingestion(String),

    #[error("No tokens produced for this document")]
    EmptyDocument,
}
