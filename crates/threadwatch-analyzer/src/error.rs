use thiserror::Error;
use threadwatch_llm::GatewayError;
use threadwatch_persist::PersistError;

/// The model reply did not have the promised shape
#[derive(Error, Debug)]
pub enum ResponseError {
    #[error("Reply does not match the analysis schema: {0}")]
    Schema(#[from] serde_json::Error),

    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: String },
}

/// Why one email contributed nothing to the thread
#[derive(Error, Debug)]
pub enum EmailStepError {
    #[error("Model call failed: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Invalid analysis reply: {0}")]
    Response(#[from] ResponseError),

    #[error("Persistence failed: {0}")]
    Persist(#[from] PersistError),
}
