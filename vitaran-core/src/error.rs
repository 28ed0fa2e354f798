use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Graph not built yet")]
    GraphNotReady,
    #[error("Map source error: {0}")]
    MapSource(String),
    #[error("Map payload error: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
