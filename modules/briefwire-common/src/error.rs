use thiserror::Error;

#[derive(Error, Debug)]
pub enum BriefwireError {
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Unparseable model response: {0}")]
    Parse(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
