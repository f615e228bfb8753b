use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToastError {
    #[error("Toast notifications are not supported on this platform")]
    UnsupportedPlatform,

    #[error("Application identity unavailable: {0}")]
    IdentityUnavailable(String),

    #[error("Failed to create background dispatcher: {0}")]
    DispatcherCreationFailed(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Failed to read alert field '{field}': {reason}")]
    FieldRead { field: &'static str, reason: String },

    #[error("Failed to dispatch alert initialization: {0}")]
    InitDispatchFailure(String),

    #[error("Not implemented: {0}")]
    NotImplemented(&'static str),

    #[error("Platform error: {0}")]
    Platform(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl ToastError {
    pub(crate) fn field(field: &'static str, err: anyhow::Error) -> Self {
        ToastError::FieldRead {
            field,
            reason: err.to_string(),
        }
    }
}

impl serde::Serialize for ToastError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl From<anyhow::Error> for ToastError {
    fn from(err: anyhow::Error) -> Self {
        ToastError::Other(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ToastError>;
