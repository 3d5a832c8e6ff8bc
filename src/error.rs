use thiserror::Error;

/// Main error type of the IPQC extension.
/// Aggregates the errors of every module so a failed run surfaces as one message.
#[derive(Error, Debug)]
pub(crate) enum IpqcError {
    #[error("{0}")]
    WithContextError(String),

    #[error("{0}")]
    SpreadsheetError(#[from] crate::spreadsheet::SpreadsheetError),

    #[error("{0}")]
    ConfigError(#[from] crate::config::ConfigError),

    #[error("{0}")]
    ExportError(#[from] crate::export::ExportError),

    #[error("{0}")]
    ExtensionError(#[from] crate::extension::ExtensionError),
}

pub(crate) trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for Result<T, IpqcError> {
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|e| IpqcError::WithContextError(format!("{}: {}", message, e)))
    }
}
