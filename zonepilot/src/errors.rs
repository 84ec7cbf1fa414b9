use thiserror::Error;

#[derive(Error, Debug)]
pub enum AutomationError {
    #[error("Automation request expired: {0}")]
    ExpiredRequest(String),

    #[error("User left the settings app: {0}")]
    AbandonedNavigation(String),

    #[error("Could not open settings: {0}")]
    LaunchFailure(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Action failed: {0}")]
    ActionFailed(String),

    #[error("Platform-specific error: {0}")]
    PlatformError(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AutomationError {
    /// Soft failures only drive retry and hint logic inside a stage handler.
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            AutomationError::ElementNotFound(_) | AutomationError::ActionFailed(_)
        )
    }
}
