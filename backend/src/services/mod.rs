pub mod baseline;
pub mod classifier;
pub mod planner;
pub mod price_store;
pub mod schedule_builder;
pub mod schedule_executor;
pub mod settings;

/// Error types for schedule planning and persistence
#[derive(Debug, Clone)]
pub enum ScheduleError {
    /// Automation is globally switched off; nothing to do, not retried.
    AutomationDisabled,
    /// Settings violate a planner invariant (e.g. min >= max temp).
    InvalidSettings(String),
    /// No ingested prices for the requested date; the caller should retry
    /// later or escalate.
    NoPriceData(chrono::NaiveDate),
    /// Storage failure; fatal for the current operation, safe to retry the
    /// whole operation.
    Persistence(String),
}

impl std::fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScheduleError::AutomationDisabled => write!(f, "Automation is disabled"),
            ScheduleError::InvalidSettings(msg) => write!(f, "Invalid settings: {}", msg),
            ScheduleError::NoPriceData(date) => {
                write!(f, "No price data available for {}", date)
            }
            ScheduleError::Persistence(msg) => write!(f, "Persistence error: {}", msg),
        }
    }
}

impl std::error::Error for ScheduleError {}

impl From<diesel::result::Error> for ScheduleError {
    fn from(e: diesel::result::Error) -> Self {
        ScheduleError::Persistence(e.to_string())
    }
}
