use thiserror::Error;

pub type Result<T> = std::result::Result<T, OfferError>;

#[derive(Error, Debug)]
pub enum OfferError {
    #[error("Offer not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Input closed while waiting for: {0}")]
    InputClosed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Rejected user input. Interactive flows show the message and ask again.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Value is required.")]
    Required,

    #[error("Invalid categories: {0}. Please select from allowed list.")]
    InvalidCategories(String),

    #[error("At least one category is required.")]
    NoCategories,

    #[error("Invalid country code {0:?}! Must be 2 uppercase letters (e.g., US, GB).")]
    InvalidCountryCode(String),

    #[error("Invalid influencer ID {0:?}! Must be in format INF_1, INF_2, etc.")]
    InvalidInfluencerId(String),

    #[error("Please enter a numeric value! Got {0:?}")]
    NotNumeric(String),

    #[error("Invalid type {0:?}! Please enter one of: CPA, FIXED, CPA_AND_FIXED")]
    InvalidPayoutType(String),

    #[error("Invalid cpaCountryOverrides {0}! Must map country codes to amounts.")]
    InvalidOverrides(String),

    #[error("Please enter \"yes\" or \"no\".")]
    NotYesNo(String),

    #[error("Payout type {kind} requires {field}")]
    MissingAmount {
        kind: &'static str,
        field: &'static str,
    },

    #[error("Payout type {kind} does not accept {field}")]
    UnexpectedAmount {
        kind: &'static str,
        field: &'static str,
    },
}
