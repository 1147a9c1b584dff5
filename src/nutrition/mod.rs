//! Nutrition lookup
//!
//! Sends a free-text food description to the CalorieNinjas nutrition API and
//! returns per-item calorie and macronutrient estimates.

pub mod client;
pub mod mock;

pub use client::CalorieNinjasClient;
pub use mock::MockNutritionClient;

use crate::models::NutritionItem;
use async_trait::async_trait;
use thiserror::Error;

/// Why a lookup produced no nutrition data.
///
/// These are user-level failures: the pipeline renders them and the user may
/// start over. None of them is retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LookupError {
    /// The service answered with a non-success status. `body` is the raw
    /// response text, untouched.
    #[error("Nutrition API error (status {status}): {body}")]
    Http { status: u16, body: String },

    /// The request never produced a response (DNS, refused connection, timeout).
    #[error("Nutrition service unreachable: {0}")]
    Transport(String),

    /// A success status whose body was not the expected `items` document.
    #[error("Unexpected nutrition API response: {message}")]
    Decode { message: String, body: String },
}

impl LookupError {
    /// Raw response text from the service, when one was received.
    pub fn body(&self) -> Option<&str> {
        match self {
            LookupError::Http { body, .. } | LookupError::Decode { body, .. } => Some(body),
            LookupError::Transport(_) => None,
        }
    }
}

/// Items in service order (possibly none), or the reason there are none.
pub type NutritionResult = std::result::Result<Vec<NutritionItem>, LookupError>;

#[async_trait]
pub trait NutritionService: Send + Sync {
    /// Look up `query` exactly as given. Callers must not pass an empty query.
    async fn lookup(&self, query: &str) -> NutritionResult;
}
