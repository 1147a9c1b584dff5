//! Data models and structures
//!
//! Defines the nutrition records returned by the lookup service, the totals
//! derived from them, and the environment-driven configuration.

use crate::caption::CaptionModelVariant;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// One food item recognized by the nutrition service within a query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NutritionItem {
    pub name: String,
    /// kcal
    pub calories: f64,
    #[serde(rename = "carbohydrates_total_g")]
    pub carbohydrates_g: f64,
    pub protein_g: f64,
    #[serde(rename = "fat_total_g")]
    pub fat_g: f64,
}

impl NutritionItem {
    pub fn new(name: &str, calories: f64, carbohydrates_g: f64, protein_g: f64, fat_g: f64) -> Self {
        Self {
            name: name.to_string(),
            calories,
            carbohydrates_g,
            protein_g,
            fat_g,
        }
    }
}

// CalorieNinjas response envelope. Fields other than `items` are ignored.
#[derive(Debug, Deserialize)]
pub struct NutritionResponse {
    pub items: Vec<NutritionItem>,
}

/// Sum of every returned item, used for the "total calories" summary line.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct NutritionTotals {
    pub calories: f64,
    pub carbohydrates_g: f64,
    pub protein_g: f64,
    pub fat_g: f64,
}

impl NutritionTotals {
    pub fn from_items(items: &[NutritionItem]) -> Self {
        items.iter().fold(Self::default(), |acc, item| Self {
            calories: acc.calories + item.calories,
            carbohydrates_g: acc.carbohydrates_g + item.carbohydrates_g,
            protein_g: acc.protein_g + item.protein_g,
            fat_g: acc.fat_g + item.fat_g,
        })
    }
}

// Configuration
pub const DEFAULT_NUTRITION_API_URL: &str = "https://api.calorieninjas.com";
pub const DEFAULT_NUTRITION_TIMEOUT_SECS: u64 = 15;

#[derive(Clone)]
pub struct Config {
    pub nutrition_api_key: String,
    pub nutrition_api_url: String,
    pub nutrition_timeout: Duration,
    pub caption_model: CaptionModelVariant,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("nutrition_api_key", &"<redacted>")
            .field("nutrition_api_url", &self.nutrition_api_url)
            .field("nutrition_timeout", &self.nutrition_timeout)
            .field("caption_model", &self.caption_model)
            .finish()
    }
}

impl Config {
    /// Load configuration from the process environment, honoring a `.env` file.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let nutrition_api_key = lookup("CALORIENINJAS_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                Error::Config(
                    "CALORIENINJAS_API_KEY not set; add it to the environment or a .env file"
                        .to_string(),
                )
            })?;

        let nutrition_api_url = lookup("NUTRITION_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_NUTRITION_API_URL.to_string());

        let timeout_secs = match lookup("NUTRITION_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(Error::Config(format!(
                        "NUTRITION_TIMEOUT_SECS must be a positive integer, got '{}'",
                        raw
                    )))
                }
            },
            None => DEFAULT_NUTRITION_TIMEOUT_SECS,
        };

        let caption_model = match lookup("CAPTION_MODEL") {
            Some(raw) => raw.parse()?,
            None => CaptionModelVariant::default(),
        };

        Ok(Self {
            nutrition_api_key,
            nutrition_api_url,
            nutrition_timeout: Duration::from_secs(timeout_secs),
            caption_model,
        })
    }
}
