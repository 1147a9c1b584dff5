//! Application orchestration for one caption-then-lookup request.

use crate::caption::{BlipCaptioner, CaptionService};
use crate::image::load_upload;
use crate::models::{Config, NutritionItem, NutritionTotals};
use crate::nutrition::{CalorieNinjasClient, LookupError, NutritionService};
use crate::Result;
use image::DynamicImage;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info, warn};

/// Every state a single request can pass through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineState {
    Idle,
    ImageReceived,
    Captioning,
    CaptionReady,
    NoFoodDetected,
    LookingUp,
    ItemsReady,
    LookupFailed,
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelineState::NoFoodDetected | PipelineState::ItemsReady | PipelineState::LookupFailed
        )
    }
}

/// How a request ended. Exactly one of these is reached per request.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The caption was empty; the nutrition service was never called.
    NoFoodDetected,
    /// The lookup succeeded. An empty list means the service recognized no food.
    ItemsReady(Vec<NutritionItem>),
    LookupFailed(LookupError),
}

impl Outcome {
    pub fn state(&self) -> PipelineState {
        match self {
            Outcome::NoFoodDetected => PipelineState::NoFoodDetected,
            Outcome::ItemsReady(_) => PipelineState::ItemsReady,
            Outcome::LookupFailed(_) => PipelineState::LookupFailed,
        }
    }

    /// Success with zero items, shown as "no detailed data" rather than an error.
    pub fn is_empty_nutrition(&self) -> bool {
        matches!(self, Outcome::ItemsReady(items) if items.is_empty())
    }
}

/// Observable result of one request.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub caption: String,
    pub outcome: Outcome,
    /// States visited, in order, ending with the terminal one.
    pub states: Vec<PipelineState>,
}

impl Analysis {
    pub fn state(&self) -> PipelineState {
        self.outcome.state()
    }

    pub fn items(&self) -> &[NutritionItem] {
        match &self.outcome {
            Outcome::ItemsReady(items) => items,
            _ => &[],
        }
    }

    pub fn totals(&self) -> Option<NutritionTotals> {
        match &self.outcome {
            Outcome::ItemsReady(items) if !items.is_empty() => {
                Some(NutritionTotals::from_items(items))
            }
            _ => None,
        }
    }
}

/// Owns the captioner and the nutrition client for the life of the process.
pub struct App {
    captioner: Box<dyn CaptionService>,
    nutrition: Box<dyn NutritionService>,
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub captioner: Box<dyn CaptionService>,
    pub nutrition: Box<dyn NutritionService>,
}

impl App {
    pub fn with_services(services: AppServices) -> Self {
        Self {
            captioner: services.captioner,
            nutrition: services.nutrition,
        }
    }

    /// Construct an app from environment configuration (`Config::from_env`).
    pub async fn new() -> Result<Self> {
        let config = Config::from_env()?;
        Self::from_config(&config).await
    }

    /// Build the nutrition client and load the captioning model.
    ///
    /// The model load is the only expensive setup step and happens exactly
    /// once here; a failure is fatal.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let nutrition = CalorieNinjasClient::new(
            config.nutrition_api_key.clone(),
            config.nutrition_timeout,
        )?
        .with_base_url(config.nutrition_api_url.clone());
        info!(
            "Nutrition API: {} (timeout {}s)",
            config.nutrition_api_url,
            config.nutrition_timeout.as_secs()
        );

        let captioner = BlipCaptioner::load(config.caption_model).await?;

        Ok(Self::with_services(AppServices {
            captioner: Box::new(captioner),
            nutrition: Box::new(nutrition),
        }))
    }

    /// Decode an uploaded file and analyze it.
    pub async fn analyze_file(&self, path: &Path) -> Result<Analysis> {
        let image = load_upload(path).await?;
        info!("Loaded image {}", path.display());
        self.analyze(image).await
    }

    /// Run one request: caption the image, then look up its nutrition data.
    ///
    /// Lookup failures end in [`Outcome::LookupFailed`]. Captioning failures
    /// are returned as errors since no caption exists to report.
    pub async fn analyze(&self, image: DynamicImage) -> Result<Analysis> {
        let mut states = vec![PipelineState::Idle];
        enter(&mut states, PipelineState::ImageReceived);

        enter(&mut states, PipelineState::Captioning);
        info!("Analyzing image with the captioning model...");
        let caption = self.captioner.caption(image).await?;
        enter(&mut states, PipelineState::CaptionReady);
        info!("Generated caption: {:?}", caption);

        if caption.trim().is_empty() {
            warn!("No food detected in the image");
            enter(&mut states, PipelineState::NoFoodDetected);
            return Ok(Analysis {
                caption,
                outcome: Outcome::NoFoodDetected,
                states,
            });
        }

        enter(&mut states, PipelineState::LookingUp);
        info!("Fetching nutrition data for: {}", caption);
        let outcome = match self.nutrition.lookup(&caption).await {
            Ok(items) => {
                if items.is_empty() {
                    warn!("No detailed nutrition data found for {:?}", caption);
                } else {
                    info!("Nutrition data found for {} item(s)", items.len());
                }
                Outcome::ItemsReady(items)
            }
            Err(e) => {
                warn!("Nutrition lookup failed: {}", e);
                Outcome::LookupFailed(e)
            }
        };
        enter(&mut states, outcome.state());

        Ok(Analysis {
            caption,
            outcome,
            states,
        })
    }
}

fn enter(states: &mut Vec<PipelineState>, state: PipelineState) {
    debug!("Pipeline state -> {:?}", state);
    states.push(state);
}
