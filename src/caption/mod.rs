//! Image captioning
//!
//! Wraps a pretrained BLIP image-to-text model that turns a food photograph
//! into a short natural-language description.

pub mod blip;
pub mod mock;

pub use blip::BlipCaptioner;
pub use mock::MockCaptioner;

use crate::{Error, Result};
use async_trait::async_trait;
use image::DynamicImage;
use std::fmt;
use std::str::FromStr;

#[async_trait]
pub trait CaptionService: Send + Sync {
    /// Describe the dominant subject of `image`.
    ///
    /// Any color format is accepted. The returned caption is trimmed and may
    /// be empty when the model produces no content tokens.
    async fn caption(&self, image: DynamicImage) -> Result<String>;
}

/// Which published BLIP captioning checkpoint to load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CaptionModelVariant {
    #[default]
    Base,
    Large,
}

impl CaptionModelVariant {
    pub fn repo_id(&self) -> &'static str {
        match self {
            CaptionModelVariant::Base => "Salesforce/blip-image-captioning-base",
            CaptionModelVariant::Large => "Salesforce/blip-image-captioning-large",
        }
    }
}

impl fmt::Display for CaptionModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptionModelVariant::Base => write!(f, "base"),
            CaptionModelVariant::Large => write!(f, "large"),
        }
    }
}

impl FromStr for CaptionModelVariant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "base" => Ok(CaptionModelVariant::Base),
            "large" => Ok(CaptionModelVariant::Large),
            other => Err(Error::Config(format!(
                "Unknown CAPTION_MODEL '{}'. Expected 'base' or 'large'",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_parsing() {
        assert_eq!(
            "base".parse::<CaptionModelVariant>().unwrap(),
            CaptionModelVariant::Base
        );
        assert_eq!(
            " LARGE ".parse::<CaptionModelVariant>().unwrap(),
            CaptionModelVariant::Large
        );
        assert!("huge".parse::<CaptionModelVariant>().is_err());
    }

    #[test]
    fn test_variant_display_round_trips() {
        for variant in [CaptionModelVariant::Base, CaptionModelVariant::Large] {
            assert_eq!(
                variant.to_string().parse::<CaptionModelVariant>().unwrap(),
                variant
            );
        }
    }

    #[test]
    fn test_repo_ids() {
        assert_eq!(
            CaptionModelVariant::default().repo_id(),
            "Salesforce/blip-image-captioning-base"
        );
        assert!(CaptionModelVariant::Large.repo_id().ends_with("large"));
    }
}
