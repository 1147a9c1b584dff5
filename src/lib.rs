//! Calorie advisor - estimates the nutrition of a food photograph
//!
//! A pretrained BLIP model captions the photo, and the caption is sent as a
//! free-text query to the CalorieNinjas API for calorie and macronutrient
//! estimates.

pub mod app;
pub mod caption;
pub mod error;
pub mod image;
pub mod models;
pub mod nutrition;
pub mod report;

pub use error::{Error, Result};
