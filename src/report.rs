//! Terminal rendering of an [`Analysis`].

use crate::app::{Analysis, Outcome, PipelineState};
use crate::models::{NutritionItem, NutritionTotals};
use crate::nutrition::LookupError;
use crate::Result;
use serde::Serialize;

#[derive(Serialize)]
struct JsonReport<'a> {
    caption: &'a str,
    state: PipelineState,
    items: &'a [NutritionItem],
    #[serde(skip_serializing_if = "Option::is_none")]
    totals: Option<NutritionTotals>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonError<'a>>,
}

#[derive(Serialize)]
struct JsonError<'a> {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<&'a str>,
}

/// Human-readable report, one line per fact.
pub fn render_text(analysis: &Analysis) -> String {
    let mut lines = vec![format!("Generated caption: {}", analysis.caption)];

    match &analysis.outcome {
        Outcome::NoFoodDetected => {
            lines.push("No food detected in the image.".to_string());
        }
        Outcome::ItemsReady(items) => {
            lines.push(format!("Food detected: {}", analysis.caption));
            lines.push(String::new());
            if items.is_empty() {
                lines.push("No detailed nutrition data found.".to_string());
            } else {
                lines.push("Nutrition breakdown:".to_string());
                for item in items {
                    lines.push(capitalize(&item.name));
                    lines.push(format!("- Calories: {} kcal", amount(item.calories)));
                    lines.push(format!("- Carbohydrates: {} g", amount(item.carbohydrates_g)));
                    lines.push(format!("- Protein: {} g", amount(item.protein_g)));
                    lines.push(format!("- Fat: {} g", amount(item.fat_g)));
                    lines.push("---".to_string());
                }
                let totals = NutritionTotals::from_items(items);
                lines.push(format!(
                    "Total: {} kcal (carbohydrates {} g, protein {} g, fat {} g)",
                    amount(totals.calories),
                    amount(totals.carbohydrates_g),
                    amount(totals.protein_g),
                    amount(totals.fat_g)
                ));
            }
        }
        Outcome::LookupFailed(error) => {
            lines.push(format!("Food detected: {}", analysis.caption));
            lines.push(String::new());
            match error {
                LookupError::Http { status, body } => {
                    lines.push(format!("Nutrition API error (status {}):", status));
                    lines.push(body.clone());
                }
                LookupError::Transport(message) => {
                    lines.push("Nutrition service unreachable. Please try again.".to_string());
                    lines.push(format!("({})", message));
                }
                LookupError::Decode { message, body } => {
                    lines.push(format!(
                        "Nutrition API returned an unexpected response: {}",
                        message
                    ));
                    lines.push(body.clone());
                }
            }
        }
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Machine-readable report for `--json`.
pub fn render_json(analysis: &Analysis) -> Result<String> {
    let error = match &analysis.outcome {
        Outcome::LookupFailed(e) => Some(JsonError {
            message: e.to_string(),
            body: e.body(),
        }),
        _ => None,
    };

    let report = JsonReport {
        caption: &analysis.caption,
        state: analysis.state(),
        items: analysis.items(),
        totals: analysis.totals(),
        error,
    };

    Ok(serde_json::to_string_pretty(&report)?)
}

/// First letter upper-cased, the rest lower-cased.
fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// One decimal place at most, no trailing `.0`.
fn amount(value: f64) -> String {
    let rounded = (value * 10.0).round() / 10.0;
    format!("{}", rounded)
}
