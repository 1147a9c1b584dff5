use anyhow::Result;
use calorie_advisor::app::App;
use calorie_advisor::report;
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "calorie-advisor")]
#[command(about = "Estimate the calories in a food photograph")]
struct CliArgs {
    /// Food photograph to analyze (JPEG or PNG).
    #[arg(value_name = "IMAGE", value_parser = parse_image_arg)]
    image: PathBuf,

    /// Print the result as JSON instead of text.
    #[arg(long)]
    json: bool,
}

fn parse_image_arg(input: &str) -> std::result::Result<PathBuf, String> {
    let path = PathBuf::from(input);
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("jpg") | Some("jpeg") | Some("png") => Ok(path),
        _ => Err(format!(
            "Unsupported image '{}'. Expected a .jpg, .jpeg or .png file",
            input
        )),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "calorie_advisor=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();
    info!("Starting calorie-advisor");

    let app = match App::new().await {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    };

    match app.analyze_file(&args.image).await {
        Ok(analysis) => {
            let rendered = if args.json {
                report::render_json(&analysis)?
            } else {
                report::render_text(&analysis)
            };
            println!("{}", rendered);
            Ok(())
        }
        Err(e) => {
            error!("Analysis failed: {}", e);
            std::process::exit(1);
        }
    }
}
