//! Hospital discovery.
//!
//! Lists every facility of a category inside a search circle, following
//! the places service's continuation tokens, and writes the candidates CSV
//! consumed by `travel-times`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use accessmap::config::{Config, ServiceConfig};
use accessmap::discovery::{discover_candidates, GooglePlacesClient};
use accessmap::geometry::{SearchArea, WebMercator};
use accessmap::io::{load_samples, write_candidates};
use accessmap::models::Point;

#[derive(Parser, Debug)]
#[command(name = "discover")]
#[command(about = "Discover hospitals around a point or a set of samples")]
struct Args {
    /// Search center as "lat,lng"
    #[arg(long, value_parser = parse_center, requires = "radius", conflicts_with = "samples")]
    center: Option<Point>,

    /// Search radius in meters (capped at 50km)
    #[arg(long)]
    radius: Option<f64>,

    /// Derive the search circle from the extent of these samples
    #[arg(long, required_unless_present = "center")]
    samples: Option<PathBuf>,

    /// Place type to search for (overrides config)
    #[arg(long)]
    category: Option<String>,

    /// Output CSV
    #[arg(short, long, default_value = "data/hospitals/hospitals.csv")]
    output: PathBuf,

    /// Optional TOML config file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn parse_center(value: &str) -> Result<Point, String> {
    let (lat, lng) = value
        .split_once(',')
        .ok_or_else(|| format!("expected lat,lng, got '{}'", value))?;
    let lat: f64 = lat.trim().parse().map_err(|_| format!("bad latitude '{}'", lat))?;
    let lng: f64 = lng.trim().parse().map_err(|_| format!("bad longitude '{}'", lng))?;
    let point = Point::new(lng, lat);
    if !point.is_valid() {
        return Err(format!("coordinates out of range: {}", value));
    }
    Ok(point)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };
    if let Some(category) = &args.category {
        config.discovery.category = category.clone();
    }

    let options = config.discovery.to_options()?;
    let service = ServiceConfig::from_lookup(&config.service, |key| std::env::var(key).ok())?;

    let area = match (args.center, args.radius, &args.samples) {
        (Some(center), Some(radius), _) => SearchArea::new(center, radius),
        (_, _, Some(path)) => {
            let points: Vec<Point> = load_samples(path)?.into_iter().map(|s| s.point).collect();
            SearchArea::covering(&points, &WebMercator)
                .with_context(|| format!("No sample points in {}", path.display()))?
        }
        _ => anyhow::bail!("either --center with --radius or --samples is required"),
    };

    let client = GooglePlacesClient::new(&service).context("Failed to build places client")?;
    let candidates = discover_candidates(&client, &area, &options).await?;

    write_candidates(&args.output, &candidates)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    info!(
        "Saved {} candidates to {}",
        candidates.len(),
        args.output.display()
    );

    Ok(())
}
