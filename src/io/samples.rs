//! Sample point loading.
//!
//! Accepts a GeoJSON FeatureCollection of Point features or a CSV with
//! `lat` and `lng` (or `lon`) columns. The sample index is taken from a
//! `sample_idx` property/column when present, otherwise from the row
//! position.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use geojson::GeoJson;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use super::reader::{data_extension, open_input, parse_error};
use crate::error::ConfigError;
use crate::models::{Point, SampleRecord};

const INDEX_KEY: &str = "sample_idx";

/// Largest integer an f64 holds exactly.
const MAX_EXACT_FLOAT_INT: f64 = 9_007_199_254_740_992.0;

#[derive(Debug, Deserialize)]
struct SampleRow {
    #[serde(default)]
    sample_idx: Option<u64>,
    lat: f64,
    #[serde(alias = "lon")]
    lng: f64,
}

pub fn load_samples(path: &Path) -> Result<Vec<SampleRecord>, ConfigError> {
    info!("Loading samples from {}", path.display());
    let reader = open_input(path)?;

    let samples = match data_extension(path).as_deref() {
        Some("csv") => parse_csv(reader, path)?,
        Some("geojson") | Some("json") => parse_geojson(reader, path)?,
        other => {
            return Err(parse_error(
                path,
                format!("unsupported sample format {:?}", other.unwrap_or("")),
            ))
        }
    };

    validate(&samples, path)?;
    info!("Loaded {} samples", samples.len());
    Ok(samples)
}

fn parse_geojson(
    mut reader: Box<dyn Read>,
    path: &Path,
) -> Result<Vec<SampleRecord>, ConfigError> {
    let mut buf = String::new();
    reader
        .read_to_string(&mut buf)
        .map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    let geojson = buf.parse::<GeoJson>().map_err(|e| parse_error(path, e))?;

    let collection = match geojson {
        GeoJson::FeatureCollection(collection) => collection,
        _ => return Err(parse_error(path, "expected a FeatureCollection")),
    };

    let mut samples = Vec::with_capacity(collection.features.len());
    for (position, feature) in collection.features.into_iter().enumerate() {
        let index = match feature.property(INDEX_KEY) {
            None => position as u64,
            Some(value) => sample_index(value).ok_or_else(|| {
                parse_error(
                    path,
                    format!(
                        "feature {}: {} {} is not a non-negative integer",
                        position, INDEX_KEY, value
                    ),
                )
            })?,
        };

        let geometry = feature
            .geometry
            .ok_or_else(|| parse_error(path, format!("no geometry in feature {}", position)))?;
        let point = match geometry.value {
            geojson::Value::Point(coords) if coords.len() >= 2 => {
                Point::new(coords[0], coords[1])
            }
            geojson::Value::Point(_) => {
                return Err(parse_error(
                    path,
                    format!("feature {} has malformed coordinates", position),
                ))
            }
            _ => {
                return Err(parse_error(
                    path,
                    format!("feature {} is not a Point", position),
                ))
            }
        };

        samples.push(SampleRecord::new(index, point));
    }
    Ok(samples)
}

/// Integers, integral floats (as written by pandas) and digit strings.
fn sample_index(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= MAX_EXACT_FLOAT_INT)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_csv(reader: Box<dyn Read>, path: &Path) -> Result<Vec<SampleRecord>, ConfigError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    csv_reader
        .deserialize::<SampleRow>()
        .enumerate()
        .map(|(position, row)| {
            let row = row.map_err(|e| parse_error(path, e))?;
            Ok(SampleRecord::new(
                row.sample_idx.unwrap_or(position as u64),
                Point::new(row.lng, row.lat),
            ))
        })
        .collect()
}

fn validate(samples: &[SampleRecord], path: &Path) -> Result<(), ConfigError> {
    let mut seen = HashSet::with_capacity(samples.len());
    for sample in samples {
        if !seen.insert(sample.index) {
            return Err(ConfigError::DuplicateSampleIndex(sample.index));
        }
        if !sample.point.is_valid() {
            return Err(parse_error(
                path,
                format!(
                    "sample {} has invalid coordinates ({}, {})",
                    sample.index, sample.point.lat, sample.point.lon
                ),
            ));
        }
    }
    Ok(())
}
