use std::collections::HashSet;
use std::fs;
use std::path::Path;

use tracing::{info, warn};

use super::reader::{open_input, parse_error};
use crate::error::ConfigError;
use crate::models::Candidate;

/// Load candidates from a `place_id,name,address,lat,lng` CSV.
///
/// Rows repeating an earlier `place_id` are dropped so that the id stays a
/// usable join key.
pub fn load_candidates(path: &Path) -> Result<Vec<Candidate>, ConfigError> {
    info!("Loading candidates from {}", path.display());
    let reader = open_input(path)?;
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut seen = HashSet::new();
    let mut candidates = Vec::new();
    let mut duplicates = 0usize;

    for row in csv_reader.deserialize::<Candidate>() {
        let candidate = row.map_err(|e| parse_error(path, e))?;
        if candidate.id.is_empty() {
            return Err(parse_error(path, "candidate row with empty place_id"));
        }
        if !seen.insert(candidate.id.clone()) {
            duplicates += 1;
            continue;
        }
        candidates.push(candidate);
    }

    if duplicates > 0 {
        warn!("Dropped {} candidates with repeated place_id", duplicates);
    }
    info!("Loaded {} candidates", candidates.len());
    Ok(candidates)
}

/// Write candidates in the same layout [`load_candidates`] reads.
pub fn write_candidates(path: &Path, candidates: &[Candidate]) -> csv::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    for candidate in candidates {
        writer.serialize(candidate)?;
    }
    writer.flush()?;
    Ok(())
}
