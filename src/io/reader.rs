use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;

use crate::error::ConfigError;

/// Open an input file, transparently decompressing `.gz`.
pub fn open_input(path: &Path) -> Result<Box<dyn Read>, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::InputNotFound(path.to_path_buf()));
    }
    let file = File::open(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let reader: Box<dyn Read> = if path.extension().map_or(false, |e| e == "gz") {
        Box::new(GzDecoder::new(BufReader::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };
    Ok(reader)
}

/// Lowercased extension, ignoring a trailing `.gz`.
pub(crate) fn data_extension(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?.to_ascii_lowercase();
    let name = name.strip_suffix(".gz").unwrap_or(&name);
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(String::from)
}

pub(crate) fn parse_error(path: &Path, details: impl ToString) -> ConfigError {
    ConfigError::Parse {
        path: path.to_path_buf(),
        details: details.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_extension() {
        assert_eq!(data_extension(Path::new("a/points.geojson")).as_deref(), Some("geojson"));
        assert_eq!(data_extension(Path::new("a/points.CSV.gz")).as_deref(), Some("csv"));
        assert_eq!(data_extension(Path::new("noext")), None);
    }

    #[test]
    fn test_missing_input() {
        match open_input(Path::new("/no/such/file.csv")) {
            Err(ConfigError::InputNotFound(p)) => assert_eq!(p, Path::new("/no/such/file.csv")),
            _ => panic!("expected InputNotFound"),
        }
    }
}
