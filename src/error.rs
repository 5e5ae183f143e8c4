use thiserror::Error;

use super::geometry::GeoPoint;


#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to parse location record {record}: {reason}")]
    Parse {
        record: String,
        reason: String,
    },
    #[error("Route {origin} -> {destination} uses edge {from} -> {to}, which is not in the graph")]
    InternalConsistency {
        origin: GeoPoint,
        destination: GeoPoint,
        from: GeoPoint,
        to: GeoPoint,
    },
    #[error("Shape mismatch: expected length {expected}, found {found}")]
    ShapeMismatch {
        expected: usize,
        found: usize,
    },
    #[error("Invalid config: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("XML error: {0}")]
    Xml(#[from] xml::reader::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn parse(record: &str, reason: &str) -> Error {
        Error::Parse {
            record: String::from(record),
            reason: String::from(reason),
        }
    }
}
