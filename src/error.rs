use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum PiomasError {
    #[error("{0} is not a supported PIOMAS variable")]
    UnsupportedVariable(String),

    #[error("missing config file piomas.json in current directory")]
    MissingConfig,

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("PSC request failed: {0}")]
    Http(String),

    #[error("PSC returned status {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("grid file holds {0} coordinates, x and y halves cannot be equal length")]
    GridShape(usize),

    #[error("invalid grid coordinate: {0}")]
    GridParse(String),

    #[error("{variable} year {year}: {len} bytes is not a whole number of 32-bit floats")]
    TruncatedRecord {
        variable: String,
        year: i32,
        len: usize,
    },

    #[error("{variable} year {year}: {count} floats is not divisible by grid size {grid}")]
    MalformedRecord {
        variable: String,
        year: i32,
        count: usize,
        grid: usize,
    },

    #[error("dimension {name} already exists with length {existing}, need {requested}")]
    DimensionConflict {
        name: String,
        existing: usize,
        requested: usize,
    },

    #[error("year coordinate already holds {existing:?}, {variable} members span {requested:?}")]
    YearMismatch {
        variable: String,
        existing: Vec<i32>,
        requested: Vec<i32>,
    },

    #[error("missing variable in container: {0}")]
    MissingVariable(String),

    #[error("netcdf error: {0}")]
    NetCdf(#[from] netcdf::Error),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
