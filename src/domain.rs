use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::catalog::{self, VariableDescriptor};
use crate::error::PiomasError;

/// A catalog-validated variable short name.
///
/// Construction goes through [`FromStr`] so an unknown name fails eagerly
/// with [`PiomasError::UnsupportedVariable`], before any download starts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariableName(String);

impl VariableName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn descriptor(&self) -> &'static VariableDescriptor {
        // Validated at construction, the catalog is immutable.
        catalog::lookup(&self.0).expect("validated variable missing from catalog")
    }
}

impl fmt::Display for VariableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for VariableName {
    type Err = PiomasError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if catalog::lookup(trimmed).is_none() {
            return Err(PiomasError::UnsupportedVariable(value.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

/// One (variable, year) unit of work; resolves to zero or one remote file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    pub variable: VariableName,
    pub year: i32,
}

impl DownloadTask {
    /// Canonical uncompressed file name, `<short_name>.H<year>`.
    pub fn file_name(&self) -> String {
        format!("{}.H{}", self.variable, self.year)
    }
}

/// Byte order of the raw 32-bit float records. PIOMAS production files are
/// little-endian; `Native` exists for locally produced test data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrder {
    #[default]
    Little,
    Big,
    Native,
}

impl ByteOrder {
    pub fn f32_from_bytes(self, bytes: [u8; 4]) -> f32 {
        match self {
            ByteOrder::Little => f32::from_le_bytes(bytes),
            ByteOrder::Big => f32::from_be_bytes(bytes),
            ByteOrder::Native => f32::from_ne_bytes(bytes),
        }
    }
}

/// Why a task or record produced no output. These are warn-and-continue
/// outcomes, distinct from errors that abort the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    IndexUnavailable { url: String, status: u16 },
    NoMatch { pattern: String, url: String },
    AmbiguousMatch { pattern: String, url: String, count: usize },
    ExcludedVariable { variable: String },
    UnsupportedShape { variable: String, records: usize },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::IndexUnavailable { url, status } => {
                write!(f, "failed to reach {url} (status {status})")
            }
            SkipReason::NoMatch { pattern, url } => {
                write!(f, "no files found for '{pattern}' on {url}")
            }
            SkipReason::AmbiguousMatch { pattern, url, count } => {
                write!(f, "{count} files found for '{pattern}' on {url}")
            }
            SkipReason::ExcludedVariable { variable } => {
                write!(f, "conversion of {variable} is not supported")
            }
            SkipReason::UnsupportedShape { variable, records } => {
                write!(f, "{variable} data have {records} records per grid, not supported")
            }
        }
    }
}

/// Outcome of resolving a download task against the remote index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Url(String),
    Skipped(SkipReason),
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_variable_name_valid() {
        let name: VariableName = " hiday ".parse().unwrap();
        assert_eq!(name.as_str(), "hiday");
        assert_eq!(name.descriptor().folder, "hiday");
    }

    #[test]
    fn parse_variable_name_invalid() {
        let err = "hice".parse::<VariableName>().unwrap_err();
        assert_matches!(err, PiomasError::UnsupportedVariable(_));
    }

    #[test]
    fn task_file_name() {
        let task = DownloadTask {
            variable: "heff".parse().unwrap(),
            year: 2019,
        };
        assert_eq!(task.file_name(), "heff.H2019");
    }

    #[test]
    fn byte_order_decodes_floats() {
        let bytes = 1.5f32.to_le_bytes();
        assert_eq!(ByteOrder::Little.f32_from_bytes(bytes), 1.5);
        let bytes = 1.5f32.to_be_bytes();
        assert_eq!(ByteOrder::Big.f32_from_bytes(bytes), 1.5);
    }
}
