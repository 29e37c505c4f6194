//! The record decoder: raw PIOMAS bytes to a named, dimension-tagged array.
//!
//! A raw file is a time-major stack of flattened 2-D grid snapshots encoded
//! as 32-bit IEEE-754 floats. The leading dimension is inferred from the
//! record count: 12 records is a monthly climatology, 365 a daily one, and
//! anything else is only accepted for the current calendar year (partial
//! data), under a synthetic per-variable axis name.

use crate::catalog;
use crate::domain::{ByteOrder, SkipReason};
use crate::error::PiomasError;

/// Metadata accompanying one raw file, taken from the catalog and the
/// `<short_name>.H<year>` file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSource {
    pub short_name: String,
    pub year: i32,
    pub long_name: String,
    pub units: String,
}

/// A decoded record ready to be written into the container.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedArray {
    /// Variable name, `<short_name>_<year>`.
    pub var_name: String,
    /// Leading dimension name: "month", "day", or a synthetic axis.
    pub time_dim: String,
    pub time_len: usize,
    pub grid_len: usize,
    /// Time-major values, `time_len * grid_len` floats.
    pub values: Vec<f32>,
    pub long_name: String,
    pub units: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DecodeOutcome {
    Array(NamedArray),
    Skipped(SkipReason),
}

pub fn decode_record(
    bytes: &[u8],
    source: &RecordSource,
    grid_len: usize,
    byte_order: ByteOrder,
    current_year: i32,
) -> Result<DecodeOutcome, PiomasError> {
    if catalog::is_excluded(&source.short_name) {
        return Ok(DecodeOutcome::Skipped(SkipReason::ExcludedVariable {
            variable: source.short_name.clone(),
        }));
    }

    if bytes.len() % 4 != 0 {
        return Err(PiomasError::TruncatedRecord {
            variable: source.short_name.clone(),
            year: source.year,
            len: bytes.len(),
        });
    }

    let count = bytes.len() / 4;
    if count % grid_len != 0 {
        return Err(PiomasError::MalformedRecord {
            variable: source.short_name.clone(),
            year: source.year,
            count,
            grid: grid_len,
        });
    }

    let time_len = count / grid_len;
    let var_name = format!("{}_{}", source.short_name, source.year);

    let time_dim = match time_len {
        12 => "month".to_string(),
        365 => "day".to_string(),
        _ if source.year == current_year => format!("dim_0_{var_name}"),
        _ => {
            return Ok(DecodeOutcome::Skipped(SkipReason::UnsupportedShape {
                variable: source.short_name.clone(),
                records: time_len,
            }));
        }
    };

    let values = bytes
        .chunks_exact(4)
        .map(|chunk| byte_order.f32_from_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();

    Ok(DecodeOutcome::Array(NamedArray {
        var_name,
        time_dim,
        time_len,
        grid_len,
        values,
        long_name: source.long_name.clone(),
        units: source.units.clone(),
    }))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const GRID: usize = 4;

    fn source(short_name: &str, year: i32) -> RecordSource {
        RecordSource {
            short_name: short_name.to_string(),
            year,
            long_name: format!("Long {short_name}"),
            units: "$m$".to_string(),
        }
    }

    fn raw_bytes(records: usize, order: ByteOrder) -> Vec<u8> {
        (0..records * GRID)
            .flat_map(|i| {
                let v = i as f32;
                match order {
                    ByteOrder::Little => v.to_le_bytes(),
                    ByteOrder::Big => v.to_be_bytes(),
                    ByteOrder::Native => v.to_ne_bytes(),
                }
            })
            .collect()
    }

    #[test]
    fn monthly_shape_gets_month_axis() {
        let bytes = raw_bytes(12, ByteOrder::Little);
        let outcome =
            decode_record(&bytes, &source("heff", 2016), GRID, ByteOrder::Little, 2020).unwrap();
        let array = match outcome {
            DecodeOutcome::Array(array) => array,
            other => panic!("expected array, got {other:?}"),
        };
        assert_eq!(array.var_name, "heff_2016");
        assert_eq!(array.time_dim, "month");
        assert_eq!(array.time_len, 12);
        assert_eq!(array.grid_len, GRID);
        assert_eq!(array.values.len(), 12 * GRID);
        assert_eq!(array.values[GRID], GRID as f32);
    }

    #[test]
    fn daily_shape_gets_day_axis() {
        let bytes = raw_bytes(365, ByteOrder::Little);
        let outcome =
            decode_record(&bytes, &source("hiday", 2017), GRID, ByteOrder::Little, 2020).unwrap();
        assert_matches!(
            outcome,
            DecodeOutcome::Array(NamedArray { ref time_dim, time_len: 365, .. })
                if time_dim == "day"
        );
    }

    #[test]
    fn partial_current_year_gets_synthetic_axis() {
        let bytes = raw_bytes(7, ByteOrder::Little);
        let outcome =
            decode_record(&bytes, &source("heff", 2020), GRID, ByteOrder::Little, 2020).unwrap();
        assert_matches!(
            outcome,
            DecodeOutcome::Array(NamedArray { ref time_dim, time_len: 7, .. })
                if time_dim == "dim_0_heff_2020"
        );
    }

    #[test]
    fn partial_past_year_is_skipped() {
        let bytes = raw_bytes(7, ByteOrder::Little);
        let outcome =
            decode_record(&bytes, &source("heff", 2016), GRID, ByteOrder::Little, 2020).unwrap();
        assert_matches!(
            outcome,
            DecodeOutcome::Skipped(SkipReason::UnsupportedShape { records: 7, .. })
        );
    }

    #[test]
    fn count_not_divisible_by_grid_is_malformed() {
        let mut bytes = raw_bytes(12, ByteOrder::Little);
        bytes.extend_from_slice(&0.0f32.to_le_bytes());
        let err = decode_record(&bytes, &source("heff", 2016), GRID, ByteOrder::Little, 2020)
            .unwrap_err();
        assert_matches!(err, PiomasError::MalformedRecord { count: 49, grid: 4, .. });
    }

    #[test]
    fn odd_byte_length_is_truncated() {
        let mut bytes = raw_bytes(12, ByteOrder::Little);
        bytes.push(0);
        let err = decode_record(&bytes, &source("heff", 2016), GRID, ByteOrder::Little, 2020)
            .unwrap_err();
        assert_matches!(err, PiomasError::TruncatedRecord { .. });
    }

    #[test]
    fn excluded_variable_always_skips() {
        // Content is well-formed monthly data; the policy table wins anyway.
        let bytes = raw_bytes(12, ByteOrder::Little);
        let outcome =
            decode_record(&bytes, &source("icevel", 2016), GRID, ByteOrder::Little, 2020).unwrap();
        assert_matches!(
            outcome,
            DecodeOutcome::Skipped(SkipReason::ExcludedVariable { ref variable })
                if variable == "icevel"
        );
    }

    #[test]
    fn big_endian_records_decode() {
        let bytes = raw_bytes(12, ByteOrder::Big);
        let outcome =
            decode_record(&bytes, &source("heff", 2016), GRID, ByteOrder::Big, 2020).unwrap();
        let DecodeOutcome::Array(array) = outcome else {
            panic!("expected array");
        };
        assert_eq!(array.values[1], 1.0);
    }
}
