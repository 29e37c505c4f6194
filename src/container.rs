//! NetCDF container I/O: seeding, per-record appends, and the year-stacking
//! pass.
//!
//! The container is mutated through open-append-close cycles with a single
//! writer; nothing here retains references to previously written arrays.
//! Dimensions are file-global in NetCDF, so shared axes (`grid`, `month`,
//! `day`, `year`) are reused when the length agrees and conflict otherwise.

use std::fs;

use camino::Utf8Path;
use serde::Serialize;
use tracing::{info, warn};

use crate::decode::{DecodeOutcome, NamedArray, RecordSource, decode_record};
use crate::domain::ByteOrder;
use crate::error::PiomasError;
use crate::grid::Grid;

/// One file queued for conversion.
#[derive(Debug, Clone)]
pub struct ConversionInput {
    pub file: camino::Utf8PathBuf,
    pub source: RecordSource,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConvertItem {
    pub variable: String,
    pub year: i32,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StackItem {
    pub variable: String,
    pub members: Vec<String>,
    pub years: Vec<i32>,
}

/// Create the output container from scratch, holding only the grid
/// coordinates. An existing file at `path` is always overwritten.
pub fn seed_container(path: &Utf8Path, grid: &Grid) -> Result<(), PiomasError> {
    if path.as_std_path().exists() {
        fs::remove_file(path.as_std_path())
            .map_err(|err| PiomasError::Filesystem(format!("remove {path}: {err}")))?;
    }

    let mut file = netcdf::create(path.as_std_path())?;
    file.add_dimension("grid", grid.len())?;
    {
        let mut x = file.add_variable::<f64>("x", &["grid"])?;
        x.put_values(&grid.x, ..)?;
    }
    {
        let mut y = file.add_variable::<f64>("y", &["grid"])?;
        y.put_values(&grid.y, ..)?;
    }
    Ok(())
}

/// Upsert one decoded array: create the container if absent, else append.
pub fn append_array(path: &Utf8Path, array: &NamedArray) -> Result<(), PiomasError> {
    let mut file = if path.as_std_path().exists() {
        netcdf::append(path.as_std_path())?
    } else {
        netcdf::create(path.as_std_path())?
    };

    ensure_dimension(&mut file, &array.time_dim, array.time_len)?;
    ensure_dimension(&mut file, "grid", array.grid_len)?;

    let mut var =
        file.add_variable::<f32>(&array.var_name, &[array.time_dim.as_str(), "grid"])?;
    var.put_attribute("long_name", array.long_name.as_str())?;
    var.put_attribute("units", array.units.as_str())?;
    var.put_values(&array.values, ..)?;
    Ok(())
}

/// Convert a batch of raw files into `file_out`, in input order.
///
/// The container is re-initialized first, so callers must not point this at
/// a file they want to keep. A record that fails to decode or append is
/// warned about and skipped; the batch continues and earlier appends stay.
pub fn convert_batch(
    inputs: &[ConversionInput],
    grid: &Grid,
    file_out: &Utf8Path,
    byte_order: ByteOrder,
    current_year: i32,
) -> Result<Vec<ConvertItem>, PiomasError> {
    seed_container(file_out, grid)?;

    let mut items = Vec::with_capacity(inputs.len());
    for input in inputs {
        let source = &input.source;
        let bytes = fs::read(input.file.as_std_path())
            .map_err(|err| PiomasError::Filesystem(format!("read {}: {err}", input.file)))?;

        let outcome = match decode_record(&bytes, source, grid.len(), byte_order, current_year) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!("{err}");
                items.push(skipped_item(source, err.to_string()));
                continue;
            }
        };

        let array = match outcome {
            DecodeOutcome::Array(array) => array,
            DecodeOutcome::Skipped(reason) => {
                warn!("{reason}");
                items.push(skipped_item(source, reason.to_string()));
                continue;
            }
        };

        info!(
            "adding {} ({}) from year {}",
            source.long_name, source.short_name, source.year
        );

        if let Err(err) = append_array(file_out, &array) {
            warn!("failed to append {}: {err}", array.var_name);
            items.push(skipped_item(source, err.to_string()));
            continue;
        }

        items.push(ConvertItem {
            variable: source.short_name.clone(),
            year: source.year,
            action: "converted".to_string(),
            detail: None,
        });
    }
    Ok(items)
}

fn skipped_item(source: &RecordSource, detail: String) -> ConvertItem {
    ConvertItem {
        variable: source.short_name.clone(),
        year: source.year,
        action: "skipped".to_string(),
        detail: Some(detail),
    }
}

/// Stack all `<short_name>_<year>` variables of `file_in` into one
/// `<short_name>` variable in `file_out`, along a new `year` coordinate.
///
/// Members are ordered by lexicographic sort of the full variable name, and
/// members whose shape disagrees with the first match are dropped. Returns
/// `Ok(None)` without touching `file_out` when nothing matches.
///
/// The `year` coordinate is shared across all variables stacked into one
/// file, so a stack whose year set disagrees with an already written `year`
/// variable fails with [`PiomasError::YearMismatch`].
pub fn stack_years(
    file_in: &Utf8Path,
    file_out: &Utf8Path,
    short_name: &str,
) -> Result<Option<StackItem>, PiomasError> {
    let input = netcdf::open(file_in.as_std_path())?;
    let prefix = format!("{short_name}_");

    let mut names: Vec<String> = input
        .variables()
        .map(|var| var.name())
        .filter(|name| name.starts_with(&prefix))
        .collect();
    names.sort();

    let Some(first) = names.first() else {
        return Ok(None);
    };

    let reference = variable_shape(&input, first)?;

    let mut members = Vec::new();
    let mut years = Vec::new();
    for name in &names {
        let shape = variable_shape(&input, name)?;
        if shape.sizes != reference.sizes {
            warn!(
                "excluding {name} from {short_name} stack: shape {:?} != {:?}",
                shape.sizes, reference.sizes
            );
            continue;
        }
        let Some(year) = name.strip_prefix(&prefix).and_then(|s| s.parse::<i32>().ok()) else {
            warn!("excluding {name} from {short_name} stack: no year suffix");
            continue;
        };
        members.push(name.clone());
        years.push(year);
    }

    if members.is_empty() {
        return Ok(None);
    }

    info!("stacking [{}] to be {short_name}", members.join(", "));

    let mut values: Vec<f32> = Vec::new();
    for name in &members {
        let var = input
            .variable(name)
            .ok_or_else(|| PiomasError::MissingVariable(name.clone()))?;
        let slice: Vec<f32> = var.get_values(..)?;
        values.extend_from_slice(&slice);
    }

    let reference_var = input
        .variable(first)
        .ok_or_else(|| PiomasError::MissingVariable(first.clone()))?;
    let long_name = string_attribute(&reference_var, "long_name");
    let units = string_attribute(&reference_var, "units");

    let grid_x: Option<Vec<f64>> = match input.variable("x") {
        Some(var) => Some(var.get_values(..)?),
        None => None,
    };
    let grid_y: Option<Vec<f64>> = match input.variable("y") {
        Some(var) => Some(var.get_values(..)?),
        None => None,
    };

    let creating = !file_out.as_std_path().exists();
    let mut out = if creating {
        netcdf::create(file_out.as_std_path())?
    } else {
        netcdf::append(file_out.as_std_path())?
    };

    for (dim, len) in reference.dims.iter().zip(reference.sizes.iter()) {
        ensure_dimension(&mut out, dim, *len)?;
    }
    ensure_dimension(&mut out, "year", members.len())?;

    if creating {
        if let Some(x) = grid_x {
            let mut var = out.add_variable::<f64>("x", &["grid"])?;
            var.put_values(&x, ..)?;
        }
        if let Some(y) = grid_y {
            let mut var = out.add_variable::<f64>("y", &["grid"])?;
            var.put_values(&y, ..)?;
        }
    }

    let existing_years: Option<Vec<i32>> = match out.variable("year") {
        Some(var) => Some(var.get_values(..)?),
        None => None,
    };
    match existing_years {
        Some(existing) if existing != years => {
            return Err(PiomasError::YearMismatch {
                variable: short_name.to_string(),
                existing,
                requested: years,
            });
        }
        Some(_) => {}
        None => {
            let mut var = out.add_variable::<i32>("year", &["year"])?;
            var.put_values(&years, ..)?;
        }
    }

    let dim_names: Vec<&str> = std::iter::once("year")
        .chain(reference.dims.iter().map(String::as_str))
        .collect();
    {
        let mut var = out.add_variable::<f32>(short_name, &dim_names)?;
        if let Some(long_name) = long_name.as_deref() {
            var.put_attribute("long_name", long_name)?;
        }
        if let Some(units) = units.as_deref() {
            var.put_attribute("units", units)?;
        }
        var.put_values(&values, ..)?;
    }

    Ok(Some(StackItem {
        variable: short_name.to_string(),
        members,
        years,
    }))
}

#[derive(Debug, Clone)]
struct VariableShape {
    dims: Vec<String>,
    sizes: Vec<usize>,
}

fn variable_shape(file: &netcdf::File, name: &str) -> Result<VariableShape, PiomasError> {
    let var = file
        .variable(name)
        .ok_or_else(|| PiomasError::MissingVariable(name.to_string()))?;
    let dims = var.dimensions();
    Ok(VariableShape {
        dims: dims.iter().map(|d| d.name()).collect(),
        sizes: dims.iter().map(|d| d.len()).collect(),
    })
}

fn string_attribute(var: &netcdf::Variable<'_>, name: &str) -> Option<String> {
    match var.attribute_value(name)?.ok()? {
        netcdf::AttributeValue::Str(value) => Some(value),
        _ => None,
    }
}

fn ensure_dimension(
    file: &mut netcdf::FileMut,
    name: &str,
    len: usize,
) -> Result<(), PiomasError> {
    let existing = file.dimension(name).map(|dim| dim.len());
    match existing {
        Some(existing) if existing == len => Ok(()),
        Some(existing) => Err(PiomasError::DimensionConflict {
            name: name.to_string(),
            existing,
            requested: len,
        }),
        None => {
            file.add_dimension(name, len)?;
            Ok(())
        }
    }
}
