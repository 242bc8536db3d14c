//! Field extraction shared by the CIF-based structure readers.

use super::cif::{CifBlock, CifRecord, CifValue};
use crate::core::cell::symmetry::{SymmetryError, SymmetryOperator};
use crate::core::cell::unit_cell::{CellError, UnitCell};
use crate::core::models::model::ModelError;

/// First present, non-null item among `items`, parsed as a number.
///
/// `?` and `.` fall through to the next item. Fails with
/// [`ModelError::MissingColumn`] when none of the items exist and with
/// [`ModelError::InvalidValue`] when the chosen value is not numeric or every
/// present value is null.
pub(crate) fn required_f64(
    record: &CifRecord<'_>,
    category: &str,
    items: &[&str],
    row: usize,
) -> Result<f64, ModelError> {
    let mut present = items.iter().filter_map(|item| record.get(item).map(|v| (*item, v))).peekable();
    let first_present = present.peek().copied();
    let Some((item, value)) = present.find(|(_, v)| !v.is_null()).or(first_present) else {
        return Err(ModelError::MissingColumn(format!(
            "{}.{}",
            category,
            items.first().copied().unwrap_or_default()
        )));
    };
    value.as_f64().ok_or_else(|| ModelError::InvalidValue {
        tag: format!("{}.{}", category, item),
        row,
        value: value.to_string(),
    })
}

/// First non-null label among `items`.
pub(crate) fn first_label(record: &CifRecord<'_>, items: &[&str]) -> Option<String> {
    items.iter().find_map(|item| record.get_str(item))
}

/// Value at `row` of a looped tag, read as a number.
pub(crate) fn column_f64(block: &CifBlock, tag: &str, row: usize) -> Result<f64, ModelError> {
    let column = block
        .get_column(tag)
        .ok_or_else(|| ModelError::MissingColumn(tag.to_string()))?;
    let value = column.get(row).ok_or_else(|| ModelError::InvalidValue {
        tag: tag.to_string(),
        row,
        value: String::new(),
    })?;
    value.as_f64().ok_or_else(|| ModelError::InvalidValue {
        tag: tag.to_string(),
        row,
        value: value.to_string(),
    })
}

/// Non-null label at `row` of a looped tag.
pub(crate) fn column_label(block: &CifBlock, tag: &str, row: usize) -> Option<String> {
    block
        .get_column(tag)?
        .get(row)
        .filter(|v| !v.is_null())
        .map(CifValue::to_label)
}

/// Unit cell from six `length_*`/`angle_*` tags.
///
/// `prefix` is `_cell.` for mmCIF and `_cell_` for core CIF. Returns
/// `Ok(None)` unless all six parameters are present and numeric.
pub(crate) fn cell_from_block(block: &CifBlock, prefix: &str) -> Result<Option<UnitCell>, CellError> {
    let names = ["length_a", "length_b", "length_c", "angle_alpha", "angle_beta", "angle_gamma"];
    let mut params = [0.0; 6];
    for (param, name) in params.iter_mut().zip(names) {
        match block.get_f64(&format!("{}{}", prefix, name)) {
            Some(value) => *param = value,
            None => return Ok(None),
        }
    }
    let [a, b, c, alpha, beta, gamma] = params;
    UnitCell::new(a, b, c, alpha, beta, gamma).map(Some)
}

/// First non-null scalar among `tags`.
pub(crate) fn first_scalar_label(block: &CifBlock, tags: &[&str]) -> Option<String> {
    tags.iter()
        .filter_map(|tag| block.get_scalar(tag))
        .find(|v| !v.is_null())
        .map(CifValue::to_label)
}

/// Symmetry operators from the first of `tags` present in the block.
pub(crate) fn symmetry_operators(block: &CifBlock, tags: &[&str]) -> Result<Vec<SymmetryOperator>, SymmetryError> {
    let Some(column) = tags.iter().find_map(|tag| block.get_column(tag)) else {
        return Ok(Vec::new());
    };
    column
        .iter()
        .filter(|v| !v.is_null())
        .map(|v| SymmetryOperator::parse(&v.to_label()))
        .collect()
}
