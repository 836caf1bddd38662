//! Layout Table - in-memory registry of wells, keyed by row index

use serde::{Deserialize, Serialize};

use super::well_record::validate_fit_end;
use super::WellRecord;
use crate::{Error, Result};

/// Names of the layout columns that identify a well.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutColumns {
    /// Well identifier column
    pub well: String,
    /// Cell type column
    pub cell: String,
    /// Treatment label column
    pub treatment: String,
}

impl Default for LayoutColumns {
    fn default() -> Self {
        Self {
            well: "Well".to_string(),
            cell: "Cell".to_string(),
            treatment: "Treatment".to_string(),
        }
    }
}

/// Column order of the layout file.
///
/// `columns` lists every layout column as it appeared in the source file.
/// Columns other than the three identifying ones are carried through each
/// record's `extra` values in the same order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutSchema {
    columns: Vec<String>,
    names: LayoutColumns,
}

impl LayoutSchema {
    /// Create a schema from the source column order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if one of the identifying columns is
    /// missing from `columns`.
    pub fn new(columns: Vec<String>, names: LayoutColumns) -> Result<Self> {
        for required in [&names.well, &names.cell, &names.treatment] {
            if !columns.iter().any(|c| c == required) {
                return Err(Error::InvalidInput(format!(
                    "layout schema is missing column '{required}'"
                )));
            }
        }
        Ok(Self { columns, names })
    }

    /// All layout columns in source order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Identifying column names.
    #[must_use]
    pub const fn names(&self) -> &LayoutColumns {
        &self.names
    }

    /// Passthrough columns, in source order.
    pub fn extra_columns(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .map(String::as_str)
            .filter(move |c| !self.is_identifying(c))
    }

    /// Number of passthrough columns.
    #[must_use]
    pub fn extra_len(&self) -> usize {
        self.extra_columns().count()
    }

    pub(super) fn is_identifying(&self, column: &str) -> bool {
        column == self.names.well || column == self.names.cell || column == self.names.treatment
    }

    /// Row values for `record`, in `columns()` order.
    pub(super) fn row_values<'a>(&self, record: &'a WellRecord) -> Vec<&'a str> {
        let mut extra = record.extra().iter();
        self.columns
            .iter()
            .map(|column| {
                if *column == self.names.well {
                    record.well()
                } else if *column == self.names.cell {
                    record.cell()
                } else if *column == self.names.treatment {
                    record.treatment()
                } else {
                    extra.next().map_or("", String::as_str)
                }
            })
            .collect()
    }
}

impl Default for LayoutSchema {
    fn default() -> Self {
        let names = LayoutColumns::default();
        Self {
            columns: vec![
                names.well.clone(),
                names.cell.clone(),
                names.treatment.clone(),
            ],
            names,
        }
    }
}

/// Mutable table of wells keyed by row index.
///
/// Single writer: the analysis driver updates rows in place, one well at a
/// time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutTable {
    schema: LayoutSchema,
    records: Vec<WellRecord>,
}

impl LayoutTable {
    /// Create a table with the default `Well, Cell, Treatment` schema.
    #[must_use]
    pub fn new(records: Vec<WellRecord>) -> Self {
        Self {
            schema: LayoutSchema::default(),
            records,
        }
    }

    /// Create a table with an explicit schema.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if a record's passthrough values do not
    /// match the schema's passthrough columns.
    pub fn with_schema(schema: LayoutSchema, records: Vec<WellRecord>) -> Result<Self> {
        let expected = schema.extra_len();
        if let Some((index, record)) = records
            .iter()
            .enumerate()
            .find(|(_, r)| r.extra().len() != expected)
        {
            return Err(Error::InvalidInput(format!(
                "row {index} (well {}) has {} metadata values, schema expects {expected}",
                record.well(),
                record.extra().len()
            )));
        }
        Ok(Self { schema, records })
    }

    /// Table schema.
    #[must_use]
    pub const fn schema(&self) -> &LayoutSchema {
        &self.schema
    }

    /// Number of wells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the table has no wells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in row order.
    #[must_use]
    pub fn records(&self) -> &[WellRecord] {
        &self.records
    }

    /// Iterate over records in row order.
    pub fn iter(&self) -> std::slice::Iter<'_, WellRecord> {
        self.records.iter()
    }

    /// Get a record by row index.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `index` is out of range.
    pub fn get(&self, index: usize) -> Result<&WellRecord> {
        let len = self.records.len();
        self.records
            .get(index)
            .ok_or_else(|| out_of_range(index, len))
    }

    /// Get a mutable record by row index.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `index` is out of range.
    pub fn get_mut(&mut self, index: usize) -> Result<&mut WellRecord> {
        let len = self.records.len();
        self.records
            .get_mut(index)
            .ok_or_else(|| out_of_range(index, len))
    }

    /// Find the row index of a well by identifier.
    #[must_use]
    pub fn position(&self, well: &str) -> Option<usize> {
        self.records.iter().position(|r| r.well() == well)
    }

    /// Set the fit-end fraction of the given rows, leaving all others untouched.
    ///
    /// Everything is validated before any row changes, so a bad index leaves
    /// the table as it was.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `fit_end` is outside `[0, 1]` or any
    /// index is out of range.
    pub fn override_fit_end(&mut self, indices: &[usize], fit_end: f64) -> Result<()> {
        validate_fit_end(fit_end)?;
        let len = self.records.len();
        if let Some(&bad) = indices.iter().find(|&&i| i >= len) {
            return Err(out_of_range(bad, len));
        }
        for &index in indices {
            self.records[index].set_fit_end(fit_end)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a LayoutTable {
    type Item = &'a WellRecord;
    type IntoIter = std::slice::Iter<'a, WellRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

fn out_of_range(index: usize, len: usize) -> Error {
    Error::InvalidInput(format!(
        "well index {index} out of range (layout has {len} wells)"
    ))
}
