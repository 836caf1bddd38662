//! Layout and results files (comma-separated, header row)

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::{ComputedFields, LayoutColumns, LayoutSchema, LayoutTable, WellRecord};
use crate::{Error, Result};

/// Computed column headers appended to the layout columns in a results file.
pub const COMPUTED_COLUMNS: [&str; 7] = [
    "Slope",
    "Intercept",
    "R^2 score",
    "Velocity",
    "Time",
    "Begin",
    "End",
];

/// Whether computed columns are read back or reset to defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Computed {
    Reset,
    Parse,
}

/// Load a layout file, constructing every record with default computed fields.
///
/// Computed columns already present (e.g. a results file reused as a layout)
/// are dropped and reset.
///
/// # Errors
///
/// Returns [`Error::MalformedInput`] if an identifying column is missing or a
/// row has the wrong number of fields, and [`Error::Csv`]/[`Error::Io`] if
/// the file cannot be read.
pub fn load_layout<P: AsRef<Path>>(path: P, columns: &LayoutColumns) -> Result<LayoutTable> {
    read_table(path.as_ref(), columns, Computed::Reset)
}

/// Re-import a results file written by [`write_results`].
///
/// # Errors
///
/// Returns [`Error::MalformedInput`] if a computed column is missing or a
/// value does not parse as a number.
pub fn read_results<P: AsRef<Path>>(path: P, columns: &LayoutColumns) -> Result<LayoutTable> {
    read_table(path.as_ref(), columns, Computed::Parse)
}

/// Conventional results file location: `<output_dir>/Results_<date>.csv`.
#[must_use]
pub fn results_path(output_dir: &Path, date: &str) -> PathBuf {
    output_dir.join(format!("Results_{date}.csv"))
}

/// Write the layout table with all computed fields.
///
/// The parent directory is created if needed. Numbers are written in their
/// shortest round-trip form so a re-import reproduces them exactly; results
/// a well does not have are written as empty cells.
///
/// # Errors
///
/// Returns [`Error::Io`]/[`Error::Csv`] on write failure.
pub fn write_results<P: AsRef<Path>>(table: &LayoutTable, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    let schema = table.schema();

    let mut header: Vec<&str> = schema.columns().iter().map(String::as_str).collect();
    header.extend(COMPUTED_COLUMNS);
    writer.write_record(&header)?;

    for record in table {
        let c = record.computed();
        let mut row: Vec<String> = schema
            .row_values(record)
            .into_iter()
            .map(str::to_string)
            .collect();
        row.extend(
            [
                c.slope,
                c.intercept,
                c.r_squared,
                c.velocity,
                c.closure_time,
                c.fit_begin,
            ]
            .iter()
            .map(|v| v.map_or_else(String::new, |v| v.to_string())),
        );
        row.push(c.fit_end.to_string());
        writer.write_record(&row)?;
    }

    writer.flush()?;
    info!(path = %path.display(), wells = table.len(), "Wrote results");
    Ok(())
}

fn read_table(path: &Path, names: &LayoutColumns, computed: Computed) -> Result<LayoutTable> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let index: HashMap<&str, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.as_str(), i))
        .collect();

    let column = |name: &str| {
        index
            .get(name)
            .copied()
            .ok_or_else(|| Error::malformed(path, format!("missing column '{name}'")))
    };
    let well_idx = column(&names.well)?;
    let cell_idx = column(&names.cell)?;
    let treatment_idx = column(&names.treatment)?;
    let computed_idx: Vec<usize> = match computed {
        Computed::Parse => COMPUTED_COLUMNS
            .iter()
            .map(|name| column(name))
            .collect::<Result<_>>()?,
        Computed::Reset => Vec::new(),
    };

    if computed == Computed::Reset {
        let dropped: Vec<&str> = headers
            .iter()
            .map(String::as_str)
            .filter(|h| COMPUTED_COLUMNS.contains(h))
            .collect();
        if dropped.len() == COMPUTED_COLUMNS.len() {
            debug!(path = %path.display(), "Resetting computed columns of a results file");
        } else if !dropped.is_empty() {
            warn!(
                path = %path.display(),
                columns = ?dropped,
                "Dropping layout columns named like computed results"
            );
        }
    }

    let layout_columns: Vec<String> = headers
        .iter()
        .filter(|h| !COMPUTED_COLUMNS.contains(&h.as_str()))
        .cloned()
        .collect();
    let schema = LayoutSchema::new(layout_columns, names.clone())?;
    let extra_idx: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| {
            !COMPUTED_COLUMNS.contains(&h.as_str()) && !schema.is_identifying(h.as_str())
        })
        .map(|(i, _)| i)
        .collect();

    let mut records = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let line = row + 2;
        let fields = result.map_err(|e| Error::malformed(path, format!("line {line}: {e}")))?;
        let field = |i: usize| fields.get(i).unwrap_or_default();

        let mut builder =
            WellRecord::builder(field(well_idx), field(cell_idx), field(treatment_idx))
                .extra(extra_idx.iter().map(|&i| field(i).to_string()).collect());

        if computed == Computed::Parse {
            let number = |k: usize| -> Result<Option<f64>> {
                let raw = field(computed_idx[k]);
                if raw.is_empty() {
                    return Ok(None);
                }
                raw.parse().map(Some).map_err(|_| {
                    let name = COMPUTED_COLUMNS[k];
                    Error::malformed(
                        path,
                        format!("line {line}: column '{name}' has non-numeric value '{raw}'"),
                    )
                })
            };
            let mut values = [None; COMPUTED_COLUMNS.len()];
            for (k, value) in values.iter_mut().enumerate() {
                *value = number(k)?;
            }
            let [slope, intercept, r_squared, velocity, closure_time, fit_begin, fit_end] = values;
            let fit_end = fit_end.ok_or_else(|| {
                Error::malformed(path, format!("line {line}: column 'End' is empty"))
            })?;
            builder = builder.computed(ComputedFields {
                slope,
                intercept,
                r_squared,
                velocity,
                closure_time,
                fit_begin,
                fit_end,
            });
        }

        let record = builder.build();
        if record.well().is_empty() {
            return Err(Error::malformed(
                path,
                format!("line {line}: empty well identifier"),
            ));
        }
        records.push(record);
    }

    debug!(path = %path.display(), wells = records.len(), "Read layout table");
    LayoutTable::with_schema(schema, records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("scratch_assay_layout_{name}"));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_load_layout_defaults_and_passthrough() {
        let dir = temp_dir("load");
        let path = dir.join("20181102_metadata.csv");
        fs::write(
            &path,
            "Well,Cell,Treatment,Replicate\nA1,HeLa,Control,1\nA2, HeLa ,Drug,2\n",
        )
        .unwrap();

        let table = load_layout(&path, &LayoutColumns::default()).unwrap();
        assert_eq!(table.len(), 2);
        let second = table.get(1).unwrap();
        assert_eq!(second.well(), "A2");
        assert_eq!(second.cell(), "HeLa");
        assert_eq!(second.extra(), ["2".to_string()]);
        assert_eq!(*second.computed(), ComputedFields::default());
    }

    #[test]
    fn test_load_layout_missing_column() {
        let dir = temp_dir("missing");
        let path = dir.join("layout.csv");
        fs::write(&path, "Well,Cell\nA1,HeLa\n").unwrap();

        let err = load_layout(&path, &LayoutColumns::default()).unwrap_err();
        assert!(matches!(err, Error::MalformedInput { .. }));
        assert!(err.to_string().contains("Treatment"));
    }

    #[test]
    fn test_load_layout_resets_stale_results() {
        let dir = temp_dir("stale");
        let path = dir.join("layout.csv");
        fs::write(
            &path,
            "Well,Cell,Treatment,Slope,End\nA1,HeLa,Control,9.5,0.2\n",
        )
        .unwrap();

        let table = load_layout(&path, &LayoutColumns::default()).unwrap();
        assert_eq!(table.schema().columns(), ["Well", "Cell", "Treatment"]);
        assert_eq!(*table.get(0).unwrap().computed(), ComputedFields::default());
    }

    #[test]
    fn test_results_round_trip() {
        let dir = temp_dir("round_trip");
        let layout = dir.join("layout.csv");
        fs::write(&layout, "Plate,Well,Cell,Treatment\nP1,A1,HeLa,Control\n").unwrap();

        let mut table = load_layout(&layout, &LayoutColumns::default()).unwrap();
        let record = table.get_mut(0).unwrap();
        record.set_velocity(-0.001_611_52);
        record.set_closure_time(Some(-1666.333_333_333_333_3));
        record.set_fit_end(0.45).unwrap();

        let out = results_path(&dir.join("output"), "20181102");
        write_results(&table, &out).unwrap();
        assert!(out.ends_with("output/Results_20181102.csv"));

        let reread = read_results(&out, &LayoutColumns::default()).unwrap();
        assert_eq!(reread, table);
    }

    #[test]
    fn test_missing_results_are_empty_cells() {
        let dir = temp_dir("empty_cells");
        let out = dir.join("Results_empty.csv");
        let mut table = LayoutTable::new(vec![
            WellRecord::new("A1", "HeLa", "Control"),
            WellRecord::new("A2", "HeLa", "Drug"),
        ]);
        table.get_mut(0).unwrap().set_velocity(0.5);
        write_results(&table, &out).unwrap();

        let text = fs::read_to_string(&out).unwrap();
        let rows: Vec<&str> = text.lines().skip(1).collect();
        assert_eq!(rows, ["A1,HeLa,Control,,,,0.5,,,0.6", "A2,HeLa,Drug,,,,,,,0.6"]);

        let reread = read_results(&out, &LayoutColumns::default()).unwrap();
        assert_eq!(reread, table);
        assert_eq!(reread.get(1).unwrap().computed().velocity, None);
    }

    #[test]
    fn test_read_results_requires_fit_end() {
        let dir = temp_dir("no_end");
        let path = dir.join("Results_x.csv");
        fs::write(
            &path,
            "Well,Cell,Treatment,Slope,Intercept,R^2 score,Velocity,Time,Begin,End\n\
             A1,HeLa,Control,,,,,,,\n",
        )
        .unwrap();

        let err = read_results(&path, &LayoutColumns::default()).unwrap_err();
        assert!(err.to_string().contains("'End' is empty"));
    }

    #[test]
    fn test_load_layout_partial_computed_names_dropped() {
        let dir = temp_dir("partial");
        let path = dir.join("layout.csv");
        fs::write(&path, "Well,Cell,Treatment,Time\nA1,HeLa,Control,24h\n").unwrap();

        let table = load_layout(&path, &LayoutColumns::default()).unwrap();
        assert_eq!(table.schema().columns(), ["Well", "Cell", "Treatment"]);
        assert!(table.get(0).unwrap().extra().is_empty());
    }

    #[test]
    fn test_read_results_rejects_bad_number() {
        let dir = temp_dir("bad_number");
        let path = dir.join("Results_x.csv");
        fs::write(
            &path,
            "Well,Cell,Treatment,Slope,Intercept,R^2 score,Velocity,Time,Begin,End\n\
             A1,HeLa,Control,abc,0,0,0,0,0,0.6\n",
        )
        .unwrap();

        let err = read_results(&path, &LayoutColumns::default()).unwrap_err();
        assert!(err.to_string().contains("abc"));
        assert!(err.to_string().contains("Slope"));
    }
}
