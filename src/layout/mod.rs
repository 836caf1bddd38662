//! Layout table: one record per well, metadata plus computed results
//!
//! ## Schema Overview
//!
//! ```text
//! layout CSV                         results CSV
//! ┌──────┬──────┬───────────┬─────┐  ┌─ layout columns ─┬───────┬───────────┬─────┬─────┐
//! │ Well │ Cell │ Treatment │ ... │  │ Well Cell ...    │ Slope │ Intercept │ ... │ End │
//! └──────┴──────┴───────────┴─────┘  └──────────────────┴───────┴───────────┴─────┴─────┘
//!             │  load_layout                        ▲  write_results
//!             ▼                                     │
//!        LayoutTable ──< WellRecord { metadata, ComputedFields }
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use scratch_assay::layout::{LayoutTable, WellRecord};
//!
//! let mut table = LayoutTable::new(vec![
//!     WellRecord::new("A1", "HeLa", "Control"),
//!     WellRecord::new("A2", "HeLa", "Drug"),
//! ]);
//!
//! // Narrow the linear region for a noisy well
//! table.override_fit_end(&[1], 0.4)?;
//! assert!((table.get(1)?.computed().fit_end - 0.4).abs() < f64::EPSILON);
//! assert!((table.get(0)?.computed().fit_end - 0.6).abs() < f64::EPSILON);
//! # Ok::<(), scratch_assay::Error>(())
//! ```

mod io;
mod table;
mod well_record;

pub use io::{load_layout, read_results, results_path, write_results, COMPUTED_COLUMNS};
pub use table::{LayoutColumns, LayoutSchema, LayoutTable};
pub use well_record::{ComputedFields, WellRecord, WellRecordBuilder};
