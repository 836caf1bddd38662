//! Well Record - one experimental well and its computed results

use serde::{Deserialize, Serialize};

use crate::fit::{FitRegion, FitResult, DEFAULT_FIT_END};
use crate::{Error, Result};

/// Values computed for a well during an analysis pass.
///
/// Results are `None` until a pass computes them, and are cleared again when
/// a later pass fails. `fit_end` starts at [`DEFAULT_FIT_END`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComputedFields {
    /// Slope of the covered-area fit
    pub slope: Option<f64>,
    /// Intercept of the covered-area fit
    pub intercept: Option<f64>,
    /// R² of the covered-area fit
    pub r_squared: Option<f64>,
    /// Migration velocity (µm per time unit, signed)
    pub velocity: Option<f64>,
    /// Estimated closure time
    pub closure_time: Option<f64>,
    /// First fitted index
    pub fit_begin: Option<f64>,
    /// Fraction of the covered-area range to fit
    pub fit_end: f64,
}

impl Default for ComputedFields {
    fn default() -> Self {
        Self {
            slope: None,
            intercept: None,
            r_squared: None,
            velocity: None,
            closure_time: None,
            fit_begin: None,
            fit_end: DEFAULT_FIT_END,
        }
    }
}

impl ComputedFields {
    /// Check whether a fit has been recorded.
    #[must_use]
    pub const fn is_fitted(&self) -> bool {
        self.slope.is_some()
    }
}

/// Well Record represents one row of the layout table.
///
/// Identity and metadata are fixed at load time; only the computed fields
/// change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WellRecord {
    well: String,
    cell: String,
    treatment: String,
    extra: Vec<String>,
    computed: ComputedFields,
}

impl WellRecord {
    /// Create a well record with default computed fields.
    ///
    /// # Arguments
    ///
    /// * `well` - Well identifier, also used to find `<well><suffix>.csv`
    /// * `cell` - Cell type
    /// * `treatment` - Treatment label
    #[must_use]
    pub fn new(
        well: impl Into<String>,
        cell: impl Into<String>,
        treatment: impl Into<String>,
    ) -> Self {
        WellRecordBuilder::new(well, cell, treatment).build()
    }

    /// Create a builder for constructing a well record with optional fields.
    #[must_use]
    pub fn builder(
        well: impl Into<String>,
        cell: impl Into<String>,
        treatment: impl Into<String>,
    ) -> WellRecordBuilder {
        WellRecordBuilder::new(well, cell, treatment)
    }

    /// Get the well identifier.
    #[must_use]
    pub fn well(&self) -> &str {
        &self.well
    }

    /// Get the cell type.
    #[must_use]
    pub fn cell(&self) -> &str {
        &self.cell
    }

    /// Get the treatment label.
    #[must_use]
    pub fn treatment(&self) -> &str {
        &self.treatment
    }

    /// Values of the passthrough layout columns, in schema order.
    #[must_use]
    pub fn extra(&self) -> &[String] {
        &self.extra
    }

    /// Get the computed fields.
    #[must_use]
    pub const fn computed(&self) -> &ComputedFields {
        &self.computed
    }

    /// Fit stored on the record, if one has been recorded.
    #[must_use]
    pub fn fit(&self) -> Option<FitResult> {
        Some(FitResult {
            slope: self.computed.slope?,
            intercept: self.computed.intercept?,
            r_squared: self.computed.r_squared?,
        })
    }

    /// Overwrite slope, intercept and R² with a new fit over `region`.
    #[allow(clippy::cast_precision_loss)]
    pub fn set_fit(&mut self, fit: &FitResult, region: FitRegion) {
        self.computed.slope = Some(fit.slope);
        self.computed.intercept = Some(fit.intercept);
        self.computed.r_squared = Some(fit.r_squared);
        self.computed.fit_begin = Some(region.begin() as f64);
    }

    /// Overwrite the migration velocity.
    pub fn set_velocity(&mut self, velocity: f64) {
        self.computed.velocity = Some(velocity);
    }

    /// Overwrite the closure time, or clear it when it is undefined.
    pub fn set_closure_time(&mut self, closure_time: Option<f64>) {
        self.computed.closure_time = closure_time;
    }

    /// Clear every result of the previous pass. The fit end is kept.
    pub fn clear_results(&mut self) {
        self.computed = ComputedFields {
            fit_end: self.computed.fit_end,
            ..ComputedFields::default()
        };
    }

    /// Set the fraction of the covered-area range used for the next fit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] unless `fit_end` is within `[0, 1]`.
    pub fn set_fit_end(&mut self, fit_end: f64) -> Result<()> {
        validate_fit_end(fit_end)?;
        self.computed.fit_end = fit_end;
        Ok(())
    }
}

pub(super) fn validate_fit_end(fit_end: f64) -> Result<()> {
    if (0.0..=1.0).contains(&fit_end) {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "fit-end fraction must be within [0, 1], got {fit_end}"
        )))
    }
}

/// Builder for `WellRecord`.
#[derive(Debug)]
pub struct WellRecordBuilder {
    well: String,
    cell: String,
    treatment: String,
    extra: Vec<String>,
    computed: ComputedFields,
}

impl WellRecordBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(
        well: impl Into<String>,
        cell: impl Into<String>,
        treatment: impl Into<String>,
    ) -> Self {
        Self {
            well: well.into(),
            cell: cell.into(),
            treatment: treatment.into(),
            extra: Vec::new(),
            computed: ComputedFields::default(),
        }
    }

    /// Set the passthrough layout column values.
    #[must_use]
    pub fn extra(mut self, extra: Vec<String>) -> Self {
        self.extra = extra;
        self
    }

    /// Set the initial fit-end fraction (clamped to `[0, 1]`).
    #[must_use]
    pub fn fit_end(mut self, fit_end: f64) -> Self {
        self.computed.fit_end = if fit_end.is_nan() {
            DEFAULT_FIT_END
        } else {
            fit_end.clamp(0.0, 1.0)
        };
        self
    }

    /// Set all computed fields (used when re-importing results).
    #[must_use]
    pub fn computed(mut self, computed: ComputedFields) -> Self {
        self.computed = computed;
        self
    }

    /// Build the `WellRecord`.
    #[must_use]
    pub fn build(self) -> WellRecord {
        WellRecord {
            well: self.well,
            cell: self.cell,
            treatment: self.treatment,
            extra: self.extra,
            computed: self.computed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::select_fit_region;

    #[test]
    fn test_well_record_defaults() {
        let record = WellRecord::new("B3", "MCF7", "DMSO");
        assert_eq!(record.well(), "B3");
        assert_eq!(record.cell(), "MCF7");
        assert_eq!(record.treatment(), "DMSO");
        assert!(record.extra().is_empty());
        assert_eq!(*record.computed(), ComputedFields::default());
        assert!((record.computed().fit_end - 0.6).abs() < f64::EPSILON);
        assert!(record.computed().slope.is_none());
        assert!(record.fit().is_none());
    }

    #[test]
    fn test_well_record_builder() {
        let record = WellRecord::builder("B3", "MCF7", "DMSO")
            .extra(vec!["plate-1".to_string()])
            .fit_end(0.8)
            .build();
        assert_eq!(record.extra(), ["plate-1".to_string()]);
        assert!((record.computed().fit_end - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn test_set_fit_overwrites() {
        let mut record = WellRecord::new("A1", "HeLa", "Control");
        let region = select_fit_region(&[0.0, 1.0, 2.0], 1.0).unwrap();
        record.set_fit(
            &FitResult {
                slope: 1.0,
                intercept: 2.0,
                r_squared: 0.5,
            },
            region,
        );
        record.set_fit(
            &FitResult {
                slope: -3.0,
                intercept: 4.0,
                r_squared: 0.9,
            },
            region,
        );
        let fit = record.fit().unwrap();
        assert!((fit.slope + 3.0).abs() < f64::EPSILON);
        assert!((fit.intercept - 4.0).abs() < f64::EPSILON);
        assert!((fit.r_squared - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clear_results_keeps_fit_end() {
        let mut record = WellRecord::builder("A1", "HeLa", "Control")
            .fit_end(0.3)
            .build();
        let region = select_fit_region(&[0.0, 1.0], 1.0).unwrap();
        record.set_fit(
            &FitResult {
                slope: 2.0,
                intercept: 1.0,
                r_squared: 1.0,
            },
            region,
        );
        record.set_velocity(0.5);
        record.set_closure_time(Some(12.0));
        assert!(record.computed().is_fitted());

        record.clear_results();
        let computed = record.computed();
        assert!(!computed.is_fitted());
        assert_eq!(computed.velocity, None);
        assert_eq!(computed.closure_time, None);
        assert_eq!(computed.fit_begin, None);
        assert!((computed.fit_end - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn test_set_fit_end_validation() {
        let mut record = WellRecord::new("A1", "HeLa", "Control");
        assert!(record.set_fit_end(1.2).is_err());
        assert!((record.computed().fit_end - 0.6).abs() < f64::EPSILON);
        record.set_fit_end(0.0).unwrap();
        assert!(record.computed().fit_end.abs() < f64::EPSILON);
    }
}
