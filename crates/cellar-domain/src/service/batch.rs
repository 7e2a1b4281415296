//! Batch processing of vessel readings
//!
//! Readings are filtered, resolved and converted one by one with no shared
//! mutable state. Failures are collected with the offending reading unless
//! strict mode asks to stop at the first one.

use chrono::NaiveDateTime;
use cellar_types::ExtractError;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::model::{
    BatchSummary, CalculationSettings, ExtractResult, MaterialCatalog, Reading, VesselClass,
};
use crate::repository::VesselRegistry;
use crate::service::aggregation::aggregate;
use crate::service::extract_calculator::ExtractCalculator;
use crate::service::geometry::VesselGeometryResolver;

/// Selects which readings take part in a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingFilter {
    pub from: Option<NaiveDateTime>,
    pub to: Option<NaiveDateTime>,
    pub classes: Vec<VesselClass>,
}

impl Default for ReadingFilter {
    fn default() -> Self {
        Self {
            from: None,
            to: None,
            classes: VesselClass::ALL.to_vec(),
        }
    }
}

impl ReadingFilter {
    pub fn with_window(mut self, from: Option<NaiveDateTime>, to: Option<NaiveDateTime>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    pub fn without_class(mut self, class: VesselClass) -> Self {
        self.classes.retain(|c| *c != class);
        self
    }

    /// Whether a reading passes the time window and class filter
    ///
    /// When a window is set, readings without a timestamp are dropped.
    /// Vessels whose class cannot be inferred from the id are kept so that
    /// unknown ids still surface as errors.
    pub fn accepts(&self, reading: &Reading) -> bool {
        if self.from.is_some() || self.to.is_some() {
            let Some(ts) = reading.timestamp else {
                return false;
            };
            if self.from.is_some_and(|from| ts < from) || self.to.is_some_and(|to| ts > to) {
                return false;
            }
        }

        match VesselClass::from_vessel_id(&reading.vessel_id) {
            Some(class) => self.classes.contains(&class),
            None => true,
        }
    }
}

/// A reading that could not be converted
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingFailure {
    pub reading: Reading,
    pub error: ExtractError,
}

/// Everything a batch run produces
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub results: Vec<ExtractResult>,
    pub failures: Vec<ReadingFailure>,
    pub summary: BatchSummary,
    /// Readings dropped by the filter
    pub skipped: usize,
}

/// Runs resolver, calculator and aggregation over a set of readings
pub struct BatchProcessor<'a> {
    resolver: VesselGeometryResolver<'a>,
    calculator: ExtractCalculator<'a>,
    strict: bool,
}

impl<'a> BatchProcessor<'a> {
    pub fn new(
        registry: &'a dyn VesselRegistry,
        materials: &'a MaterialCatalog,
        settings: &CalculationSettings,
    ) -> Self {
        Self {
            resolver: VesselGeometryResolver::new(registry, settings),
            calculator: ExtractCalculator::new(materials, settings),
            strict: settings.strict,
        }
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn resolver(&self) -> &VesselGeometryResolver<'a> {
        &self.resolver
    }

    pub fn calculator(&self) -> &ExtractCalculator<'a> {
        &self.calculator
    }

    /// Convert a single reading
    pub fn process_reading(&self, reading: &Reading) -> Result<ExtractResult, ExtractError> {
        let volume = self.resolver.resolve(&reading.vessel_id, reading.level)?;
        let result = self
            .calculator
            .compute_extract(&volume, reading.plato, &reading.material_code)?;
        Ok(result.with_timestamp(reading.timestamp))
    }

    /// Convert every accepted reading and aggregate the results
    ///
    /// In strict mode the first failing reading aborts the run with its error.
    pub fn run(
        &self,
        readings: &[Reading],
        filter: &ReadingFilter,
    ) -> Result<BatchOutcome, ExtractError> {
        let mut outcome = BatchOutcome::default();

        for reading in readings {
            if !filter.accepts(reading) {
                outcome.skipped += 1;
                continue;
            }

            match self.process_reading(reading) {
                Ok(result) => outcome.results.push(result),
                Err(error) if self.strict => return Err(error),
                Err(error) => {
                    warn!(
                        vessel = %reading.vessel_id,
                        kind = error.kind(),
                        "skipping reading: {}",
                        error
                    );
                    outcome.failures.push(ReadingFailure {
                        reading: reading.clone(),
                        error,
                    });
                }
            }
        }

        outcome.summary = aggregate(&outcome.results);

        info!(
            processed = outcome.results.len(),
            failed = outcome.failures.len(),
            skipped = outcome.skipped,
            total_kg = outcome.summary.total_kg,
            "batch complete"
        );

        Ok(outcome)
    }
}
