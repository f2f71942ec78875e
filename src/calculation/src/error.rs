/// Error taxonomy for the analysis pipeline.
///
/// Extraction and scoring failures are per-item: batch stages collect them in a
/// [`BatchReport`] and keep going. Only when every item of a batch fails does a
/// stage surface [`AnalysisError::AllItemsFailed`].

use std::fmt;

use thiserror::Error;

/// Errors raised by the analysis stages.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Too few angle samples to locate an interior optimum.
    #[error("airfoil {airfoil} at Re={reynolds:.0}: {found} angle samples, need at least {required}")]
    EmptySampleSet {
        airfoil: String,
        reynolds: f64,
        found: usize,
        required: usize,
    },

    /// A raw sample is non-physical (non-positive drag, non-finite value).
    #[error("airfoil {airfoil}: invalid sample at alpha={alpha_deg}° Re={reynolds:.0}: {reason}")]
    InvalidSample {
        airfoil: String,
        alpha_deg: f64,
        reynolds: f64,
        reason: String,
    },

    /// Mission weights are malformed or do not sum to 1.0.
    #[error("invalid mission profile '{profile}': {reason}")]
    InvalidProfile { profile: String, reason: String },

    /// The 3D solver failed for one configuration.
    #[error("solve failed for {configuration}: {failure}")]
    Solve {
        configuration: String,
        failure: SolveFailure,
    },

    /// The external coefficient predictor failed.
    #[error("coefficient predictor failed for {airfoil}: {reason}")]
    Predictor { airfoil: String, reason: String },

    /// Every item of a batch stage failed.
    #[error("{stage}: all {attempted} items failed")]
    AllItemsFailed {
        stage: &'static str,
        attempted: usize,
        report: BatchReport,
    },

    /// Settings rejected on load.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Building a tabular export failed.
    #[error("table export failed: {0}")]
    Table(String),
}

impl From<config::ConfigError> for AnalysisError {
    fn from(err: config::ConfigError) -> Self {
        AnalysisError::Config(err.to_string())
    }
}

impl From<polars::error::PolarsError> for AnalysisError {
    fn from(err: polars::error::PolarsError) -> Self {
        AnalysisError::Table(err.to_string())
    }
}

/// Why a single wing solve was rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolveFailure {
    #[error("solver error: {0}")]
    Solver(String),
    #[error("non-finite coefficients")]
    NonFinite,
    #[error("negative lift coefficient {0:.4} at a positive-lift design point")]
    NegativeLift(f64),
    #[error("negative drag coefficient {0:.4}")]
    NegativeDrag(f64),
    #[error("no section geometry for airfoil {0}")]
    UnknownSection(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// One failed item of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemFailure {
    pub id: String,
    pub reason: String,
}

/// Per-stage success/failure summary.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchReport {
    pub attempted: usize,
    pub succeeded: usize,
    /// Items never processed (cancelled before dispatch).
    pub skipped: usize,
    pub failures: Vec<ItemFailure>,
}

impl BatchReport {
    pub fn record_success(&mut self) {
        self.attempted += 1;
        self.succeeded += 1;
    }

    pub fn record_failure(&mut self, id: impl Into<String>, reason: impl ToString) {
        self.attempted += 1;
        self.failures.push(ItemFailure {
            id: id.into(),
            reason: reason.to_string(),
        });
    }

    pub fn record_skipped(&mut self) {
        self.attempted += 1;
        self.skipped += 1;
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Identifiers of the failed items, in batch order.
    pub fn failed_ids(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.id.as_str()).collect()
    }

    /// True when something was attempted and nothing succeeded.
    pub fn all_failed(&self) -> bool {
        self.attempted > 0 && self.succeeded == 0 && self.skipped == 0
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} succeeded, {} failed",
            self.succeeded,
            self.attempted,
            self.failed()
        )?;
        if self.skipped > 0 {
            write!(f, ", {} skipped", self.skipped)?;
        }
        if !self.failures.is_empty() {
            write!(f, " [{}]", self.failed_ids().join(", "))?;
        }
        Ok(())
    }
}

/// Successful items of a batch together with the failure summary.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome<T> {
    pub items: Vec<T>,
    pub report: BatchReport,
}

impl<T> BatchOutcome<T> {
    /// Converts an all-failed batch into [`AnalysisError::AllItemsFailed`].
    pub fn into_result(self, stage: &'static str) -> Result<Self> {
        if self.report.all_failed() {
            return Err(AnalysisError::AllItemsFailed {
                stage,
                attempted: self.report.attempted,
                report: self.report,
            });
        }
        Ok(self)
    }
}
