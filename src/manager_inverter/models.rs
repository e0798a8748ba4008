use chrono::NaiveDateTime;
use serde::Serialize;

/// One telemetry reading from the historical inverter export
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub timestamp: NaiveDateTime,
    pub instant_power_w: f64,
    pub cumulative_generation_kwh: f64,
}

/// An ordered series of samples, sorted ascending by timestamp
///
/// Built fresh on each ingestion and replaced wholesale on refresh.
/// Duplicate timestamps are retained in their file order.
#[derive(Debug)]
pub struct TimeSeries {
    samples: Vec<Sample>,
}

impl TimeSeries {
    pub(crate) fn from_samples(mut samples: Vec<Sample>) -> Self {
        samples.sort_by_key(|s| s.timestamp);
        Self { samples }
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.samples.last().map(|s| s.timestamp)
    }
}

/// One row of the monthly plant report, month rendered as MM.YYYY
#[derive(Debug, Clone, Serialize)]
pub struct MonthlyRecord {
    pub month: String,
    pub generation_kwh: f64,
}
