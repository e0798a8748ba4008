use chrono::NaiveDate;
use serde::Serialize;

/// One calendar day of net generation derived from the lifetime counter
#[derive(Debug, Clone, Serialize)]
pub struct DailyGeneration {
    pub date: NaiveDate,
    pub generation_kwh: f64,
    pub day_of_week: String,
    pub month: String,
    pub year: i32,
}

/// One bucket of the 24-hour power profile
#[derive(Debug, Clone, Serialize)]
pub struct HourlyPower {
    pub label: String,
    pub generation_kw: f64,
}

/// A single day singled out of the overview, e.g. best or worst day
#[derive(Debug, Clone, Serialize)]
pub struct DayHighlight {
    pub date: NaiveDate,
    pub generation_kwh: f64,
}

/// Summary statistics over a daily overview
#[derive(Debug, Clone, Serialize)]
pub struct GenerationStatistics {
    pub total_days: usize,
    pub total_generation: f64,
    pub average_daily: f64,
    pub max_daily: f64,
    pub min_daily: f64,
    pub std_deviation: f64,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
}
