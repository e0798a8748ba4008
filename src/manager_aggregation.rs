use std::collections::BTreeMap;
use chrono::{Datelike, NaiveDate, NaiveDateTime, TimeDelta};
use crate::manager_inverter::models::TimeSeries;
use crate::models::{DailyGeneration, DayHighlight, GenerationStatistics, HourlyPower};

const HOURS_PER_DAY: usize = 24;
/// Hour at which the vendor's collection day starts. The export's day
/// boundary is offset one hour from midnight.
const DAY_WINDOW_START_HOUR: u32 = 1;

/// Net generation for one calendar date, derived from the lifetime
/// counter as max minus min over the date's samples
///
/// Returns None when the date has no samples; a zero result is a valid
/// zero-generation day and the two are not interchangeable. Taking the
/// spread of the counter keeps the delta non-negative even when the
/// counter briefly runs backwards within the day.
///
/// # Arguments
///
/// * 'series' - normalized telemetry series
/// * 'date' - calendar date to compute for
pub fn daily_generation(series: &TimeSeries, date: NaiveDate) -> Option<f64> {
    let mut bounds: Option<(f64, f64)> = None;
    for sample in series.samples() {
        if sample.timestamp.date() != date {
            continue;
        }
        let v = sample.cumulative_generation_kwh;
        bounds = Some(match bounds {
            Some((min, max)) => (min.min(v), max.max(v)),
            None => (v, v),
        });
    }

    bounds.map(|(min, max)| max - min)
}

/// Lifetime generation reported by the inverter: the largest cumulative
/// counter value seen in the series
pub fn total_generation(series: &TimeSeries) -> Option<f64> {
    series.samples().iter()
        .map(|s| s.cumulative_generation_kwh)
        .reduce(f64::max)
}

/// Maps a timestamp to its collection day
///
/// Samples before the window start hour belong to the previous day's
/// profile.
pub fn collection_day(timestamp: NaiveDateTime) -> NaiveDate {
    (timestamp - TimeDelta::hours(i64::from(DAY_WINDOW_START_HOUR))).date()
}

/// Average power per hour over the vendor's 24-hour collection day
///
/// The window runs from 01:00 on the anchor date to 01:00 the next day.
/// All 24 buckets are present in hour order; hours without samples read 0.
/// Averages are converted from watts to kilowatts and rounded to two
/// decimals.
///
/// # Arguments
///
/// * 'series' - normalized telemetry series
/// * 'anchor_date' - collection day to profile
pub fn hourly_power_profile(series: &TimeSeries, anchor_date: NaiveDate) -> Vec<HourlyPower> {
    let window_start = anchor_date.and_hms_opt(DAY_WINDOW_START_HOUR, 0, 0).unwrap();
    let window_end = window_start + TimeDelta::hours(HOURS_PER_DAY as i64);

    let mut sums = [0.0f64; HOURS_PER_DAY];
    let mut counts = [0u32; HOURS_PER_DAY];

    for sample in series.samples() {
        if sample.timestamp < window_start || sample.timestamp >= window_end {
            continue;
        }
        let bucket = (sample.timestamp - window_start).num_hours() as usize;
        sums[bucket] += sample.instant_power_w;
        counts[bucket] += 1;
    }

    (0..HOURS_PER_DAY)
        .map(|bucket| {
            let avg_w = if counts[bucket] == 0 {
                0.0
            } else {
                sums[bucket] / f64::from(counts[bucket])
            };
            HourlyPower {
                label: format!("{:02}h", (DAY_WINDOW_START_HOUR as usize + bucket) % HOURS_PER_DAY),
                generation_kw: round2(avg_w / 1000.0),
            }
        })
        .collect()
}

/// Per-date net generation across the whole series, one entry per
/// calendar date carrying samples, in date order
pub fn daily_overview(series: &TimeSeries) -> Vec<DailyGeneration> {
    let mut bounds: BTreeMap<NaiveDate, (f64, f64)> = BTreeMap::new();
    for sample in series.samples() {
        let v = sample.cumulative_generation_kwh;
        bounds.entry(sample.timestamp.date())
            .and_modify(|(min, max)| {
                *min = min.min(v);
                *max = max.max(v);
            })
            .or_insert((v, v));
    }

    bounds.into_iter()
        .map(|(date, (min, max))| DailyGeneration {
            date,
            generation_kwh: round2(max - min),
            day_of_week: date.format("%A").to_string(),
            month: date.format("%B").to_string(),
            year: date.year(),
        })
        .collect()
}

/// Summary statistics over a daily overview; None when it is empty
///
/// The standard deviation is the sample deviation and reads 0 for a
/// single-day overview.
pub fn generation_statistics(days: &[DailyGeneration]) -> Option<GenerationStatistics> {
    let first = days.first()?;
    let last = days.last()?;

    let total: f64 = days.iter().map(|d| d.generation_kwh).sum();
    let mean = total / days.len() as f64;
    let max_daily = days.iter().map(|d| d.generation_kwh).reduce(f64::max)?;
    let min_daily = days.iter().map(|d| d.generation_kwh).reduce(f64::min)?;
    let variance = if days.len() < 2 {
        0.0
    } else {
        days.iter()
            .map(|d| (d.generation_kwh - mean).powi(2))
            .sum::<f64>() / (days.len() - 1) as f64
    };

    Some(GenerationStatistics {
        total_days: days.len(),
        total_generation: round2(total),
        average_daily: round2(mean),
        max_daily: round2(max_daily),
        min_daily: round2(min_daily),
        std_deviation: round2(variance.sqrt()),
        period_start: first.date,
        period_end: last.date,
    })
}

/// The overview day with the highest generation
pub fn best_day(days: &[DailyGeneration]) -> Option<DayHighlight> {
    days.iter()
        .max_by(|a, b| a.generation_kwh.total_cmp(&b.generation_kwh))
        .map(highlight)
}

/// The overview day with the lowest generation
pub fn worst_day(days: &[DailyGeneration]) -> Option<DayHighlight> {
    days.iter()
        .min_by(|a, b| a.generation_kwh.total_cmp(&b.generation_kwh))
        .map(highlight)
}

fn highlight(day: &DailyGeneration) -> DayHighlight {
    DayHighlight { date: day.date, generation_kwh: day.generation_kwh }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
