use std::sync::Arc;
use actix_web::{get, web, HttpResponse, Responder};
use chrono::Local;
use log::error;
use serde::Serialize;
use serde_json::json;
use crate::AppState;
use crate::initialization::find_export_file;
use crate::manager_aggregation::{
    best_day, collection_day, daily_generation, daily_overview, generation_statistics,
    hourly_power_profile, total_generation, worst_day,
};
use crate::manager_inverter::load_monthly_report;
use crate::manager_inverter::models::TimeSeries;
use crate::models::{DailyGeneration, DayHighlight, GenerationStatistics};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Kpis {
    today_gen_kwh: f64,
    total_gen_kwh: f64,
}

#[derive(Serialize)]
struct GenerationHistory {
    labels: Vec<String>,
    generation_kw: Vec<f64>,
}

#[derive(Serialize)]
struct DailyGenerationReport {
    daily_generation: Vec<DailyGeneration>,
    statistics: GenerationStatistics,
    best_day: DayHighlight,
    worst_day: DayHighlight,
}

/// Headline numbers for the dashboard: today's generation and the
/// lifetime total. A day without samples reads as zero here.
#[get("/api/kpis")]
pub async fn get_kpis(data: web::Data<AppState>) -> impl Responder {
    let series = match load_series(&data).await {
        Ok(series) => series,
        Err(response) => return response,
    };

    let today = Local::now().date_naive();
    let kpis = Kpis {
        today_gen_kwh: daily_generation(&series, today).unwrap_or(0.0),
        total_gen_kwh: total_generation(&series).unwrap_or(0.0),
    };

    HttpResponse::Ok().json(kpis)
}

/// Hourly power profile for the most recent collection day in the series
#[get("/api/generation/history")]
pub async fn get_generation_history(data: web::Data<AppState>) -> impl Responder {
    let series = match load_series(&data).await {
        Ok(series) => series,
        Err(response) => return response,
    };

    let anchor = match series.last_timestamp() {
        Some(last) => collection_day(last),
        None => return error_response("inverter series is empty"),
    };

    let profile = hourly_power_profile(&series, anchor);
    let history = GenerationHistory {
        labels: profile.iter().map(|h| h.label.clone()).collect(),
        generation_kw: profile.iter().map(|h| h.generation_kw).collect(),
    };

    HttpResponse::Ok().json(history)
}

/// Per-day generation across the whole export, with summary statistics
#[get("/api/daily-generation")]
pub async fn get_daily_generation(data: web::Data<AppState>) -> impl Responder {
    let series = match load_series(&data).await {
        Ok(series) => series,
        Err(response) => return response,
    };

    let days = daily_overview(&series);
    let (Some(statistics), Some(best), Some(worst)) =
        (generation_statistics(&days), best_day(&days), worst_day(&days))
    else {
        return error_response("inverter series is empty");
    };

    HttpResponse::Ok().json(DailyGenerationReport {
        daily_generation: days,
        statistics,
        best_day: best,
        worst_day: worst,
    })
}

/// Monthly plant-report pass-through
#[get("/api/reports/monthly")]
pub async fn get_monthly_report(data: web::Data<AppState>) -> impl Responder {
    let files = &data.config.files;
    let path = match find_export_file(&files.data_dir, &files.monthly_pattern) {
        Some(path) => path,
        None => return error_response("monthly report not found"),
    };

    match load_monthly_report(&path).await {
        Ok(records) => HttpResponse::Ok().json(records),
        Err(e) => {
            error!("loading monthly report: {}", e);
            error_response("unable to load monthly report")
        }
    }
}

/// Resolves the historical export and returns the cached series for it
async fn load_series(state: &AppState) -> Result<Arc<TimeSeries>, HttpResponse> {
    let files = &state.config.files;
    let path = match find_export_file(&files.data_dir, &files.historical_pattern) {
        Some(path) => path,
        None => return Err(error_response("historical export not found")),
    };

    state.series_cache.load_or_refresh(&path).await.map_err(|e| {
        error!("loading historical export: {}", e);
        error_response("unable to load inverter data")
    })
}

fn error_response(message: &str) -> HttpResponse {
    HttpResponse::InternalServerError().json(json!({ "error": message }))
}
