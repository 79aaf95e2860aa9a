use actix_web::{middleware, web, App, HttpResponse, HttpServer, Result};
use chrono::{Datelike, Utc};
use serde::Deserialize;
use std::sync::{Mutex, MutexGuard};
use tracing::info;

use crate::parser::parse_entries_csv;
use crate::timeline::{now_marker_percent, ScheduleEntry, Timeline, TimezoneMode};

// In-memory snapshot of the schedule; every request recomputes the timeline from it
pub struct AppState {
    pub entries: Mutex<Vec<ScheduleEntry>>,
    pub timeline: Timeline,
    /// Zone used when a request carries no `tz`.
    pub display: TimezoneMode,
}

impl AppState {
    pub fn new(entries: Vec<ScheduleEntry>, timeline: Timeline, display: TimezoneMode) -> Self {
        Self {
            entries: Mutex::new(entries),
            timeline,
            display,
        }
    }

    fn entries(&self) -> Result<MutexGuard<'_, Vec<ScheduleEntry>>> {
        self.entries
            .lock()
            .map_err(|_| actix_web::error::ErrorInternalServerError("Entry store is unavailable"))
    }
}

#[derive(Deserialize)]
pub struct ZoneQuery {
    tz: Option<String>,
}

impl ZoneQuery {
    fn zone(&self, default: TimezoneMode) -> std::result::Result<TimezoneMode, HttpResponse> {
        match &self.tz {
            Some(tz) => tz.parse().map_err(|e: crate::error::TimelineError| {
                HttpResponse::BadRequest().json(serde_json::json!({"success": false, "error": e.to_string()}))
            }),
            None => Ok(default),
        }
    }
}

// Timeline rows for the current window
async fn get_timeline(query: web::Query<ZoneQuery>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let display = match query.zone(state.display) {
        Ok(zone) => zone,
        Err(response) => return Ok(response),
    };
    let now = Utc::now();
    let window = state.timeline.window(now, display);
    let rows = {
        let entries = state.entries()?;
        state.timeline.compute(&entries, now, display)
    };

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "timezone": display.to_string(),
        "window": window,
        "nowPercent": now_marker_percent(now, &window),
        "rows": rows,
    })))
}

// Window bounds, day columns and the now marker
async fn get_window(query: web::Query<ZoneQuery>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let display = match query.zone(state.display) {
        Ok(zone) => zone,
        Err(response) => return Ok(response),
    };
    let now = Utc::now();
    let window = state.timeline.window(now, display);
    let vocab = state.timeline.vocabulary();
    let days: Vec<String> = window
        .day_columns(display)
        .into_iter()
        .map(|date| format!("{}{}({})", date.day(), vocab.day_of_month_suffix, vocab.weekday_label(date.weekday())))
        .collect();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "timezone": display.to_string(),
        "window": window,
        "days": days,
        "nowPercent": now_marker_percent(now, &window),
    })))
}

async fn get_entries(state: web::Data<AppState>) -> Result<HttpResponse> {
    let entries = state.entries()?;
    Ok(HttpResponse::Ok().json(&*entries))
}

// Replace the snapshot with a JSON array of entries
async fn replace_entries(body: web::Json<Vec<ScheduleEntry>>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let new_entries = body.into_inner();
    let count = new_entries.len();
    *state.entries()? = new_entries;
    info!(count, "schedule entries replaced");
    Ok(HttpResponse::Ok().json(serde_json::json!({"success": true, "count": count})))
}

// Replace the snapshot from a CSV upload
async fn upload_csv(body: web::Bytes, state: web::Data<AppState>) -> Result<HttpResponse> {
    match parse_entries_csv(&body) {
        Ok(new_entries) => {
            let count = new_entries.len();
            *state.entries()? = new_entries;
            info!(count, "schedule entries uploaded");
            Ok(HttpResponse::Ok().json(serde_json::json!({"success": true, "count": count})))
        }
        Err(e) => Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "error": format!("Failed to process CSV: {}", e)
        }))),
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/timeline", web::get().to(get_timeline))
        .route("/api/window", web::get().to(get_window))
        .route("/api/entries", web::get().to(get_entries))
        .route("/api/entries", web::post().to(replace_entries))
        .route("/api/upload", web::post().to(upload_csv));
}

pub async fn start_server(port: u16, state: AppState) -> std::io::Result<()> {
    let state = web::Data::new(state);

    info!(port, "starting web server");
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::Logger::default())
            .configure(configure)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::TimelineOptions;
    use actix_web::{http::StatusCode, test};

    fn state() -> web::Data<AppState> {
        let timeline = Timeline::new(TimelineOptions {
            source: TimezoneMode::Utc,
            ..Default::default()
        })
        .unwrap();
        let daily = ScheduleEntry {
            id: "arena".to_string(),
            day: "매일".to_string(),
            time: "12:00".to_string(),
            ..Default::default()
        };
        web::Data::new(AppState::new(vec![daily], timeline, TimezoneMode::Utc))
    }

    #[actix_web::test]
    async fn timeline_returns_rows() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;
        let req = test::TestRequest::get().uri("/api/timeline?tz=utc").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["timezone"], "UTC");
        assert_eq!(body["rows"][0]["id"], "arena");
        assert_eq!(body["rows"][0]["bars"].as_array().map(Vec::len), Some(7));
    }

    #[actix_web::test]
    async fn invalid_zone_is_rejected() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;
        let req = test::TestRequest::get().uri("/api/window?tz=mars").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn upload_replaces_entries() {
        let state = state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;
        let req = test::TestRequest::post()
            .uri("/api/upload")
            .set_payload("id,day,time\nkvk,토,22:00\nraid,화,21:00\n")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        assert_eq!(state.entries.lock().unwrap().len(), 2);
    }
}
