//! HTTP front-end (§4.L): `GET /variables`, `GET /cfs2`, `GET /cmip6`.
//!
//! Query parameters are accepted as loosely-typed strings and validated by
//! hand, the same shape the workspace's WMS/WMTS handlers use, so that a bad
//! request reports its own `detail` message rather than `axum`'s generic
//! query-rejection text.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Extension, Query};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use futures::stream;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use ingestion::{cfs2_band, cfs2_variable_names, cmip6_variable, QueryResult, CMIP6_VARS};
use wms_common::ClimateError;

use crate::config::Settings;
use crate::driver::{run_query, QueryKind};

/// Minimum size of a streamed response chunk, per §4.L.
const MIN_CHUNK_BYTES: usize = 10 * 1024;

pub async fn serve(settings: Settings, listen: String) -> anyhow::Result<()> {
    let state = Arc::new(settings);

    let app = Router::new()
        .route("/variables", get(variables_handler))
        .route("/cfs2", get(cfs2_handler))
        .route("/cmip6", get(cmip6_handler))
        .route("/health", get(health_handler))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = listen.parse()?;
    info!(address = %addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn variables_handler() -> impl IntoResponse {
    let mut cfs2 = serde_json::Map::new();
    for name in cfs2_variable_names() {
        let band = cfs2_band(name).expect("listed name is in the catalog");
        cfs2.insert(
            name.to_string(),
            json!({"en": band.label_en, "ru": band.label_ru}),
        );
    }

    let mut cmip6 = serde_json::Map::new();
    for v in CMIP6_VARS {
        cmip6.insert(
            v.name.to_string(),
            json!({"en": v.label_en, "ru": v.label_ru}),
        );
    }

    Json(json!({"cfs2": cfs2, "cmip6": cmip6}))
}

#[derive(Debug, Deserialize)]
pub struct PointQueryParams {
    lat: Option<f64>,
    lon: Option<f64>,
    begin: Option<String>,
    end: Option<String>,
    #[serde(default)]
    var: Vec<String>,
}

struct ParsedQuery {
    lat: f64,
    lon: f64,
    begin: NaiveDate,
    end: NaiveDate,
    variables: Vec<String>,
}

fn parse_point_query(params: PointQueryParams) -> Result<ParsedQuery, String> {
    let lat = params.lat.ok_or("`lat` is required")?;
    let lon = params.lon.ok_or("`lon` is required")?;
    let begin = params.begin.as_deref().ok_or("`begin` is required")?;
    let end = params.end.as_deref().ok_or("`end` is required")?;
    let begin = NaiveDate::parse_from_str(begin, "%Y-%m-%d")
        .map_err(|_| format!("`begin` is not a valid YYYY-MM-DD date: {begin}"))?;
    let end = NaiveDate::parse_from_str(end, "%Y-%m-%d")
        .map_err(|_| format!("`end` is not a valid YYYY-MM-DD date: {end}"))?;
    if params.var.is_empty() {
        return Err("at least one `var` is required".to_string());
    }
    Ok(ParsedQuery {
        lat,
        lon,
        begin,
        end,
        variables: params.var,
    })
}

async fn cfs2_handler(
    Extension(settings): Extension<Arc<Settings>>,
    Query(params): Query<PointQueryParams>,
) -> Response {
    run_point_query(&settings, QueryKind::Cfs2, params, |name| {
        cfs2_band(name).map(|_| ()).ok_or_else(|| format!("unknown cfs2 variable: {name}"))
    })
    .await
}

async fn cmip6_handler(
    Extension(settings): Extension<Arc<Settings>>,
    Query(params): Query<PointQueryParams>,
) -> Response {
    run_point_query(&settings, QueryKind::Cmip6, params, |name| {
        cmip6_variable(name).map(|_| ()).ok_or_else(|| format!("unknown cmip6 variable: {name}"))
    })
    .await
}

async fn run_point_query(
    settings: &Settings,
    kind: QueryKind,
    params: PointQueryParams,
    check_variable: impl Fn(&str) -> Result<(), String>,
) -> Response {
    let parsed = match parse_point_query(params) {
        Ok(p) => p,
        Err(detail) => return validation_error(detail),
    };
    for name in &parsed.variables {
        if let Err(detail) = check_variable(name) {
            return validation_error(detail);
        }
    }

    let variables: Vec<&str> = parsed.variables.iter().map(String::as_str).collect();
    match run_query(
        settings,
        kind,
        parsed.begin,
        parsed.end,
        parsed.lat,
        parsed.lon,
        &variables,
    ) {
        Ok(result) => stream_rows(result).into_response(),
        Err(err) => climate_error_response(err),
    }
}

fn validation_error(detail: String) -> Response {
    (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({"detail": detail}))).into_response()
}

fn climate_error_response(err: ClimateError) -> Response {
    let status =
        StatusCode::from_u16(err.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(json!({"detail": err.to_string()}))).into_response()
}

#[derive(Serialize)]
struct Row<'a> {
    date: String,
    #[serde(flatten)]
    values: std::collections::BTreeMap<&'a str, Option<f32>>,
}

/// Stream the result as a JSON array, chunked to at least [`MIN_CHUNK_BYTES`]
/// per write so a large date range doesn't force one multi-megabyte buffer
/// allocation in `axum`'s response body.
fn stream_rows(result: QueryResult) -> Response {
    let mut rows = Vec::with_capacity(result.dates.len());
    for (day, date) in result.dates.iter().enumerate() {
        let mut values = std::collections::BTreeMap::new();
        for (name, column) in result.variables.iter().zip(result.values.iter()) {
            let v = column.get(day).copied().filter(|v| !v.is_nan());
            values.insert(name.as_str(), v);
        }
        rows.push(
            serde_json::to_string(&Row {
                date: date.format("%Y-%m-%d").to_string(),
                values,
            })
            .expect("row serializes to JSON"),
        );
    }

    let chunks = chunk_rows(&rows);
    let body = axum::body::Body::from_stream(stream::iter(
        chunks.into_iter().map(Ok::<_, std::io::Error>),
    ));

    Response::builder()
        .status(StatusCode::OK)
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .body(body)
        .expect("static headers and streaming body are always valid")
}

/// Group serialized rows into `[`-opened, `]`-closed JSON array chunks, each
/// at least [`MIN_CHUNK_BYTES`] except possibly the last.
fn chunk_rows(rows: &[String]) -> Vec<Vec<u8>> {
    let mut chunks = Vec::new();
    let mut current = String::from("[");
    let mut wrote_any = false;

    for (i, row) in rows.iter().enumerate() {
        if i > 0 {
            current.push(',');
        }
        current.push_str(row);
        wrote_any = true;

        if current.len() >= MIN_CHUNK_BYTES {
            chunks.push(current.into_bytes());
            current = String::new();
        }
    }

    if !wrote_any {
        return vec![b"[]".to_vec()];
    }

    let is_first_chunk = chunks.is_empty();
    if !is_first_chunk && current.is_empty() {
        let last = chunks.last_mut().expect("checked non-empty above");
        last.push(b']');
    } else {
        current.push(']');
        chunks.push(current.into_bytes());
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_required_param_is_rejected() {
        let params = PointQueryParams {
            lat: None,
            lon: Some(30.0),
            begin: Some("2020-01-01".to_string()),
            end: Some("2020-01-02".to_string()),
            var: vec!["TMP".to_string()],
        };
        assert!(parse_point_query(params).is_err());
    }

    #[test]
    fn empty_var_list_is_rejected() {
        let params = PointQueryParams {
            lat: Some(10.0),
            lon: Some(20.0),
            begin: Some("2020-01-01".to_string()),
            end: Some("2020-01-02".to_string()),
            var: vec![],
        };
        assert!(parse_point_query(params).is_err());
    }

    #[test]
    fn valid_params_parse() {
        let params = PointQueryParams {
            lat: Some(10.0),
            lon: Some(20.0),
            begin: Some("2020-01-01".to_string()),
            end: Some("2020-01-02".to_string()),
            var: vec!["TMP".to_string()],
        };
        let parsed = parse_point_query(params).unwrap();
        assert_eq!(parsed.variables, vec!["TMP".to_string()]);
    }

    #[test]
    fn small_result_yields_single_closed_chunk() {
        let chunks = chunk_rows(&["{\"a\":1}".to_string()]);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], b"[{\"a\":1}]".to_vec());
    }

    #[test]
    fn empty_result_yields_empty_array() {
        let chunks = chunk_rows(&[]);
        assert_eq!(chunks, vec![b"[]".to_vec()]);
    }
}
