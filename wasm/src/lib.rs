//! WebAssembly module for the Climate Policy Maker
//!
//! Provides client-side computation for:
//! - Payload normalization
//! - Policy rule evaluation
//! - Report assembly and Markdown rendering
//! - Forecast chart series

use serde::Deserialize;
use wasm_bindgen::prelude::*;

use shared::{
    assemble, evaluate, normalize, normalize_forecast, render_markdown, ChartRef,
    RecommendationSet, RuleCatalog, WeatherSnapshot,
};

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    web_sys::console::debug_1(&JsValue::from_str("climate-policy-wasm ready"));
}

/// Linked chart passed from JavaScript
#[derive(Debug, Deserialize)]
struct LinkedChart {
    title: String,
    path: String,
}

fn js_error(message: String) -> JsValue {
    js_sys::Error::new(&message).into()
}

/// Normalize a provider payload into a snapshot (JSON in, JSON out)
#[wasm_bindgen]
pub fn normalize_payload(payload_json: &str) -> Result<String, JsValue> {
    normalize_json(payload_json).map_err(js_error)
}

/// Evaluate a snapshot against the built-in rules plus an optional overlay
#[wasm_bindgen]
pub fn evaluate_policies(snapshot_json: &str, overlay_toml: Option<String>) -> Result<String, JsValue> {
    evaluate_json(snapshot_json, overlay_toml.as_deref()).map_err(js_error)
}

/// Render a recommendation set as a Markdown report. Charts are a JSON array
/// of `{ "title", "path" }` links.
#[wasm_bindgen]
pub fn render_policy_report(set_json: &str, charts_json: Option<String>) -> Result<String, JsValue> {
    render_json(set_json, charts_json.as_deref()).map_err(js_error)
}

/// Prepared forecast chart series for the client-side chart renderer
#[wasm_bindgen]
pub fn forecast_chart_series(payload_json: &str) -> Result<String, JsValue> {
    forecast_json(payload_json).map_err(js_error)
}

/// Version label of the embedded rule catalog
#[wasm_bindgen]
pub fn builtin_catalog_version() -> String {
    RuleCatalog::builtin()
        .ok()
        .and_then(|c| c.version().map(str::to_string))
        .unwrap_or_default()
}

fn normalize_json(payload_json: &str) -> Result<String, String> {
    let payload: serde_json::Value =
        serde_json::from_str(payload_json).map_err(|e| format!("Invalid payload JSON: {}", e))?;
    let snapshot = normalize(&payload).map_err(|e| e.to_string())?;
    serde_json::to_string(&snapshot).map_err(|e| e.to_string())
}

fn evaluate_json(snapshot_json: &str, overlay_toml: Option<&str>) -> Result<String, String> {
    let snapshot: WeatherSnapshot =
        serde_json::from_str(snapshot_json).map_err(|e| format!("Invalid snapshot JSON: {}", e))?;

    let mut catalog = RuleCatalog::builtin().map_err(|e| e.to_string())?;
    if let Some(source) = overlay_toml.filter(|s| !s.trim().is_empty()) {
        let overlay = RuleCatalog::from_toml_str(source).map_err(|e| e.to_string())?;
        catalog = catalog.append(overlay).map_err(|e| e.to_string())?;
    }

    let set = evaluate(&snapshot, &catalog).map_err(|e| e.to_string())?;
    serde_json::to_string(&set).map_err(|e| e.to_string())
}

fn render_json(set_json: &str, charts_json: Option<&str>) -> Result<String, String> {
    let set: RecommendationSet =
        serde_json::from_str(set_json).map_err(|e| format!("Invalid recommendation JSON: {}", e))?;
    let charts: Vec<ChartRef> = match charts_json {
        Some(json) => serde_json::from_str::<Vec<LinkedChart>>(json)
            .map_err(|e| format!("Invalid charts JSON: {}", e))?
            .into_iter()
            .map(|c| ChartRef::from_path(c.title, c.path))
            .collect(),
        None => Vec::new(),
    };
    Ok(render_markdown(&assemble(&set, &charts)))
}

fn forecast_json(payload_json: &str) -> Result<String, String> {
    let payload: serde_json::Value =
        serde_json::from_str(payload_json).map_err(|e| format!("Invalid payload JSON: {}", e))?;
    serde_json::to_string(&normalize_forecast(&payload).chart_series()).map_err(|e| e.to_string())
}
