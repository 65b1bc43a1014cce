use axum::{Json, extract::State};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

use crate::error::GatewayError;
use crate::server::AppState;

/// One trained model run found under the artifacts directory.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    /// `{family}/{run_id}`
    pub id: String,
    pub family: String,
    pub run_id: String,
    pub name: String,
    pub accuracy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// `GET /api/models`
pub async fn list_models(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<ModelInfo>>, GatewayError> {
    let models = scan_artifacts(&app_state.config.models.artifacts_dir).await?;
    Ok(Json(models))
}

/// Walks `<root>/<family>/<run_id>/` and builds one descriptor per run,
/// newest run first.
pub async fn scan_artifacts(root: &Path) -> Result<Vec<ModelInfo>, GatewayError> {
    let mut result = Vec::new();
    if !tokio::fs::try_exists(root).await? {
        return Ok(result);
    }

    for family in list_subdirs(root).await? {
        let family_dir = root.join(&family);
        let runs = match list_subdirs(&family_dir).await {
            Ok(runs) => runs,
            Err(e) => {
                tracing::debug!("Skipping {}: {}", family_dir.display(), e);
                continue;
            }
        };

        for run_id in runs {
            let run_dir = family_dir.join(&run_id);
            let meta = read_json_lenient(&run_dir.join("metadata.json")).await;
            let metrics = read_json_lenient(&run_dir.join("test_metrics.json")).await;
            result.push(describe_run(&family, &run_id, meta.as_ref(), metrics.as_ref()));
        }
    }

    result.sort_by(|a, b| {
        b.run_id
            .cmp(&a.run_id)
            .then_with(|| a.family.cmp(&b.family))
    });
    Ok(result)
}

async fn list_subdirs(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut names = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        // follows symlinks, like a plain stat
        let is_dir = tokio::fs::metadata(entry.path())
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if is_dir {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    Ok(names)
}

async fn read_json_lenient(path: &Path) -> Option<Value> {
    let raw = tokio::fs::read(path).await.ok()?;
    serde_json::from_slice(&raw).ok()
}

fn str_field<'a>(v: Option<&'a Value>, key: &str) -> Option<&'a str> {
    v.and_then(|v| v.get(key)).and_then(Value::as_str)
}

fn describe_run(
    family: &str,
    run_id: &str,
    meta: Option<&Value>,
    metrics: Option<&Value>,
) -> ModelInfo {
    let accuracy = metrics
        .and_then(|m| m.get("accuracy"))
        .and_then(Value::as_f64);
    let created_at = str_field(meta, "created_at").map(str::to_string);
    let notes = str_field(meta, "notes").map(str::to_string);

    ModelInfo {
        id: format!("{}/{}", family, run_id),
        family: family.to_string(),
        run_id: run_id.to_string(),
        name: display_name(family, notes.as_deref(), accuracy, created_at.as_deref()),
        accuracy,
        created_at,
        notes,
    }
}

/// e.g. `RF — acc 91.3% • 2025-10-06T00:57:02`
fn display_name(
    family: &str,
    notes: Option<&str>,
    accuracy: Option<f64>,
    created_at: Option<&str>,
) -> String {
    let base = notes
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| family.to_uppercase());
    let mut name = match accuracy {
        Some(acc) => format!("{} — acc {}%", base, percent_one_decimal(acc * 100.0)),
        None => base,
    };
    if let Some(created) = created_at.filter(|c| !c.is_empty()) {
        name.push_str(" • ");
        name.push_str(created);
    }
    name
}

/// One decimal place with exact ties rounded up (`12.25` gives `12.3`),
/// where `{:.1}` would round them to even.
fn percent_one_decimal(x: f64) -> String {
    // only multiples of 0.25 with an odd quarter count are exact ties
    let quarters = x * 4.0;
    if quarters.fract() == 0.0 && quarters % 2.0 != 0.0 {
        return format!("{:.1}", (x * 10.0 + 0.5).floor() / 10.0);
    }
    format!("{:.1}", x)
}
