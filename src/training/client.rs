/// HTTP client for the remote training API
///
/// Two calls: `POST /api/perform` trains a model from a multipart upload and
/// answers with a JSON result, `POST /api/download-model` streams back the
/// serialized model. Failures carry the server's `error` field when it sent one.

use crate::{
    error::ApiError,
    training::params::FormField,
    workflow::types::Dataset,
};
use reqwest::{multipart, Response};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

/// Thin wrapper around a pooled `reqwest::Client`
#[derive(Debug, Clone)]
pub struct TrainingClient {
    http: reqwest::Client,
    base_url: String,
}

/// A trained model fetched from the server
#[derive(Debug, Clone)]
pub struct DownloadedModel {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl DownloadedModel {
    /// Write the model into `dir` under its own filename and return the path
    pub async fn save_to(&self, dir: impl AsRef<Path>) -> anyhow::Result<PathBuf> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create download directory {}: {}", dir.display(), e))?;

        // Never let the server pick a path outside `dir`
        let name = Path::new(&self.filename)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "model.pkl".to_string());
        let path = dir.join(name);

        tokio::fs::write(&path, &self.bytes)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to write model to {}: {}", path.display(), e))?;
        tracing::info!("💾 Saved model to {}", path.display());
        Ok(path)
    }
}

impl TrainingClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Upload a dataset and train a model; returns the server's JSON result
    pub async fn perform(&self, fields: Vec<FormField>, dataset: &Dataset) -> Result<Value, ApiError> {
        let mut form = multipart::Form::new();
        for (key, value) in fields {
            form = form.text(key, value);
        }
        let file = multipart::Part::bytes(dataset.bytes.as_ref().clone()).file_name(dataset.file_name.clone());
        form = form.part("file", file);

        let url = format!("{}/api/perform", self.base_url);
        tracing::debug!("📤 POST {} ({} bytes)", url, dataset.bytes.len());

        let response = self.http.post(&url).multipart(form).send().await?;
        let response = ensure_success(response, "Server error").await?;

        response
            .json::<Value>()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }

    /// Fetch the serialized model with the given id
    pub async fn download_model(&self, model_id: &str) -> Result<DownloadedModel, ApiError> {
        let url = format!("{}/api/download-model", self.base_url);
        tracing::debug!("📥 POST {} (model {})", url, model_id);

        let response = self
            .http
            .post(&url)
            .json(&json!({ "model_id": model_id }))
            .send()
            .await?;
        let response = ensure_success(response, "Download failed").await?;

        let filename = response
            .headers()
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(filename_from_disposition)
            .unwrap_or_else(|| format!("model_{}.pkl", model_id));

        let bytes = response.bytes().await?.to_vec();
        Ok(DownloadedModel { filename, bytes })
    }
}

/// Map a non-2xx response to `ApiError::Server`, preferring the body's `error` field
async fn ensure_success(response: Response, fallback: &str) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .json::<Value>()
        .await
        .ok()
        .and_then(|body| body.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| fallback.to_string());

    tracing::warn!("❌ Training API answered {}: {}", status, message);
    Err(ApiError::Server {
        status: status.as_u16(),
        message,
    })
}

/// Pull `filename=` out of a `Content-Disposition` header, quotes stripped
fn filename_from_disposition(header: &str) -> Option<String> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|name| name.trim_matches('"').to_string())
        .filter(|name| !name.is_empty())
}
