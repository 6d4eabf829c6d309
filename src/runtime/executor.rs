/// Node execution handlers for the four node kinds
///
/// This module contains the actual execution logic for each node kind:
/// - Data: loads the configured dataset file from disk
/// - Processing: tags the dataset with processing settings (applied server-side)
/// - Model: trains a model through the remote training API
/// - Output: projects the training result into a flat metrics list
///
/// Dispatch is an exhaustive match on `NodeConfig`. Executors never recover
/// from a failure; the error goes back to the orchestrator untouched.

use crate::{
    catalog::ModelCatalog,
    error::NodeError,
    runtime::monitor::{NodeStatus, RunMonitor},
    training::{params::training_fields, TrainingClient},
    workflow::types::{
        DataConfig, DataType, Dataset, ModelConfig, Node, NodeConfig, Payload, PayloadData,
        ProcessingConfig,
    },
};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// One display metric on an output node (e.g. "Accuracy" → "93.33%")
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub name: String,
    pub value: String,
}

impl Metric {
    fn new(name: &str, value: String) -> Self {
        Self {
            name: name.to_string(),
            value,
        }
    }
}

/// Display state a node picked up while executing
///
/// Merged into the monitor's node state; unset fields leave it unchanged.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NodeAnnotations {
    /// New display label (model nodes take the catalog name)
    pub label: Option<String>,
    pub accuracy: Option<String>,
    pub training_time: Option<String>,
    pub metrics: Vec<Metric>,
    pub result: Option<Value>,
}

/// Result of executing a single node
///
/// The payload flows to downstream nodes; the annotations go to the monitor.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub payload: Payload,
    pub annotations: NodeAnnotations,
}

impl ExecutionResult {
    fn plain(payload: Payload) -> Self {
        Self {
            payload,
            annotations: NodeAnnotations::default(),
        }
    }
}

/// Node executor that handles execution of the different node kinds
///
/// Holds the training API client and the model catalog used for display names.
#[derive(Debug, Clone)]
pub struct NodeExecutor {
    client: TrainingClient,
    catalog: Arc<ModelCatalog>,
}

impl NodeExecutor {
    pub fn new(client: TrainingClient, catalog: Arc<ModelCatalog>) -> Self {
        Self { client, catalog }
    }

    pub fn client(&self) -> &TrainingClient {
        &self.client
    }

    /// Execute a single node with the payload of its upstream node, if any
    ///
    /// Moves the node through `executing` and then `success` or `error` on the
    /// monitor, and returns the payload for downstream nodes.
    pub async fn execute_node(
        &self,
        node: &Node,
        input: Option<&Payload>,
        monitor: &RunMonitor,
    ) -> Result<ExecutionResult, NodeError> {
        tracing::info!("🚀 Starting node execution: {} (kind: {:?})", node.id, node.kind());
        let start_time = std::time::Instant::now();
        monitor.set_node_status(&node.id, NodeStatus::Executing);

        let result = match &node.config {
            NodeConfig::Data(config) => self.execute_data_node(config).await,
            NodeConfig::Processing(config) => self.execute_processing_node(config, input),
            NodeConfig::Model(config) => self.execute_model_node(config, input).await,
            NodeConfig::Output(_) => self.execute_output_node(input),
        };

        let duration = start_time.elapsed();
        match result {
            Ok(result) => {
                tracing::info!("✅ Node '{}' completed in {:?}", node.id, duration);
                monitor.complete_node(&node.id, result.annotations.clone());
                Ok(result)
            }
            Err(e) => {
                tracing::error!("❌ Node '{}' failed after {:?}: {}", node.id, duration, e);
                monitor.set_node_status(&node.id, NodeStatus::Error);
                Err(e)
            }
        }
    }

    /// Load the dataset file named by the node's configuration
    async fn execute_data_node(&self, config: &DataConfig) -> Result<ExecutionResult, NodeError> {
        let path = config
            .file
            .as_ref()
            .ok_or_else(|| NodeError::Configuration("No file uploaded".to_string()))?;

        let bytes = tokio::fs::read(path).await.map_err(|e| {
            NodeError::Configuration(format!("Cannot read dataset file {}: {}", path.display(), e))
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "dataset.csv".to_string());

        tracing::debug!("📄 Loaded dataset '{}' ({} bytes)", file_name, bytes.len());

        let mut metadata = Map::new();
        metadata.insert("size".to_string(), json!(bytes.len()));
        metadata.insert("file_name".to_string(), json!(file_name));

        Ok(ExecutionResult::plain(Payload {
            data_type: DataType::Csv,
            data: PayloadData::Dataset(Dataset {
                file_name,
                bytes: Arc::new(bytes),
            }),
            metadata,
        }))
    }

    /// Pass the dataset through, recording the processing settings in its metadata
    fn execute_processing_node(
        &self,
        config: &ProcessingConfig,
        input: Option<&Payload>,
    ) -> Result<ExecutionResult, NodeError> {
        let input = input.ok_or_else(|| NodeError::Input("No input data provided".to_string()))?;

        let mut metadata = input.metadata.clone();
        metadata.insert(
            "processing".to_string(),
            json!({
                "enable_cleaning": config.enable_cleaning,
                "scaling_method": config.scaling_method,
                "missing_values": config.missing_values,
            }),
        );

        Ok(ExecutionResult::plain(Payload {
            data_type: DataType::ProcessedData,
            data: input.data.clone(),
            metadata,
        }))
    }

    /// Train a model on the upstream dataset through the training API
    async fn execute_model_node(
        &self,
        config: &ModelConfig,
        input: Option<&Payload>,
    ) -> Result<ExecutionResult, NodeError> {
        let input = input.ok_or_else(|| NodeError::Input("No input data provided".to_string()))?;
        let PayloadData::Dataset(dataset) = &input.data else {
            return Err(NodeError::Input(format!(
                "Expected a dataset to train on, got {} data",
                input.data_type
            )));
        };

        let fields = training_fields(config, &input.metadata);
        tracing::info!("🧠 Training '{}' on '{}'", config.algorithm, dataset.file_name);
        let response = self.client.perform(fields, dataset).await?;

        let accuracy = number(&response, "accuracy")
            .or_else(|| number(&response, "r2"))
            .unwrap_or(0.0);
        let training_time = number(&response, "trainingTime");
        let model_name = self.catalog.get_or_default(&config.algorithm).name.clone();

        let mut metadata = Map::new();
        metadata.insert("accuracy".to_string(), json!(accuracy));
        metadata.insert("trainingTime".to_string(), json!(training_time));
        metadata.insert("model".to_string(), json!(model_name));

        let annotations = NodeAnnotations {
            label: Some(model_name),
            accuracy: Some(format!("{:.2}%", accuracy * 100.0)),
            training_time: Some(format!("{:.1} sec", training_time.unwrap_or(0.0))),
            metrics: Vec::new(),
            result: Some(response.clone()),
        };

        Ok(ExecutionResult {
            payload: Payload {
                data_type: DataType::Result,
                data: PayloadData::Json(response),
                metadata,
            },
            annotations,
        })
    }

    /// Extract the known metrics from the upstream training result
    fn execute_output_node(&self, input: Option<&Payload>) -> Result<ExecutionResult, NodeError> {
        let input = input.ok_or_else(|| NodeError::Input("No model results provided".to_string()))?;

        let (metrics, result) = match &input.data {
            PayloadData::Json(result) => (extract_metrics(result), Some(result.clone())),
            PayloadData::Dataset(_) => {
                tracing::debug!("📊 Output node received raw data; no metrics to show");
                (Vec::new(), None)
            }
        };

        Ok(ExecutionResult {
            payload: input.clone(),
            annotations: NodeAnnotations {
                metrics,
                result,
                ..NodeAnnotations::default()
            },
        })
    }
}

/// Best-effort projection of a training result into display metrics
pub fn extract_metrics(result: &Value) -> Vec<Metric> {
    let mut metrics = Vec::new();
    if let Some(accuracy) = number(result, "accuracy") {
        metrics.push(Metric::new("Accuracy", format!("{:.2}%", accuracy * 100.0)));
    }
    for (key, name) in [
        ("r2", "R² Score"),
        ("precision", "Precision"),
        ("recall", "Recall"),
        ("f1_score", "F1 Score"),
    ] {
        if let Some(value) = number(result, key) {
            metrics.push(Metric::new(name, format!("{:.4}", value)));
        }
    }
    metrics
}

fn number(value: &Value, key: &str) -> Option<f64> {
    value.get(key).and_then(Value::as_f64)
}
