/// Core workflow type definitions
///
/// A workflow is a transient graph of typed nodes (data source, processor, model,
/// output) connected by typed edges. Node configuration is a tagged union so the
/// executor dispatch can match exhaustively on it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{fmt, path::PathBuf, sync::Arc};

/// Tag describing what kind of payload flows across an edge
///
/// `Any` is compatible with everything in both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Csv,
    Json,
    Text,
    Dataframe,
    Model,
    Result,
    ProcessedData,
    Any,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Csv => "csv",
            DataType::Json => "json",
            DataType::Text => "text",
            DataType::Dataframe => "dataframe",
            DataType::Model => "model",
            DataType::Result => "result",
            DataType::ProcessedData => "processed_data",
            DataType::Any => "any",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A complete workflow graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    /// Unique workflow identifier
    pub id: String,
    /// Human-readable workflow name (e.g. "Untitled Workflow")
    pub name: String,
    /// Nodes in insertion order; this order seeds the scheduler's root scan
    pub nodes: Vec<Node>,
    /// Edges in insertion order; the first incoming edge of a node is its input
    pub edges: Vec<Edge>,
}

impl Workflow {
    /// Create an empty workflow
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn node(&self, node_id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == node_id)
    }

    pub fn node_mut(&mut self, node_id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == node_id)
    }

    /// Edges whose target is `node_id`, in edge-list order
    pub fn incoming_edges<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.target == node_id)
    }
}

/// Canvas coordinates; presentation only
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A single unit of work in the workflow graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique node identifier within the workflow (e.g. "data-1", "node-<uuid>")
    pub id: String,
    /// Display label, shown in the execution log
    pub label: String,
    #[serde(default)]
    pub position: Position,
    /// Type-specific configuration; its `kind` tag is the node type
    pub config: NodeConfig,
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        self.config.kind()
    }

    /// Declared input types (always empty for data sources)
    pub fn input_types(&self) -> &[DataType] {
        match &self.config {
            NodeConfig::Data(_) => &[],
            NodeConfig::Processing(c) => &c.input_types,
            NodeConfig::Model(c) => &c.input_types,
            NodeConfig::Output(c) => &c.input_types,
        }
    }

    /// Declared output types (always empty for output sinks)
    pub fn output_types(&self) -> &[DataType] {
        match &self.config {
            NodeConfig::Data(c) => &c.output_types,
            NodeConfig::Processing(c) => &c.output_types,
            NodeConfig::Model(c) => &c.output_types,
            NodeConfig::Output(_) => &[],
        }
    }
}

/// Node type discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Data,
    Processing,
    Model,
    Output,
}

/// Type-specific node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeConfig {
    Data(DataConfig),
    Processing(ProcessingConfig),
    Model(ModelConfig),
    Output(OutputConfig),
}

impl NodeConfig {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeConfig::Data(_) => NodeKind::Data,
            NodeConfig::Processing(_) => NodeKind::Processing,
            NodeConfig::Model(_) => NodeKind::Model,
            NodeConfig::Output(_) => NodeKind::Output,
        }
    }
}

/// Data source configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default)]
    pub output_types: Vec<DataType>,
    /// Dataset on local disk; read when the node executes
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// Processing step configuration
///
/// Processing is applied server-side during training; these settings travel
/// downstream as payload metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    #[serde(default)]
    pub input_types: Vec<DataType>,
    #[serde(default)]
    pub output_types: Vec<DataType>,
    #[serde(default = "default_true")]
    pub enable_cleaning: bool,
    #[serde(default = "default_scaling_method")]
    pub scaling_method: String,
    #[serde(default = "default_missing_values")]
    pub missing_values: String,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            input_types: Vec::new(),
            output_types: Vec::new(),
            enable_cleaning: true,
            scaling_method: default_scaling_method(),
            missing_values: default_missing_values(),
        }
    }
}

/// Model training configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub input_types: Vec<DataType>,
    #[serde(default)]
    pub output_types: Vec<DataType>,
    /// Catalog slug sent as the `model` form field (e.g. "random-forest")
    pub algorithm: String,
    #[serde(default)]
    pub target_column: Option<String>,
    #[serde(default = "default_test_size")]
    pub test_size: f64,
    #[serde(default = "default_random_state")]
    pub random_state: u64,
    #[serde(default = "default_true")]
    pub enable_data_cleaning: bool,
    #[serde(default)]
    pub hyperparameters: Hyperparameters,
}

impl ModelConfig {
    pub fn new(algorithm: impl Into<String>) -> Self {
        Self {
            input_types: Vec::new(),
            output_types: Vec::new(),
            algorithm: algorithm.into(),
            target_column: None,
            test_size: default_test_size(),
            random_state: default_random_state(),
            enable_data_cleaning: true,
            hyperparameters: Hyperparameters::default(),
        }
    }
}

/// Algorithm hyperparameters
///
/// Only the fields relevant to the selected algorithm are sent; unset fields
/// fall back to per-algorithm defaults in `training::params`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Hyperparameters {
    // tree based
    pub criterion: Option<String>,
    pub max_depth: Option<u32>,
    pub min_samples_split: Option<u32>,
    pub min_samples_leaf: Option<u32>,
    pub n_estimators: Option<u32>,
    pub class_weight: Option<String>,
    // nearest neighbours
    pub n_neighbors: Option<u32>,
    pub weights: Option<String>,
    pub neighbor_algorithm: Option<String>,
    pub metric: Option<String>,
    // neural network
    pub hidden_layer_sizes: Option<String>,
    pub activation: Option<String>,
    pub solver: Option<String>,
    pub max_iter: Option<u32>,
    // svm
    #[serde(rename = "C")]
    pub c: Option<f64>,
    pub kernel: Option<String>,
    // regularised regression
    pub alpha: Option<f64>,
    pub l1_ratio: Option<f64>,
    // boosting and image training
    pub learning_rate: Option<f64>,
    pub model_architecture: Option<String>,
    pub img_size: Option<u32>,
    pub batch_size: Option<u32>,
    pub epochs: Option<u32>,
}

/// Output sink configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub input_types: Vec<DataType>,
}

/// Directed, typed connection between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    /// Resolved once when the edge is created; never re-validated
    pub data_type: DataType,
}

/// Payload handed from one node to the next during a run
#[derive(Debug, Clone)]
pub struct Payload {
    pub data_type: DataType,
    pub data: PayloadData,
    pub metadata: Map<String, Value>,
}

/// Body of a payload: either raw dataset bytes or a JSON document
#[derive(Debug, Clone)]
pub enum PayloadData {
    Dataset(Dataset),
    Json(Value),
}

/// Dataset file loaded by a data source node
#[derive(Debug, Clone)]
pub struct Dataset {
    pub file_name: String,
    pub bytes: Arc<Vec<u8>>,
}

fn default_true() -> bool {
    true
}

fn default_scaling_method() -> String {
    "Standard".to_string()
}

fn default_missing_values() -> String {
    "Impute".to_string()
}

fn default_test_size() -> f64 {
    0.3
}

fn default_random_state() -> u64 {
    101
}
