/// Node library
///
/// The palette a user picks new nodes from. Each template fixes the node kind,
/// its default label and the data types it declares.

use crate::workflow::types::{
    DataConfig, DataType, ModelConfig, NodeConfig, NodeKind, OutputConfig, ProcessingConfig,
};
use serde::Serialize;

/// Algorithm new model nodes start with
pub const DEFAULT_ALGORITHM: &str = "random-forest";

/// A node the user can add to a workflow
#[derive(Debug, Clone, Serialize)]
pub struct NodeTemplate {
    /// Stable key used by the API (e.g. "csv-dataset")
    pub key: &'static str,
    /// Library category ("Data Sources", "Processing", "Output")
    pub category: &'static str,
    pub label: &'static str,
    pub kind: NodeKind,
    pub input_types: &'static [DataType],
    pub output_types: &'static [DataType],
}

impl NodeTemplate {
    /// Build a fresh configuration for a node created from this template
    pub fn config(&self) -> NodeConfig {
        let inputs = self.input_types.to_vec();
        let outputs = self.output_types.to_vec();
        match self.kind {
            NodeKind::Data => NodeConfig::Data(DataConfig {
                output_types: outputs,
                file: None,
            }),
            NodeKind::Processing => NodeConfig::Processing(ProcessingConfig {
                input_types: inputs,
                output_types: outputs,
                ..ProcessingConfig::default()
            }),
            NodeKind::Model => NodeConfig::Model(ModelConfig {
                input_types: inputs,
                output_types: outputs,
                ..ModelConfig::new(DEFAULT_ALGORITHM)
            }),
            NodeKind::Output => NodeConfig::Output(OutputConfig {
                input_types: inputs,
            }),
        }
    }
}

use DataType::*;

static TEMPLATES: &[NodeTemplate] = &[
    NodeTemplate {
        key: "csv-dataset",
        category: "Data Sources",
        label: "CSV Dataset",
        kind: NodeKind::Data,
        input_types: &[],
        output_types: &[Csv, Dataframe],
    },
    NodeTemplate {
        key: "json-data",
        category: "Data Sources",
        label: "JSON Data",
        kind: NodeKind::Data,
        input_types: &[],
        output_types: &[Json, Dataframe],
    },
    NodeTemplate {
        key: "text-data",
        category: "Data Sources",
        label: "Text Data",
        kind: NodeKind::Data,
        input_types: &[],
        output_types: &[Text],
    },
    NodeTemplate {
        key: "data-preprocessor",
        category: "Processing",
        label: "Data Preprocessor",
        kind: NodeKind::Processing,
        input_types: &[Csv, Dataframe, ProcessedData],
        output_types: &[ProcessedData, Dataframe],
    },
    NodeTemplate {
        key: "feature-engineering",
        category: "Processing",
        label: "Feature Engineering",
        kind: NodeKind::Processing,
        input_types: &[Dataframe, ProcessedData],
        output_types: &[Dataframe],
    },
    NodeTemplate {
        key: "ml-model",
        category: "Processing",
        label: "ML Model",
        kind: NodeKind::Model,
        input_types: &[ProcessedData, Dataframe],
        output_types: &[Model, Result],
    },
    NodeTemplate {
        key: "model-results",
        category: "Output",
        label: "Model Results",
        kind: NodeKind::Output,
        input_types: &[Result, Model, Json],
        output_types: &[],
    },
    NodeTemplate {
        key: "export-results",
        category: "Output",
        label: "Export Results",
        kind: NodeKind::Output,
        input_types: &[Result, Json, Csv],
        output_types: &[],
    },
];

/// All templates in palette order
pub fn templates() -> &'static [NodeTemplate] {
    TEMPLATES
}

/// Look up a template by its key
pub fn template(key: &str) -> Option<&'static NodeTemplate> {
    TEMPLATES.iter().find(|t| t.key == key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_template_defaults_to_random_forest() {
        let tpl = template("ml-model").unwrap();
        match tpl.config() {
            NodeConfig::Model(cfg) => {
                assert_eq!(cfg.algorithm, DEFAULT_ALGORITHM);
                assert_eq!(cfg.input_types, vec![ProcessedData, Dataframe]);
                assert_eq!(cfg.output_types, vec![Model, Result]);
            }
            other => panic!("unexpected config: {:?}", other),
        }
    }

    #[test]
    fn template_keys_are_unique() {
        let mut keys: Vec<_> = templates().iter().map(|t| t.key).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), templates().len());
        assert!(template("nope").is_none());
    }
}
