/// Training request form fields
///
/// Turns a model node's configuration into the text fields of the multipart
/// `/api/perform` request. Which hyperparameters are sent depends on the
/// algorithm slug; unset values fall back to the defaults below.

use crate::workflow::types::{Hyperparameters, ModelConfig};
use serde_json::{Map, Value};

/// A single multipart text field
pub type FormField = (&'static str, String);

/// Build every text field for a training request
///
/// `upstream` is the metadata of the payload feeding the model node; settings
/// left there by a processing step are forwarded so the server can apply them.
pub fn training_fields(config: &ModelConfig, upstream: &Map<String, Value>) -> Vec<FormField> {
    let mut fields: Vec<FormField> = vec![("model", config.algorithm.clone())];

    if let Some(target) = config.target_column.as_deref().filter(|t| !t.is_empty()) {
        fields.push(("target_column", target.to_string()));
    }
    fields.push(("test_size", config.test_size.to_string()));
    fields.push(("random_state", config.random_state.to_string()));
    fields.push(("enable_data_cleaning", config.enable_data_cleaning.to_string()));

    if let Some(processing) = upstream.get("processing").and_then(Value::as_object) {
        for key in ["scaling_method", "missing_values"] {
            if let Some(value) = processing.get(key).and_then(Value::as_str) {
                fields.push((key, value.to_string()));
            }
        }
    }

    fields.extend(algorithm_fields(&config.algorithm, &config.hyperparameters));
    fields
}

/// Hyperparameter fields for one algorithm
pub fn algorithm_fields(slug: &str, hp: &Hyperparameters) -> Vec<FormField> {
    match slug {
        "decision-tree" => tree_fields(hp),
        "random-forest" => {
            let mut fields = vec![("n_estimators", num(hp.n_estimators, 200))];
            fields.extend(tree_fields(hp));
            fields.push(("class_weight", text(&hp.class_weight, "")));
            fields
        }
        "k-nearest-neighbors" | "KNN" => vec![
            ("n_neighbors", num(hp.n_neighbors, 5)),
            ("weights", text(&hp.weights, "uniform")),
            ("algorithm", text(&hp.neighbor_algorithm, "auto")),
            ("metric", text(&hp.metric, "minkowski")),
        ],
        "neural-network" => vec![
            ("hidden_layer_sizes", text(&hp.hidden_layer_sizes, "(100,)")),
            ("activation", text(&hp.activation, "relu")),
            ("solver", text(&hp.solver, "adam")),
            ("max_iter", num(hp.max_iter, 500)),
        ],
        "support-vector-machine" => vec![
            ("C", float(hp.c, 1.0)),
            ("kernel", text(&hp.kernel, "rbf")),
        ],
        "ridge-regression" | "lasso-regression" => vec![("alpha", float(hp.alpha, 1.0))],
        "elastic-net" => vec![
            ("alpha", float(hp.alpha, 1.0)),
            ("l1_ratio", float(hp.l1_ratio, 0.5)),
        ],
        "gradient-boosting" | "xgboost" | "lightgbm" | "adaboost" => vec![
            ("n_estimators", num(hp.n_estimators, 100)),
            ("learning_rate", float(hp.learning_rate, 0.1)),
        ],
        "image-classification" => vec![
            ("model_architecture", text(&hp.model_architecture, "mobilenet_v2")),
            ("img_size", num(hp.img_size, 224)),
            ("batch_size", num(hp.batch_size, 32)),
            ("epochs", num(hp.epochs, 10)),
            ("learning_rate", float(hp.learning_rate, 0.001)),
        ],
        _ => Vec::new(),
    }
}

fn tree_fields(hp: &Hyperparameters) -> Vec<FormField> {
    vec![
        ("criterion", text(&hp.criterion, "gini")),
        // empty means "no limit" on the server
        ("max_depth", hp.max_depth.map(|d| d.to_string()).unwrap_or_default()),
        ("min_samples_split", num(hp.min_samples_split, 2)),
        ("min_samples_leaf", num(hp.min_samples_leaf, 1)),
    ]
}

fn text(value: &Option<String>, default: &str) -> String {
    value.clone().unwrap_or_else(|| default.to_string())
}

fn num(value: Option<u32>, default: u32) -> String {
    value.unwrap_or(default).to_string()
}

fn float(value: Option<f64>, default: f64) -> String {
    value.unwrap_or(default).to_string()
}
