/// Workflow builder and run REST API endpoints
///
/// Mirrors what a user does on the canvas: pick nodes from the library, wire
/// and configure them, run the workflow, watch the log, download results.
/// Runs execute on a spawned task against a snapshot of the graph, so edits
/// made while a run is in flight only affect the next run.

use crate::{
    catalog::{ModelCatalog, ModelSpec},
    runtime::{engine::ExecutionEngine, monitor::RunSnapshot},
    workflow::{
        library::{self, NodeTemplate},
        registry::{WorkflowRegistry, WorkflowSession},
        types::{Node, NodeConfig, Workflow},
    },
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::{path::PathBuf, sync::Arc};

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    /// Live workflow sessions
    pub registry: Arc<WorkflowRegistry>,
    /// Orchestrator shared by every run
    pub engine: ExecutionEngine,
    /// Model catalog served to the model picker
    pub catalog: Arc<ModelCatalog>,
    /// Where downloaded models are written
    pub download_dir: PathBuf,
}

/// Error response: status plus `{ "error": message }`
type HandlerError = (StatusCode, Json<Value>);

fn reject(status: StatusCode, message: impl Into<String>) -> HandlerError {
    (status, Json(json!({ "error": message.into() })))
}

/// Request body for workflow creation
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateWorkflowRequest {
    pub name: Option<String>,
    /// Start empty instead of with the starter pipeline
    pub blank: bool,
}

#[derive(Debug, Deserialize)]
pub struct AddNodeRequest {
    /// Library template key (e.g. "ml-model")
    pub template: String,
    pub label: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateNodeRequest {
    pub label: Option<String>,
    pub config: Option<NodeConfig>,
}

#[derive(Debug, Deserialize)]
pub struct ConnectRequest {
    pub source: String,
    pub target: String,
}

/// Create workflow builder and run routes
///
/// All endpoints use the shared application state for registry and engine access.
pub fn create_workflow_routes() -> Router<AppState> {
    Router::new()
        .route("/api/catalog", get(list_catalog))
        .route("/api/library", get(list_library))
        .route("/api/workflows", post(create_workflow))
        .route("/api/workflows", get(list_workflows))
        .route("/api/workflows/{id}", get(get_workflow))
        .route("/api/workflows/{id}", delete(delete_workflow))
        .route("/api/workflows/{id}/nodes", post(add_node))
        .route("/api/workflows/{id}/nodes/{node_id}", put(update_node))
        .route("/api/workflows/{id}/nodes/{node_id}", delete(delete_node))
        .route("/api/workflows/{id}/nodes/{node_id}/result", get(node_result))
        .route("/api/workflows/{id}/nodes/{node_id}/download-model", post(download_model))
        .route("/api/workflows/{id}/edges", post(connect_nodes))
        .route("/api/workflows/{id}/edges/{edge_id}", delete(delete_edge))
        .route("/api/workflows/{id}/arrange", post(arrange_workflow))
        .route("/api/workflows/{id}/run", post(run_workflow))
        .route("/api/workflows/{id}/cancel", post(cancel_run))
        .route("/api/workflows/{id}/execution", get(get_execution))
}

fn find_session(state: &AppState, id: &str) -> Result<Arc<WorkflowSession>, HandlerError> {
    state
        .registry
        .get(id)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, format!("Workflow not found: {}", id)))
}

/// GET /api/catalog
async fn list_catalog(State(state): State<AppState>) -> Json<Vec<ModelSpec>> {
    Json(state.catalog.list().to_vec())
}

/// GET /api/library
async fn list_library() -> Json<&'static [NodeTemplate]> {
    Json(library::templates())
}

/// Create a new workflow
///
/// POST /api/workflows
/// Body: { "name": "...", "blank": false }
async fn create_workflow(
    State(state): State<AppState>,
    Json(payload): Json<CreateWorkflowRequest>,
) -> (StatusCode, Json<Workflow>) {
    let id = format!("wf-{}", uuid::Uuid::new_v4());
    let name = payload
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| "Untitled Workflow".to_string());

    let workflow = if payload.blank {
        Workflow::new(id, name)
    } else {
        Workflow::with_default_pipeline(id, name)
    };

    tracing::info!("🔥 Created workflow: {} ({})", workflow.id, workflow.name);
    let session = state.registry.create(workflow);
    (StatusCode::CREATED, Json(session.snapshot()))
}

/// List all workflows
///
/// GET /api/workflows
/// Returns: { "workflows": [{ "id": "...", "name": "...", "nodes": 4, "edges": 3, "status": "ready" }] }
async fn list_workflows(State(state): State<AppState>) -> Json<Value> {
    let workflows: Vec<Value> = state
        .registry
        .list()
        .iter()
        .map(|session| {
            let status = session.monitor.snapshot().status;
            session.read(|wf| {
                json!({
                    "id": wf.id,
                    "name": wf.name,
                    "nodes": wf.nodes.len(),
                    "edges": wf.edges.len(),
                    "status": status,
                })
            })
        })
        .collect();
    Json(json!({ "workflows": workflows }))
}

/// GET /api/workflows/{id}
async fn get_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Workflow>, HandlerError> {
    Ok(Json(find_session(&state, &id)?.snapshot()))
}

/// Delete a workflow, cancelling its run if one is in flight
///
/// DELETE /api/workflows/{id}
async fn delete_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, HandlerError> {
    let session = find_session(&state, &id)?;
    if session.monitor.cancel() {
        tracing::info!("🛑 Cancelled in-flight run of deleted workflow {}", id);
    }
    state.registry.remove(&id);
    Ok(Json(json!({ "message": "Workflow deleted successfully" })))
}

/// Add a node from a library template
///
/// POST /api/workflows/{id}/nodes
/// Body: { "template": "ml-model", "label": "Churn model" }
async fn add_node(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<AddNodeRequest>,
) -> Result<(StatusCode, Json<Node>), HandlerError> {
    let session = find_session(&state, &id)?;
    let template = library::template(&payload.template).ok_or_else(|| {
        reject(StatusCode::BAD_REQUEST, format!("Unknown node template: {}", payload.template))
    })?;

    let node = session.edit(|wf| wf.add_node(template, payload.label).clone());
    Ok((StatusCode::CREATED, Json(node)))
}

/// Change a node's label and/or configuration
///
/// PUT /api/workflows/{id}/nodes/{node_id}
/// Body: { "label": "...", "config": { "kind": "model", ... } }
async fn update_node(
    State(state): State<AppState>,
    Path((id, node_id)): Path<(String, String)>,
    Json(payload): Json<UpdateNodeRequest>,
) -> Result<Json<Node>, HandlerError> {
    let session = find_session(&state, &id)?;
    session.edit(|wf| {
        if wf.node(&node_id).is_none() {
            return Err(reject(StatusCode::NOT_FOUND, format!("Node not found: {}", node_id)));
        }
        wf.update_node(&node_id, payload.label, payload.config)
            .map(|node| Json(node.clone()))
            .map_err(|e| reject(StatusCode::BAD_REQUEST, e.to_string()))
    })
}

/// DELETE /api/workflows/{id}/nodes/{node_id}
async fn delete_node(
    State(state): State<AppState>,
    Path((id, node_id)): Path<(String, String)>,
) -> Result<Json<Value>, HandlerError> {
    let session = find_session(&state, &id)?;
    if session.edit(|wf| wf.delete_node(&node_id)) {
        Ok(Json(json!({ "deleted": node_id })))
    } else {
        Err(reject(StatusCode::NOT_FOUND, format!("Node not found: {}", node_id)))
    }
}

/// Connect two nodes
///
/// POST /api/workflows/{id}/edges
/// Body: { "source": "...", "target": "..." }
/// Returns: { "edge": {...} } or { "edge": null } when the connection is not allowed
async fn connect_nodes(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<ConnectRequest>,
) -> Result<Json<Value>, HandlerError> {
    let session = find_session(&state, &id)?;
    let edge = session.edit(|wf| wf.connect(&payload.source, &payload.target));
    Ok(Json(json!({ "edge": edge })))
}

/// DELETE /api/workflows/{id}/edges/{edge_id}
async fn delete_edge(
    State(state): State<AppState>,
    Path((id, edge_id)): Path<(String, String)>,
) -> Result<Json<Value>, HandlerError> {
    let session = find_session(&state, &id)?;
    if session.edit(|wf| wf.delete_edge(&edge_id)) {
        Ok(Json(json!({ "deleted": edge_id })))
    } else {
        Err(reject(StatusCode::NOT_FOUND, format!("Edge not found: {}", edge_id)))
    }
}

/// POST /api/workflows/{id}/arrange
async fn arrange_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Workflow>, HandlerError> {
    let session = find_session(&state, &id)?;
    Ok(Json(session.edit(|wf| {
        wf.arrange();
        wf.clone()
    })))
}

/// Start a run in the background
///
/// POST /api/workflows/{id}/run
/// Returns: 202 { "started": true }, 200 { "started": false } for an empty
/// workflow, 409 when a run is already in flight
async fn run_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<Value>), HandlerError> {
    let session = find_session(&state, &id)?;
    let workflow = session.snapshot();

    if workflow.nodes.is_empty() {
        return Ok((StatusCode::OK, Json(json!({ "started": false }))));
    }
    let Some(token) = session.monitor.try_begin() else {
        return Err(reject(StatusCode::CONFLICT, "Workflow is already running"));
    };

    let engine = state.engine.clone();
    tokio::spawn(async move {
        let status = engine.run_claimed(&workflow, &session.monitor, token).await;
        tracing::info!("🏁 Run of workflow '{}' finished: {:?}", workflow.id, status);
    });

    Ok((StatusCode::ACCEPTED, Json(json!({ "started": true }))))
}

/// POST /api/workflows/{id}/cancel
async fn cancel_run(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, HandlerError> {
    let session = find_session(&state, &id)?;
    Ok(Json(json!({ "cancelled": session.monitor.cancel() })))
}

/// Run status, per-node state and the execution log of the latest run
///
/// GET /api/workflows/{id}/execution
async fn get_execution(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RunSnapshot>, HandlerError> {
    Ok(Json(find_session(&state, &id)?.monitor.snapshot()))
}

/// Result JSON a node produced in the latest run
///
/// GET /api/workflows/{id}/nodes/{node_id}/result
async fn node_result(
    State(state): State<AppState>,
    Path((id, node_id)): Path<(String, String)>,
) -> Result<Json<Value>, HandlerError> {
    find_session(&state, &id)?
        .monitor
        .node_result(&node_id)
        .map(Json)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, format!("No results for node: {}", node_id)))
}

/// Download the model a node trained into the download directory
///
/// POST /api/workflows/{id}/nodes/{node_id}/download-model
/// Returns: { "path": "...", "filename": "..." }
async fn download_model(
    State(state): State<AppState>,
    Path((id, node_id)): Path<(String, String)>,
) -> Result<Json<Value>, HandlerError> {
    let session = find_session(&state, &id)?;
    let result = session
        .monitor
        .node_result(&node_id)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, format!("No results for node: {}", node_id)))?;

    let model_id = match result.get("model_id") {
        Some(Value::String(model_id)) => model_id.clone(),
        Some(Value::Number(model_id)) => model_id.to_string(),
        _ => return Err(reject(StatusCode::BAD_REQUEST, "Node result has no model_id")),
    };

    let model = state
        .engine
        .executor()
        .client()
        .download_model(&model_id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to download model {}: {}", model_id, e);
            reject(StatusCode::BAD_GATEWAY, e.to_string())
        })?;

    let path = model.save_to(&state.download_dir).await.map_err(|e| {
        tracing::error!("Failed to save model {}: {}", model_id, e);
        reject(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    Ok(Json(json!({
        "path": path.display().to_string(),
        "filename": model.filename,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{runtime::executor::NodeExecutor, training::TrainingClient};
    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request},
    };
    use std::time::Duration;
    use tower::ServiceExt;
    use wiremock::{
        matchers::{method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn app_state(base_url: &str, download_dir: PathBuf) -> AppState {
        let catalog = Arc::new(ModelCatalog::builtin().unwrap());
        let executor = NodeExecutor::new(TrainingClient::new(base_url), Arc::clone(&catalog));
        AppState {
            registry: Arc::new(WorkflowRegistry::new()),
            engine: ExecutionEngine::new(Arc::new(executor)),
            catalog,
            download_dir,
        }
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        let request = match body {
            Some(body) => request.body(Body::from(body.to_string())).unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn wait_for_run(app: &Router, id: &str) -> Value {
        for _ in 0..300 {
            let (_, execution) = send(app, Method::GET, &format!("/api/workflows/{}/execution", id), None).await;
            if matches!(execution["status"].as_str(), Some("success" | "error" | "cancelled")) {
                return execution;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("run of {} did not finish", id);
    }

    #[tokio::test]
    async fn catalog_and_library_are_served() {
        let app = create_workflow_routes().with_state(app_state("http://unused", PathBuf::from("unused")));

        let (status, catalog) = send(&app, Method::GET, "/api/catalog", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(catalog.as_array().unwrap().len(), 18);
        assert_eq!(catalog[0]["slug"], json!("linear-regression"));

        let (_, library) = send(&app, Method::GET, "/api/library", None).await;
        let keys: Vec<_> = library.as_array().unwrap().iter().map(|t| t["key"].clone()).collect();
        assert!(keys.contains(&json!("ml-model")));
        assert_eq!(library[0]["output_types"], json!(["csv", "dataframe"]));
    }

    #[tokio::test]
    async fn create_list_and_delete_workflows() {
        let app = create_workflow_routes().with_state(app_state("http://unused", PathBuf::from("unused")));

        let (status, created) = send(&app, Method::POST, "/api/workflows", Some(json!({}))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["name"], json!("Untitled Workflow"));
        assert_eq!(created["nodes"].as_array().unwrap().len(), 4);
        assert_eq!(created["edges"][2]["data_type"], json!("result"));

        let (_, blank) = send(&app, Method::POST, "/api/workflows", Some(json!({ "name": "Scratch", "blank": true }))).await;
        assert!(blank["nodes"].as_array().unwrap().is_empty());

        let (_, list) = send(&app, Method::GET, "/api/workflows", None).await;
        assert_eq!(list["workflows"].as_array().unwrap().len(), 2);

        let id = created["id"].as_str().unwrap();
        let (status, _) = send(&app, Method::DELETE, &format!("/api/workflows/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = send(&app, Method::GET, &format!("/api/workflows/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("Workflow not found"));
    }

    #[tokio::test]
    async fn editing_the_graph() {
        let state = app_state("http://unused", PathBuf::from("unused"));
        state.registry.create(Workflow::with_default_pipeline("wf-1", "Untitled Workflow"));
        let app = create_workflow_routes().with_state(state);

        let (status, node) = send(
            &app,
            Method::POST,
            "/api/workflows/wf-1/nodes",
            Some(json!({ "template": "ml-model", "label": "Second model" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(node["label"], json!("Second model"));
        let node_id = node["id"].as_str().unwrap().to_string();

        let (status, _) = send(&app, Method::POST, "/api/workflows/wf-1/nodes", Some(json!({ "template": "nope" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, connected) = send(
            &app,
            Method::POST,
            "/api/workflows/wf-1/edges",
            Some(json!({ "source": "data-1", "target": node_id })),
        )
        .await;
        assert_eq!(connected["edge"]["data_type"], json!("dataframe"));

        // Rejected connections are not an error
        let (status, rejected) = send(
            &app,
            Method::POST,
            "/api/workflows/wf-1/edges",
            Some(json!({ "source": "data-1", "target": "output-1" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(rejected["edge"], Value::Null);

        let (status, _) = send(
            &app,
            Method::PUT,
            &format!("/api/workflows/wf-1/nodes/{}", node_id),
            Some(json!({ "config": { "kind": "output" } })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, updated) = send(
            &app,
            Method::PUT,
            &format!("/api/workflows/wf-1/nodes/{}", node_id),
            Some(json!({ "config": { "kind": "model", "algorithm": "xgboost" } })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["config"]["algorithm"], json!("xgboost"));

        let (status, _) = send(&app, Method::PUT, "/api/workflows/wf-1/nodes/ghost", Some(json!({}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, arranged) = send(&app, Method::POST, "/api/workflows/wf-1/arrange", None).await;
        assert_eq!(arranged["nodes"][4]["position"]["x"], json!(1350.0));

        let (status, _) = send(&app, Method::DELETE, &format!("/api/workflows/wf-1/nodes/{}", node_id), None).await;
        assert_eq!(status, StatusCode::OK);
        let (_, workflow) = send(&app, Method::GET, "/api/workflows/wf-1", None).await;
        assert_eq!(workflow["edges"].as_array().unwrap().len(), 3);

        let (status, _) = send(&app, Method::DELETE, "/api/workflows/wf-1/edges/e9-9", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn run_guards() {
        let state = app_state("http://unused", PathBuf::from("unused"));
        state.registry.create(Workflow::new("wf-empty", "Empty"));
        let busy = state.registry.create(Workflow::with_default_pipeline("wf-busy", "Busy"));
        let app = create_workflow_routes().with_state(state);

        let (status, body) = send(&app, Method::POST, "/api/workflows/wf-empty/run", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["started"], json!(false));

        let _claim = busy.monitor.try_begin().unwrap();
        let (status, _) = send(&app, Method::POST, "/api/workflows/wf-busy/run", None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, body) = send(&app, Method::POST, "/api/workflows/wf-empty/cancel", None).await;
        assert_eq!(body["cancelled"], json!(false));
    }

    #[tokio::test]
    async fn failed_run_is_reported_in_the_execution_log() {
        let state = app_state("http://unused", PathBuf::from("unused"));
        state.registry.create(Workflow::with_default_pipeline("wf-1", "Untitled Workflow"));
        let app = create_workflow_routes().with_state(state);

        let (status, _) = send(&app, Method::POST, "/api/workflows/wf-1/run", None).await;
        assert_eq!(status, StatusCode::ACCEPTED);

        let execution = wait_for_run(&app, "wf-1").await;
        assert_eq!(execution["status"], json!("error"));
        assert_eq!(execution["nodes"]["data-1"]["status"], json!("error"));
        assert_eq!(execution["nodes"]["process-1"]["status"], json!("ready"));

        let log = execution["log"].as_array().unwrap();
        assert_eq!(log[2]["error"], json!("No file uploaded"));
        assert_eq!(log.last().unwrap()["message"], json!("Workflow execution failed: No file uploaded"));

        let (status, _) = send(&app, Method::GET, "/api/workflows/wf-1/nodes/output-1/result", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn successful_run_then_model_download() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/perform"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "accuracy": 0.9,
                "r2": 0.81,
                "model_id": "rf-123"
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/download-model"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-disposition", "attachment; filename=\"random_forest.pkl\"")
                    .set_body_bytes(b"pickle".to_vec()),
            )
            .mount(&server)
            .await;

        let data_dir = tempfile::tempdir().unwrap();
        let dataset = data_dir.path().join("iris.csv");
        std::fs::write(&dataset, "sepal,species\n5.1,setosa\n").unwrap();
        let download_dir = tempfile::tempdir().unwrap();

        let state = app_state(&server.uri(), download_dir.path().to_path_buf());
        let session = state.registry.create(Workflow::with_default_pipeline("wf-1", "Untitled Workflow"));
        session.edit(|wf| {
            if let Some(NodeConfig::Data(config)) = wf.node_mut("data-1").map(|n| &mut n.config) {
                config.file = Some(dataset.clone());
            }
        });
        let app = create_workflow_routes().with_state(state);

        let (status, _) = send(&app, Method::POST, "/api/workflows/wf-1/run", None).await;
        assert_eq!(status, StatusCode::ACCEPTED);

        let execution = wait_for_run(&app, "wf-1").await;
        assert_eq!(execution["status"], json!("success"));
        assert_eq!(execution["nodes"]["model-1"]["label"], json!("Random Forest"));
        assert_eq!(execution["nodes"]["model-1"]["accuracy"], json!("90.00%"));
        assert_eq!(
            execution["nodes"]["output-1"]["metrics"],
            json!([
                { "name": "Accuracy", "value": "90.00%" },
                { "name": "R² Score", "value": "0.8100" }
            ])
        );

        let (status, result) = send(&app, Method::GET, "/api/workflows/wf-1/nodes/model-1/result", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(result["model_id"], json!("rf-123"));

        let (status, download) = send(
            &app,
            Method::POST,
            "/api/workflows/wf-1/nodes/model-1/download-model",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(download["filename"], json!("random_forest.pkl"));
        let saved = std::fs::read(download_dir.path().join("random_forest.pkl")).unwrap();
        assert_eq!(saved, b"pickle");
    }
}
