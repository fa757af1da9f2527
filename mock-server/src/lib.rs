//! In-memory emulator of the POEditor v2 API.
//!
//! Every endpoint is a form-encoded `POST /{resource}/{action}` answering
//! with the `{"response": .., "result": ..}` envelope. Exports are served
//! back from `GET /download/file/{id}`.

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Form, Json, Router,
};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub mod formats;
mod store;

pub use store::{language_name, Failure, Outcome, Params, Store, LANGUAGES};

pub const DEFAULT_TOKEN: &str = "test-token";

/// Tokens the emulator accepts.
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub api_token: String,
    /// May call read endpoints only; writes answer HTTP 403.
    pub read_only_token: Option<String>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            api_token: DEFAULT_TOKEN.to_string(),
            read_only_token: None,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    config: Arc<MockConfig>,
    store: Arc<RwLock<Store>>,
}

pub type Reply = (StatusCode, Json<Value>);

fn success(result: Value) -> Reply {
    let mut body = json!({
        "response": { "status": "success", "code": "200", "message": "OK" },
    });
    if !result.is_null() {
        body["result"] = result;
    }
    (StatusCode::OK, Json(body))
}

fn failure(failure: Failure) -> Reply {
    tracing::debug!(code = failure.code, message = %failure.message, "request failed");
    let body = json!({
        "response": { "status": "fail", "code": failure.code, "message": failure.message },
    });
    (failure.http_status, Json(body))
}

fn reply(outcome: Outcome) -> Reply {
    match outcome {
        Ok(result) => success(result),
        Err(err) => failure(err),
    }
}

impl AppState {
    pub fn new(config: MockConfig) -> Self {
        Self {
            config: Arc::new(config),
            store: Arc::new(RwLock::new(Store::default())),
        }
    }

    fn authorize(&self, params: &Params, writes: bool) -> Result<(), Failure> {
        let token = params.get("api_token").map(String::as_str).unwrap_or_default();
        if token == self.config.api_token {
            return Ok(());
        }
        match self.config.read_only_token.as_deref() {
            Some(read_only) if token == read_only && !writes => Ok(()),
            Some(read_only) if token == read_only => Err(Failure::new(
                "4030",
                "This API token only has read access",
            )
            .with_status(StatusCode::FORBIDDEN)),
            _ => Err(Failure::invalid_token()),
        }
    }

    async fn read<F>(&self, params: &Params, op: F) -> Reply
    where
        F: FnOnce(&Store, &Params) -> Outcome,
    {
        if let Err(err) = self.authorize(params, false) {
            return failure(err);
        }
        let store = self.store.read().await;
        reply(op(&store, params))
    }

    async fn write<F>(&self, params: &Params, op: F) -> Reply
    where
        F: FnOnce(&mut Store, &Params) -> Outcome,
    {
        if let Err(err) = self.authorize(params, true) {
            return failure(err);
        }
        let mut store = self.store.write().await;
        reply(op(&mut store, params))
    }
}

pub fn app() -> Router {
    app_with(MockConfig::default())
}

pub fn app_with(config: MockConfig) -> Router {
    Router::new()
        .route("/projects/list", post(list_projects))
        .route("/projects/add", post(add_project))
        .route("/projects/view", post(view_project))
        .route("/projects/update", post(update_project))
        .route("/projects/delete", post(delete_project))
        .route("/projects/export", post(export))
        .route("/projects/upload", post(upload))
        .route("/projects/sync", post(sync_terms))
        .route("/languages/available", post(available_languages))
        .route("/languages/list", post(list_languages))
        .route("/languages/add", post(add_language))
        .route("/languages/update", post(update_language))
        .route("/languages/delete", post(delete_language))
        .route("/terms/list", post(list_terms))
        .route("/terms/add", post(add_terms))
        .route("/terms/update", post(update_terms))
        .route("/terms/delete", post(delete_terms))
        .route("/terms/add_comment", post(add_comments))
        .route("/contributors/list", post(list_contributors))
        .route("/contributors/add", post(add_contributor))
        .route("/contributors/remove", post(remove_contributor))
        .route("/download/file/{id}", get(download))
        .with_state(AppState::new(config))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with(listener, MockConfig::default()).await
}

pub async fn run_with(listener: TcpListener, config: MockConfig) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(config)).await
}

async fn list_projects(State(state): State<AppState>, Form(params): Form<Params>) -> Reply {
    state.read(&params, Store::list_projects).await
}

async fn add_project(State(state): State<AppState>, Form(params): Form<Params>) -> Reply {
    state.write(&params, Store::add_project).await
}

async fn view_project(State(state): State<AppState>, Form(params): Form<Params>) -> Reply {
    state.read(&params, Store::view_project).await
}

async fn update_project(State(state): State<AppState>, Form(params): Form<Params>) -> Reply {
    state.write(&params, Store::update_project).await
}

async fn delete_project(State(state): State<AppState>, Form(params): Form<Params>) -> Reply {
    state.write(&params, Store::delete_project).await
}

async fn sync_terms(State(state): State<AppState>, Form(params): Form<Params>) -> Reply {
    state.write(&params, Store::sync_terms).await
}

async fn available_languages(State(state): State<AppState>, Form(params): Form<Params>) -> Reply {
    state.read(&params, Store::available_languages).await
}

async fn list_languages(State(state): State<AppState>, Form(params): Form<Params>) -> Reply {
    state.read(&params, Store::list_languages).await
}

async fn add_language(State(state): State<AppState>, Form(params): Form<Params>) -> Reply {
    state.write(&params, Store::add_language).await
}

async fn update_language(State(state): State<AppState>, Form(params): Form<Params>) -> Reply {
    state.write(&params, Store::update_language).await
}

async fn delete_language(State(state): State<AppState>, Form(params): Form<Params>) -> Reply {
    state.write(&params, Store::delete_language).await
}

async fn list_terms(State(state): State<AppState>, Form(params): Form<Params>) -> Reply {
    state.read(&params, Store::list_terms).await
}

async fn add_terms(State(state): State<AppState>, Form(params): Form<Params>) -> Reply {
    state.write(&params, Store::add_terms).await
}

async fn update_terms(State(state): State<AppState>, Form(params): Form<Params>) -> Reply {
    state.write(&params, Store::update_terms).await
}

async fn delete_terms(State(state): State<AppState>, Form(params): Form<Params>) -> Reply {
    state.write(&params, Store::delete_terms).await
}

async fn add_comments(State(state): State<AppState>, Form(params): Form<Params>) -> Reply {
    state.write(&params, Store::add_comments).await
}

async fn list_contributors(State(state): State<AppState>, Form(params): Form<Params>) -> Reply {
    state.read(&params, Store::list_contributors).await
}

async fn add_contributor(State(state): State<AppState>, Form(params): Form<Params>) -> Reply {
    state.write(&params, Store::add_contributor).await
}

async fn remove_contributor(State(state): State<AppState>, Form(params): Form<Params>) -> Reply {
    state.write(&params, Store::remove_contributor).await
}

/// Exporting is allowed for read-only tokens, but it stores the rendered
/// file, so it needs the write lock.
async fn export(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(params): Form<Params>,
) -> Reply {
    if let Err(err) = state.authorize(&params, false) {
        return failure(err);
    }
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("localhost")
        .to_string();
    let mut store = state.store.write().await;
    reply(
        store
            .export(&params)
            .map(|id| json!({ "url": format!("http://{host}/download/file/{id}") })),
    )
}

async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> Reply {
    let mut params = Params::new();
    let mut file: Option<(String, Vec<u8>)> = None;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => return failure(Failure::new("4031", format!("Malformed upload: {err}"))),
        };
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let file_name = field.file_name().unwrap_or("upload").to_string();
            match field.bytes().await {
                Ok(bytes) => file = Some((file_name, bytes.to_vec())),
                Err(err) => return failure(Failure::new("4031", format!("Malformed upload: {err}"))),
            }
        } else {
            match field.text().await {
                Ok(text) => {
                    params.insert(name, text);
                }
                Err(err) => return failure(Failure::new("4031", format!("Malformed upload: {err}"))),
            }
        }
    }
    let Some((file_name, content)) = file else {
        return failure(Failure::new("4031", "Missing parameter: file"));
    };
    state
        .write(&params, |store, params| store.upload(params, &file_name, &content))
        .await
}

async fn download(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Vec<u8>, StatusCode> {
    let store = state.store.read().await;
    store.download(&id).ok_or(StatusCode::NOT_FOUND)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(token: &str) -> Params {
        Params::from([("api_token".to_string(), token.to_string())])
    }

    fn state() -> AppState {
        AppState::new(MockConfig {
            api_token: "rw".to_string(),
            read_only_token: Some("ro".to_string()),
        })
    }

    #[test]
    fn full_token_may_write() {
        assert!(state().authorize(&params("rw"), true).is_ok());
    }

    #[test]
    fn read_only_token_is_forbidden_from_writing() {
        let state = state();
        assert!(state.authorize(&params("ro"), false).is_ok());
        let err = state.authorize(&params("ro"), true).unwrap_err();
        assert_eq!(err.http_status, StatusCode::FORBIDDEN);
        assert_eq!(err.code, "4030");
    }

    #[test]
    fn unknown_token_fails_inside_a_200() {
        let err = state().authorize(&params("nope"), false).unwrap_err();
        assert_eq!(err.http_status, StatusCode::OK);
        assert_eq!(err.code, "4011");
        assert_eq!(err.message, "Invalid API Token");
    }

    #[test]
    fn success_envelope_omits_null_result() {
        let (status, Json(body)) = success(Value::Null);
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"]["status"], "success");
        assert!(body.get("result").is_none());
    }

    #[test]
    fn failure_envelope_carries_code_and_message() {
        let (status, Json(body)) = failure(Failure::new("4012", "Invalid project ID"));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"]["status"], "fail");
        assert_eq!(body["response"]["code"], "4012");
        assert_eq!(body["response"]["message"], "Invalid project ID");
    }
}
