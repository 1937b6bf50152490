use std::{collections::HashMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;
use uuid::Uuid;

/// One request as the server received it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Capture {
    pub id: Uuid,
    pub seq: usize,
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Capture {
    /// First header called `name`, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Deserialize)]
pub struct RedirectParams {
    pub status: u16,
    pub location: Option<String>,
}

pub type Db = Arc<RwLock<HashMap<Uuid, Capture>>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/redirect", any(redirect))
        .route("/loop/{name}", any(redirect_loop))
        .route("/echo", any(echo))
        .route("/get-only", get(get_only))
        .route("/captures", get(list_captures).delete(clear_captures))
        .route("/captures/{id}", get(get_capture))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn record(db: &Db, method: &Method, uri: &Uri, headers: &HeaderMap, body: &[u8]) -> Capture {
    let mut captures = db.write().await;
    let capture = Capture {
        id: Uuid::new_v4(),
        seq: captures.len(),
        method: method.as_str().to_string(),
        path: uri.path().to_string(),
        headers: headers
            .iter()
            .map(|(n, v)| {
                (
                    n.as_str().to_string(),
                    String::from_utf8_lossy(v.as_bytes()).into_owned(),
                )
            })
            .collect(),
        body: String::from_utf8_lossy(body).into_owned(),
    };
    info!(method = %method, path = %uri.path(), bytes = body.len(), "captured request");
    captures.insert(capture.id, capture.clone());
    capture
}

/// Answer with the requested status and `Location`. The request body is
/// read in full first, like a handler that consumed the upload.
async fn redirect(
    State(db): State<Db>,
    Query(params): Query<RedirectParams>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, StatusCode> {
    record(&db, &method, &uri, &headers, &body).await;
    let status = StatusCode::from_u16(params.status).map_err(|_| StatusCode::BAD_REQUEST)?;
    let mut response = status.into_response();
    if let Some(location) = params.location {
        let value = HeaderValue::from_str(&location).map_err(|_| StatusCode::BAD_REQUEST)?;
        response.headers_mut().insert(header::LOCATION, value);
    }
    Ok(response)
}

/// `/loop/a` points at `/loop/b` and everything else points back at
/// `/loop/a`, so a client following them never terminates on its own.
async fn redirect_loop(
    State(db): State<Db>,
    Path(name): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    record(&db, &method, &uri, &headers, &body).await;
    let next = if name == "a" { "/loop/b" } else { "/loop/a" };
    (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, next)])
}

async fn echo(
    State(db): State<Db>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Json<Capture> {
    Json(record(&db, &method, &uri, &headers, &body).await)
}

async fn get_only(State(db): State<Db>, uri: Uri, headers: HeaderMap) -> &'static str {
    record(&db, &Method::GET, &uri, &headers, &[]).await;
    "def"
}

async fn list_captures(State(db): State<Db>) -> Json<Vec<Capture>> {
    let captures = db.read().await;
    let mut all: Vec<Capture> = captures.values().cloned().collect();
    all.sort_by_key(|c| c.seq);
    Json(all)
}

async fn get_capture(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
) -> Result<Json<Capture>, StatusCode> {
    let captures = db.read().await;
    captures.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn clear_captures(State(db): State<Db>) -> StatusCode {
    db.write().await.clear();
    StatusCode::NO_CONTENT
}
