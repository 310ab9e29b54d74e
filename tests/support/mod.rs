//! In-process fake of the AppDb datastore API for integration tests.
//!
//! Every request is recorded (method, path with query, body, auth header)
//! before it reaches a handler, so tests can assert on the exact wire shape.

#![allow(dead_code)]

use axum::{
    body::Body,
    extract::{Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use appdb::AppDbClient;

pub const BASE_PATH: &str = "/domo/datastores/v1";

/// Fixed timestamp stamped on every stored document.
pub const STORE_TIMESTAMP: &str = "2024-03-04T18:47:12.327+0000";

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Path and query, relative to the datastore root.
    pub uri: String,
    pub body: String,
    pub authorization: Option<String>,
}

impl RecordedRequest {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or(Value::Null)
    }
}

#[derive(Default)]
struct Inner {
    requests: Vec<RecordedRequest>,
    collections: HashMap<String, BTreeMap<String, Value>>,
    export_status: Option<u16>,
    export_body: String,
}

#[derive(Clone, Default)]
pub struct FakeAppDb {
    inner: Arc<Mutex<Inner>>,
}

/// A running fake server and a client pointed at it.
pub struct TestServer {
    pub fake: FakeAppDb,
    pub base_url: String,
}

impl TestServer {
    pub async fn start() -> Self {
        let fake = FakeAppDb::default();
        let app = fake.router();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            fake,
            base_url: format!("http://{}{}", addr, BASE_PATH),
        }
    }

    pub fn client(&self) -> AppDbClient {
        AppDbClient::new(self.base_url.clone())
    }
}

impl FakeAppDb {
    fn router(&self) -> Router {
        let api = Router::new()
            .route("/collections/", post(create_collection))
            .route(
                "/collections/{c}",
                put(update_collection).delete(delete_collection),
            )
            .route("/collections/{c}/documents", get(list_documents))
            .route("/collections/{c}/documents/", post(create_document))
            .route(
                "/collections/{c}/documents/bulk",
                post(bulk_create).put(bulk_upsert).delete(bulk_delete),
            )
            .route("/collections/{c}/documents/query", post(query_documents))
            .route("/collections/{c}/documents/update", put(update_where))
            .route(
                "/collections/{c}/documents/{id}",
                get(get_document).put(update_document).delete(delete_document),
            )
            .route(
                "/collections/{c}/permission/{level}/{entity}",
                put(ok).delete(ok),
            )
            .route("/export", post(export));

        Router::new()
            .nest(BASE_PATH, api)
            .with_state(self.clone())
            .layer(middleware::from_fn_with_state(self.clone(), record))
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.inner.lock().unwrap().requests.clone()
    }

    pub fn last_request(&self) -> RecordedRequest {
        self.requests().pop().expect("no request recorded")
    }

    pub fn request_count(&self) -> usize {
        self.inner.lock().unwrap().requests.len()
    }

    pub fn set_export_status(&self, status: u16) {
        self.inner.lock().unwrap().export_status = Some(status);
    }

    /// Makes export answer `status` with a plain-text body.
    pub fn set_export_failure(&self, status: u16, body: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.export_status = Some(status);
        inner.export_body = body.to_string();
    }

    /// Stored content of one document, if present.
    pub fn content(&self, collection: &str, id: &str) -> Option<Value> {
        let inner = self.inner.lock().unwrap();
        inner
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|doc| doc["content"].clone())
    }

    pub fn document_count(&self, collection: &str) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.collections.get(collection).map_or(0, BTreeMap::len)
    }

    fn insert(&self, collection: &str, content: Value) -> Value {
        let id = uuid::Uuid::new_v4().to_string();
        let doc = json!({
            "id": id,
            "content": content,
            "owner": 42,
            "createdOn": STORE_TIMESTAMP,
            "updatedOn": STORE_TIMESTAMP,
            "collectionId": collection,
        });
        let mut inner = self.inner.lock().unwrap();
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id, doc.clone());
        doc
    }

    /// Replaces content of an existing document; false when it is missing.
    fn replace(&self, collection: &str, id: &str, content: Value) -> bool {
        let mut inner = self.inner.lock().unwrap();
        match inner
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
        {
            Some(doc) => {
                doc["content"] = content;
                true
            }
            None => false,
        }
    }

    fn remove(&self, collection: &str, id: &str) -> bool {
        let mut inner = self.inner.lock().unwrap();
        inner
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.remove(id))
            .is_some()
    }

    fn matching(&self, collection: &str, query: &Value) -> Vec<Value> {
        let inner = self.inner.lock().unwrap();
        inner
            .collections
            .get(collection)
            .map(|docs| docs.values().filter(|d| matches(d, query)).cloned().collect())
            .unwrap_or_default()
    }
}

/// Equality match on `content.<field>` keys; other keys are ignored.
fn matches(doc: &Value, query: &Value) -> bool {
    let Some(filters) = query.as_object() else {
        return true;
    };
    filters.iter().all(|(key, expected)| match key.strip_prefix("content.") {
        Some(field) => doc["content"].get(field) == Some(expected),
        None => true,
    })
}

async fn record(State(fake): State<FakeAppDb>, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_default();

    let uri = parts.uri.to_string();
    let recorded = RecordedRequest {
        method: parts.method.to_string(),
        uri: uri.strip_prefix(BASE_PATH).unwrap_or(&uri).to_string(),
        body: String::from_utf8_lossy(&bytes).into_owned(),
        authorization: parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .map(str::to_string),
    };
    fake.inner.lock().unwrap().requests.push(recorded);

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not Found").into_response()
}

async fn ok() -> StatusCode {
    StatusCode::OK
}

async fn list_documents(State(fake): State<FakeAppDb>, Path(c): Path<String>) -> Json<Vec<Value>> {
    Json(fake.matching(&c, &Value::Null))
}

async fn create_document(
    State(fake): State<FakeAppDb>,
    Path(c): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    Json(fake.insert(&c, body["content"].clone()))
}

async fn get_document(
    State(fake): State<FakeAppDb>,
    Path((c, id)): Path<(String, String)>,
) -> Response {
    let inner = fake.inner.lock().unwrap();
    match inner.collections.get(&c).and_then(|docs| docs.get(&id)) {
        Some(doc) => Json(doc.clone()).into_response(),
        None => not_found(),
    }
}

async fn update_document(
    State(fake): State<FakeAppDb>,
    Path((c, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Response {
    if fake.replace(&c, &id, body["content"].clone()) {
        StatusCode::OK.into_response()
    } else {
        not_found()
    }
}

async fn delete_document(
    State(fake): State<FakeAppDb>,
    Path((c, id)): Path<(String, String)>,
) -> Response {
    if fake.remove(&c, &id) {
        StatusCode::OK.into_response()
    } else {
        not_found()
    }
}

async fn bulk_create(
    State(fake): State<FakeAppDb>,
    Path(c): Path<String>,
    Json(body): Json<Vec<Value>>,
) -> Json<Value> {
    for item in &body {
        fake.insert(&c, item["content"].clone());
    }
    Json(json!({ "Created": body.len() }))
}

async fn bulk_upsert(
    State(fake): State<FakeAppDb>,
    Path(c): Path<String>,
    Json(body): Json<Vec<Value>>,
) -> Json<Value> {
    let (mut created, mut updated) = (0, 0);
    for item in body {
        let content = item["content"].clone();
        match item.get("id").and_then(Value::as_str) {
            Some(id) if fake.replace(&c, id, content.clone()) => updated += 1,
            _ => {
                fake.insert(&c, content);
                created += 1;
            }
        }
    }
    Json(json!({ "Created": created, "Updated": updated }))
}

async fn bulk_delete(
    State(fake): State<FakeAppDb>,
    Path(c): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let ids = params.get("ids").cloned().unwrap_or_default();
    let deleted = ids
        .split(',')
        .filter(|id| !id.is_empty() && fake.remove(&c, id))
        .count();
    Json(json!({ "Deleted": deleted }))
}

async fn query_documents(
    State(fake): State<FakeAppDb>,
    Path(c): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    Json(query): Json<Value>,
) -> Json<Vec<Value>> {
    let docs = fake.matching(&c, &query);

    let Some(group_by) = params.get("groupBy") else {
        return Json(docs);
    };

    // groupBy + count only; the field is read from content
    let count_alias = params.get("count").cloned().unwrap_or_else(|| "count".into());
    let mut groups: BTreeMap<String, (Value, u64)> = BTreeMap::new();
    for doc in &docs {
        let key = doc["content"].get(group_by).cloned().unwrap_or(Value::Null);
        let entry = groups.entry(key.to_string()).or_insert((key, 0));
        entry.1 += 1;
    }
    let rows = groups
        .into_values()
        .map(|(key, count)| {
            let mut row = Map::new();
            row.insert(group_by.clone(), key);
            row.insert(count_alias.clone(), json!(count));
            row.insert("lastUpdated".into(), json!(STORE_TIMESTAMP));
            Value::Object(row)
        })
        .collect();
    Json(rows)
}

async fn update_where(
    State(fake): State<FakeAppDb>,
    Path(c): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let (Some(query), Some(operation)) = (body["query"].as_str(), body["operation"].as_str()) else {
        return (StatusCode::BAD_REQUEST, "query and operation must be strings").into_response();
    };
    let (Ok(query), Ok(operation)) = (
        serde_json::from_str::<Value>(query),
        serde_json::from_str::<Value>(operation),
    ) else {
        return (StatusCode::BAD_REQUEST, "invalid embedded JSON").into_response();
    };

    let targets = fake.matching(&c, &query);
    let set = operation["$set"].as_object().cloned().unwrap_or_default();
    for doc in &targets {
        let mut content = doc["content"].clone();
        for (key, value) in &set {
            let field = key.strip_prefix("content.").unwrap_or(key.as_str());
            content[field] = value.clone();
        }
        if let Some(id) = doc["id"].as_str() {
            fake.replace(&c, id, content);
        }
    }
    Json(json!({ "Updated": targets.len() })).into_response()
}

async fn create_collection(Json(body): Json<Value>) -> Json<Value> {
    Json(collection_response(&body))
}

async fn update_collection(Path(c): Path<String>, Json(mut body): Json<Value>) -> Json<Value> {
    body["name"] = json!(c);
    Json(collection_response(&body))
}

async fn delete_collection(State(fake): State<FakeAppDb>, Path(c): Path<String>) -> Response {
    let mut inner = fake.inner.lock().unwrap();
    inner.collections.remove(&c);
    StatusCode::OK.into_response()
}

fn collection_response(body: &Value) -> Value {
    json!({
        "id": "0b1c2d3e",
        "name": body["name"],
        "owner": 42,
        "datastoreId": "ds-1",
        "schema": body["schema"],
        "syncEnabled": body["syncEnabled"],
        "createdOn": STORE_TIMESTAMP,
        "updatedOn": STORE_TIMESTAMP,
    })
}

async fn export(State(fake): State<FakeAppDb>) -> Response {
    let inner = fake.inner.lock().unwrap();
    let status = StatusCode::from_u16(inner.export_status.unwrap_or(200))
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, inner.export_body.clone()).into_response()
}

/// Serves one connection that answers 500 and hangs up mid-body.
pub async fn start_truncating_server() -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let _ = socket
                .write_all(
                    b"HTTP/1.1 500 Internal Server Error\r\ncontent-length: 100\r\n\r\npartial",
                )
                .await;
            let _ = socket.shutdown().await;
        }
    });
    format!("http://{}{}", addr, BASE_PATH)
}
