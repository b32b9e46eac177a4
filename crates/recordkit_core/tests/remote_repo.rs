use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use recordkit_core::{
    AppStore, RecordFilter, RecordId, RecordPatch, RecordRepository, RecordSchema,
    RemoteConfig, RemoteRecordRepository, RepoError,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct FakeServer {
    rows: Arc<Mutex<Vec<Value>>>,
    posts: Arc<Mutex<usize>>,
}

impl FakeServer {
    fn rows(&self) -> Vec<Value> {
        self.rows.lock().unwrap().clone()
    }

    fn post_count(&self) -> usize {
        *self.posts.lock().unwrap()
    }
}

async fn list_rows(
    State(server): State<FakeServer>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Vec<Value>> {
    let rows = server.rows();
    let matching = rows
        .into_iter()
        .filter(|row| {
            params.iter().all(|(key, expected)| {
                if key == "q" {
                    ["title", "description"].iter().any(|field| {
                        row[*field]
                            .as_str()
                            .is_some_and(|text| text.to_lowercase().contains(expected.as_str()))
                    })
                } else {
                    row[key.as_str()].as_str() == Some(expected.as_str())
                }
            })
        })
        .collect();
    Json(matching)
}

async fn create_row(
    State(server): State<FakeServer>,
    Json(row): Json<Value>,
) -> (StatusCode, Json<Value>) {
    *server.posts.lock().unwrap() += 1;
    server.rows.lock().unwrap().push(row.clone());
    (StatusCode::CREATED, Json(row))
}

async fn get_row(
    State(server): State<FakeServer>,
    Path(id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    server
        .rows()
        .into_iter()
        .find(|row| row["id"] == id.as_str())
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn replace_row(
    State(server): State<FakeServer>,
    Path(id): Path<String>,
    Json(row): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    let mut rows = server.rows.lock().unwrap();
    let slot = rows
        .iter_mut()
        .find(|existing| existing["id"] == id.as_str())
        .ok_or(StatusCode::NOT_FOUND)?;
    *slot = row.clone();
    Ok(Json(row))
}

async fn delete_row(
    State(server): State<FakeServer>,
    Path(id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    let mut rows = server.rows.lock().unwrap();
    let before = rows.len();
    rows.retain(|row| row["id"] != id.as_str());
    if rows.len() == before {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(json!({})))
}

async fn broken() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn spawn_server(server: FakeServer) -> String {
    let app = Router::new()
        .route("/tasks", get(list_rows).post(create_row))
        .route(
            "/tasks/:id",
            get(get_row).put(replace_row).delete(delete_row),
        )
        .route("/broken", get(broken).post(broken))
        .with_state(server);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn remote(base_url: &str, resource: &str) -> RemoteRecordRepository {
    let config = RemoteConfig {
        base_url: format!("{base_url}/"),
        resource: resource.to_string(),
        timeout_secs: 5,
    };
    RemoteRecordRepository::new(&config, RecordSchema::tasks()).unwrap()
}

#[tokio::test]
async fn create_posts_a_complete_record_and_list_reads_it_back() {
    let server = FakeServer::default();
    let repo = remote(&spawn_server(server.clone()).await, "tasks");

    let created = repo.create(&json!({"title": "  Ship it "})).await.unwrap();
    assert_eq!(created.fields["title"], "Ship it");
    assert_eq!(created.fields["stats"], "all");
    assert!(!created.created_at.is_empty());

    let stored = server.rows();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0]["id"], created.id.as_str());
    assert_eq!(stored[0]["createdAt"], created.created_at.as_str());

    assert_eq!(repo.list().await.unwrap(), vec![created.clone()]);
    assert_eq!(repo.get_by_id(&created.id).await.unwrap(), Some(created));
}

#[tokio::test]
async fn invalid_create_never_reaches_the_server() {
    let server = FakeServer::default();
    let repo = remote(&spawn_server(server.clone()).await, "tasks");

    let err = repo.create(&json!({"title": "   "})).await.unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert_eq!(server.post_count(), 0);
}

#[tokio::test]
async fn update_merges_client_side_and_unknown_ids_are_absent() {
    let server = FakeServer::default();
    let repo = remote(&spawn_server(server.clone()).await, "tasks");
    let created = repo
        .create(&json!({"title": "draft", "priority": "low"}))
        .await
        .unwrap();

    let updated = repo
        .update(&created.id, &RecordPatch::new().set("priority", "high"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.fields["title"], "draft");
    assert_eq!(updated.fields["priority"], "high");
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at.is_some());
    assert_eq!(server.rows()[0]["priority"], "high");

    let missing = repo
        .update(&RecordId::from("ghost"), &RecordPatch::new().set("title", "x"))
        .await
        .unwrap();
    assert!(missing.is_none());
    assert!(repo
        .get_by_id(&RecordId::from("ghost"))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn delete_reports_whether_the_record_existed() {
    let server = FakeServer::default();
    let repo = remote(&spawn_server(server.clone()).await, "tasks");
    let created = repo.create(&json!({"title": "temp"})).await.unwrap();

    assert!(repo.delete(&created.id).await.unwrap());
    assert!(server.rows().is_empty());
    assert!(!repo.delete(&created.id).await.unwrap());
}

#[tokio::test]
async fn filter_sends_field_and_search_parameters() {
    let server = FakeServer::default();
    let repo = remote(&spawn_server(server.clone()).await, "tasks");
    repo.create(&json!({"title": "Report", "stats": "done"}))
        .await
        .unwrap();
    repo.create(&json!({"title": "Email", "description": "Send the REPORT"}))
        .await
        .unwrap();

    let done = repo
        .filter(&RecordFilter::field_equals("stats", " done "))
        .await
        .unwrap();
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].fields["title"], "Report");

    let hits = repo
        .filter(&RecordFilter::search("  REPORT "))
        .await
        .unwrap();
    assert_eq!(hits.len(), 2);

    assert!(repo
        .filter(&RecordFilter::search(""))
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn server_errors_surface_as_transport_status() {
    let base_url = spawn_server(FakeServer::default()).await;
    let repo = remote(&base_url, "broken");

    let err = repo.list().await.unwrap_err();
    assert!(matches!(err, RepoError::Transport { status: 500 }));
    assert_eq!(err.to_string(), "HTTP error! status: 500");

    let store = AppStore::new(remote(&base_url, "broken"));
    store.load_all().await;
    assert_eq!(store.error().as_deref(), Some("HTTP error! status: 500"));
    assert!(!store.has_records());
    assert!(!store.loading());

    assert!(store.add(&json!({"title": "x"})).await.is_none());
    assert_eq!(store.error().as_deref(), Some("HTTP error! status: 500"));
}

#[tokio::test]
async fn app_store_drives_the_remote_backend() {
    let server = FakeServer::default();
    let store = AppStore::new(remote(&spawn_server(server.clone()).await, "tasks"));

    let created = store.add(&json!({"title": "remote"})).await.unwrap();
    store.toggle_favorite(&created.id).await.unwrap();
    assert_eq!(store.favorite_count(), 1);
    assert_eq!(server.rows()[0]["favorite"], true);

    assert!(store.remove(&created.id).await);
    store.load_all().await;
    assert!(!store.has_records());
    assert!(store.error().is_none());
}
