// Fake vendor backend and CDN shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use url::Url;

use speediance_manager::config::AppConfig;

pub const TOKEN: &str = "tok-123";
pub const PASSWORD: &str = "secret";

/// Number of exercise groups the fake library exposes.
pub const LIBRARY_SIZE: i64 = 120;

#[derive(Default)]
pub struct Vendor {
    pub saved: Mutex<Vec<Value>>,
    pub deleted: Mutex<Vec<String>>,
    pub units: Mutex<Vec<Value>>,
    pub batch_calls: AtomicUsize,
    pub logouts: AtomicUsize,
    pub cdn_base: Mutex<String>,
}

impl Vendor {
    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }
}

fn ok(data: Value) -> Json<Value> {
    Json(json!({ "code": 0, "message": "success", "data": data }))
}

fn authorized(headers: &HeaderMap) -> bool {
    headers.get("token").and_then(|v| v.to_str().ok()) == Some(TOKEN)
        && headers.get("app_user_id").is_some()
}

/// Group 2 is unilateral; every group's first variant id is `group * 100 + 1`.
pub fn group_json(id: i64, cdn: &str) -> Value {
    json!({
        "id": id,
        "title": format!("Exercise {id}"),
        "img": format!("{cdn}/img/cover{id}.jpg"),
        "accessories": if id == 1 { "1,2" } else { "" },
        "isLeftRight": if id == 2 { 1 } else { 0 },
        "actionLibraryList": [
            { "id": id * 100 + 1, "videoPath": format!("{cdn}/video/main{id}.mp4") },
            { "id": id * 100 + 2 }
        ],
        "showDetails": "[{\"context\":\"Brace\",\"img\":\"\"}]"
    })
}

async fn verify_identity(Json(body): Json<Value>) -> Json<Value> {
    let exists = body["userIdentity"] != "nobody@example.com";
    ok(json!({ "isExist": exists, "hasPwd": true }))
}

async fn login_by_pass(Json(body): Json<Value>) -> Json<Value> {
    if body["password"] == PASSWORD && body["type"] == 2 {
        ok(json!({ "token": TOKEN, "appUserId": 4242 }))
    } else {
        Json(json!({ "code": 1001, "message": "wrong password", "data": {} }))
    }
}

async fn logout(State(vendor): State<Arc<Vendor>>) -> Json<Value> {
    vendor.logouts.fetch_add(1, Ordering::SeqCst);
    ok(Value::Null)
}

async fn user_info(
    State(vendor): State<Arc<Vendor>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, ok(Value::Null));
    }
    vendor.units.lock().push(body);
    (StatusCode::OK, ok(Value::Null))
}

async fn training_parts(headers: HeaderMap) -> Json<Value> {
    if !authorized(&headers) {
        return Json(json!({ "code": 401, "message": "token invalid" }));
    }
    let ids: Vec<Value> = (1..=LIBRARY_SIZE).map(|id| json!({ "id": id })).collect();
    let (upper, lower) = ids.split_at(70);
    ok(json!([
        { "name": "Upper", "actionLibraryGroupList": upper },
        { "name": "Lower", "actionLibraryGroupList": lower }
    ]))
}

async fn group_list(
    State(vendor): State<Arc<Vendor>>,
    Query(query): Query<Vec<(String, String)>>,
) -> Json<Value> {
    vendor.batch_calls.fetch_add(1, Ordering::SeqCst);
    let cdn = vendor.cdn_base.lock().clone();
    let groups: Vec<Value> = query
        .iter()
        .filter(|(k, _)| k == "ids")
        .filter_map(|(_, v)| v.parse::<i64>().ok())
        .map(|id| group_json(id, &cdn))
        .collect();
    ok(Value::Array(groups))
}

async fn group_detail(State(vendor): State<Arc<Vendor>>, Path(id): Path<String>) -> Json<Value> {
    let cdn = vendor.cdn_base.lock().clone();
    match id.parse::<i64>() {
        Ok(id) if (1..=LIBRARY_SIZE).contains(&id) => ok(group_json(id, &cdn)),
        _ => Json(json!({ "code": 404, "message": "not found", "data": null })),
    }
}

async fn accessories(State(vendor): State<Arc<Vendor>>) -> Json<Value> {
    let cdn = vendor.cdn_base.lock().clone();
    ok(json!([
        { "id": 1, "name": "Bar", "img": format!("{cdn}/img/bar.png") },
        { "id": "2", "name": "Handle" }
    ]))
}

async fn app_page(headers: HeaderMap) -> Json<Value> {
    if !authorized(&headers) {
        return Json(json!({ "code": 401, "message": "token invalid" }));
    }
    ok(json!([
        { "id": 7, "code": "LEGDAY", "name": "Leg day" },
        { "id": 8, "code": "PUSH", "name": "Push" }
    ]))
}

async fn detail_by_code(Query(query): Query<HashMap<String, String>>) -> Json<Value> {
    if query.get("code").map(String::as_str) != Some("LEGDAY") {
        return Json(json!({ "code": 500, "message": "no such template", "data": null }));
    }
    ok(json!({
        "id": 7,
        "code": "LEGDAY",
        "name": "Leg day",
        "actionLibraryList": [
            {
                "groupId": 1,
                "actionLibraryId": 101,
                "templatePresetId": -1,
                "setsAndReps": "10,8",
                "weights": "44.0,55.0",
                "breakTime2": "60,90",
                "sportMode": "1,1",
                "leftRight": "0,0",
                "completionMethod": "1,1"
            }
        ]
    }))
}

async fn save_template(
    State(vendor): State<Arc<Vendor>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    if !authorized(&headers) {
        return Json(json!({ "code": 401, "message": "token invalid" }));
    }
    let rejected = body["name"] == "reject me";
    vendor.saved.lock().push(body);
    if rejected {
        Json(json!({ "code": 3001, "message": "name not allowed", "data": null }))
    } else {
        ok(Value::Null)
    }
}

async fn delete_template(
    State(vendor): State<Arc<Vendor>>,
    Query(query): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    match query.get("ids") {
        Some(ids) if ids != "404" => {
            vendor.deleted.lock().push(ids.clone());
            (StatusCode::OK, ok(Value::Null))
        }
        _ => (StatusCode::NOT_FOUND, ok(Value::Null)),
    }
}

/// Start the fake vendor API and return its state plus base URL.
pub async fn start_vendor() -> (Arc<Vendor>, Url) {
    let vendor = Arc::new(Vendor::default());
    let app = Router::new()
        .route("/api/app/v2/login/verifyIdentity", post(verify_identity))
        .route("/api/app/v2/login/byPass", post(login_by_pass))
        .route("/api/app/login/logout", post(logout))
        .route("/api/app/userinfo", put(user_info))
        .route(
            "/api/app/actionLibraryGroup/trainingPartGroup",
            get(training_parts),
        )
        .route("/api/app/actionLibraryGroup/list", get(group_list))
        .route("/api/app/actionLibraryGroup/{id}", get(group_detail))
        .route("/api/app/accessories/list", get(accessories))
        .route("/api/app/v4/customTrainingTemplate/appPage", get(app_page))
        .route(
            "/api/app/v3/customTrainingTemplate/detailByCode",
            get(detail_by_code),
        )
        .route("/api/app/v2/customTrainingTemplate", post(save_template))
        .route("/api/app/customTrainingTemplate", delete(delete_template))
        .with_state(vendor.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let base = Url::parse(&format!("http://127.0.0.1:{port}")).unwrap();
    (vendor, base)
}

#[derive(Default)]
pub struct Cdn {
    pub requests: Mutex<Vec<String>>,
}

impl Cdn {
    pub fn hits_for(&self, path: &str) -> usize {
        self.requests.lock().iter().filter(|p| *p == path).count()
    }
}

pub const CDN_IMAGE: &[u8] = b"\x89PNG fake image bytes";

async fn cdn_file(State(cdn): State<Arc<Cdn>>, Path(path): Path<String>) -> impl IntoResponse {
    cdn.requests.lock().push(format!("/{path}"));
    if path.contains("missing") {
        return (StatusCode::NOT_FOUND, Vec::new());
    }
    let body = if path.ends_with(".mp4") {
        vec![7u8; 64 * 1024]
    } else {
        CDN_IMAGE.to_vec()
    };
    (StatusCode::OK, body)
}

/// Start a fake CDN serving any path; paths containing `missing` return 404.
pub async fn start_cdn() -> (Arc<Cdn>, String) {
    let cdn = Arc::new(Cdn::default());
    let app = Router::new()
        .route("/{*path}", get(cdn_file))
        .with_state(cdn.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (cdn, format!("http://127.0.0.1:{port}"))
}

/// Configuration rooted in `dir` and pointed at the fake vendor.
pub fn test_config(dir: &std::path::Path, vendor: &Url) -> AppConfig {
    AppConfig {
        config_file: dir.join("config.json"),
        cache_dir: dir.join("media_cache"),
        api_base_override: Some(vendor.clone()),
        ..AppConfig::default()
    }
}
