use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use inventario_client::{ApiConfig, ClientError, InventoryClient};
use inventario_types::{Asset, AssetFields, FilterOptions, InventoryQuery, Role, Session};
use serde_json::{Value, json};

#[derive(Default)]
struct Backend {
    assets: Vec<Asset>,
    next_id: i64,
    last_put: Option<Value>,
}

type Shared = Arc<Mutex<Backend>>;

async fn list(State(db): State<Shared>, Query(q): Query<InventoryQuery>) -> Json<Vec<Asset>> {
    let db = db.lock().unwrap();
    Json(
        db.assets
            .iter()
            .skip(q.skip as usize)
            .take(q.limit as usize)
            .cloned()
            .collect(),
    )
}

async fn create(State(db): State<Shared>, Json(fields): Json<AssetFields>) -> Json<Asset> {
    let mut db = db.lock().unwrap();
    db.next_id += 1;
    let asset = Asset::new(db.next_id, fields);
    db.assets.push(asset.clone());
    Json(asset)
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({"detail": "Activo no encontrado"}))).into_response()
}

async fn read(State(db): State<Shared>, Path(id): Path<i64>) -> Response {
    let db = db.lock().unwrap();
    match db.assets.iter().find(|a| a.id == id) {
        Some(a) => Json(a.clone()).into_response(),
        None => not_found(),
    }
}

async fn update(State(db): State<Shared>, Path(id): Path<i64>, Json(body): Json<Value>) -> Response {
    let mut db = db.lock().unwrap();
    let Ok(changes) = serde_json::from_value::<AssetFields>(body.clone()) else {
        return StatusCode::UNPROCESSABLE_ENTITY.into_response();
    };
    db.last_put = Some(body);
    match db.assets.iter_mut().find(|a| a.id == id) {
        Some(a) => {
            a.fields.apply(&changes);
            Json(a.clone()).into_response()
        }
        None => not_found(),
    }
}

async fn remove(State(db): State<Shared>, Path(id): Path<i64>) -> Response {
    let mut db = db.lock().unwrap();
    match db.assets.iter().position(|a| a.id == id) {
        Some(i) => Json(db.assets.remove(i)).into_response(),
        None => not_found(),
    }
}

async fn spawn_backend(records: i64) -> (SocketAddr, Shared) {
    let assets = (1..=records)
        .map(|i| {
            Asset::new(
                i,
                AssetFields {
                    name: Some(format!("Activo {i}")),
                    asset_type: Some("Información".into()),
                    owner: Some("admin".into()),
                    ..Default::default()
                },
            )
        })
        .collect();
    let db: Shared = Arc::new(Mutex::new(Backend { assets, next_id: records, last_put: None }));
    let app = Router::new()
        .route("/inventario/", get(list).post(create))
        .route("/inventario/{id}", get(read).put(update).delete(remove))
        .with_state(db.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, db)
}

fn client_for(addr: SocketAddr) -> InventoryClient {
    InventoryClient::new(
        ApiConfig::new()
            .set_base_url(format!("http://{addr}"))
            .set_list_timeout_ms(2_000)
            .set_item_timeout_ms(2_000),
    )
}

/// An address nothing listens on.
async fn dead_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

#[tokio::test]
async fn test_first_page_of_five() {
    let (addr, _) = spawn_backend(5).await;
    let client = client_for(addr);
    let assets = client.list(InventoryQuery::new(0, 5)).await.unwrap();
    let ids: Vec<i64> = assets.iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_delete_then_refetch_excludes_id() {
    let (addr, _) = spawn_backend(5).await;
    let client = client_for(addr);
    let deleted = client.delete_validated(3).await.unwrap();
    assert_eq!(deleted.map(|a| a.id), Some(3));
    let ids: Vec<i64> = client.list_all().await.unwrap().iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![1, 2, 4, 5]);

    let err = client.get(3).await.unwrap_err();
    assert!(matches!(err, ClientError::Status { status: 404, .. }));
    assert_eq!(err.to_string(), "Activo no encontrado");
}

#[tokio::test]
async fn test_create_and_patch_round_trip() {
    let (addr, db) = spawn_backend(2).await;
    let client = client_for(addr);
    let created = client
        .create_validated(&AssetFields {
            name: Some("Servidor de correo".into()),
            asset_type: Some("Hardware".into()),
            owner: Some("admin".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(created.id, 3);

    let patched = client
        .patch(3, &AssetFields { process: Some("TI".into()), ..Default::default() })
        .await
        .unwrap();
    assert_eq!(patched.fields.process.as_deref(), Some("TI"));
    assert_eq!(patched.display_name(), "Servidor de correo");

    let sent = db.lock().unwrap().last_put.clone().unwrap();
    assert_eq!(sent, json!({"PROCESO": "TI"}));
}

#[tokio::test]
async fn test_validation_never_reaches_backend() {
    let client = client_for(dead_addr().await);
    let err = client.create_validated(&AssetFields::default()).await.unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));
    let err = client.delete_validated(0).await.unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));
}

#[tokio::test]
async fn test_delete_many_reports_each_id() {
    let (addr, _) = spawn_backend(3).await;
    let client = client_for(addr);
    let results = client.delete_many(&[1, 9, 2]).await;
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(ClientError::Status { status: 404, .. })));
    assert!(results[2].is_ok());
}

#[tokio::test]
async fn test_listing_counts_live_data() {
    let (addr, _) = spawn_backend(7).await;
    let client = client_for(addr);
    let listing = client.list_or_demo(InventoryQuery::new(5, 5)).await;
    assert!(!listing.demo_mode);
    assert_eq!(listing.items.len(), 2);
    assert_eq!(listing.total, 7);
    assert_eq!(listing.items[0].id, "6");
}

#[tokio::test]
async fn test_visible_listing_pages_after_filtering() {
    let (addr, db) = spawn_backend(6).await;
    let office = Role::InternalControl.to_string();
    for asset in db.lock().unwrap().assets.iter_mut().filter(|a| a.id % 2 == 0) {
        asset.fields.owner = Some(office.clone());
    }
    let client = client_for(addr);

    let session = Session::new("luis", Role::InternalControl);
    let listing = client.list_visible(InventoryQuery::new(1, 1), &session, &FilterOptions::default()).await;
    let ids: Vec<&str> = listing.items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, ["4"]);
    assert_eq!(listing.total, 3);
    assert!(!listing.demo_mode);

    let admin = Session::new("ana", Role::Admin);
    let filters = FilterOptions { search_term: "activo 5".into(), ..Default::default() };
    let listing = client.list_visible(InventoryQuery::new(0, 1), &admin, &filters).await;
    assert_eq!(listing.total, 1);
    assert_eq!(listing.items[0].id, "5");
}

#[tokio::test]
async fn test_unreachable_backend_serves_demo_page() {
    let client = client_for(dead_addr().await);
    let listing = client.list_or_demo(InventoryQuery::new(0, 4)).await;
    assert!(listing.demo_mode);
    assert_eq!(listing.items.len(), 4);
    assert_eq!(listing.total, 6);
    assert!(listing.warning.is_some());

    let err = client.list(InventoryQuery::default()).await.unwrap_err();
    assert!(matches!(err, ClientError::Exhausted { attempts: 2, .. }));
}

#[tokio::test]
async fn test_probe_reports_count() {
    let (addr, _) = spawn_backend(9).await;
    let report = client_for(addr).probe(5).await;
    assert!(report.success);
    assert_eq!(report.count, 5);
    assert!(report.error.is_none());

    let report = client_for(dead_addr().await).probe(5).await;
    assert!(!report.success);
    assert!(report.error.is_some());
}
