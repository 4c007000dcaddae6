use actix_web::{http::StatusCode, web, web::ServiceConfig};
use order_ingest_engine::{
    db_types::{Order, OrderId},
    stream::{MemoryOrderStream, StreamProducer},
    CacheError,
    StoreError,
};
use serde_json::Value;

use super::{
    helpers::{delete_request, get_request, mock_api, post_request, sample_order, MockOrderApi, ORDER_JSON},
    mocks::{MockCache, MockStore},
};
use crate::{
    data_objects::JsonResponse,
    routes::{health, EvictOrderRoute, OrderByIdRoute, SubmitOrderRoute},
};

const ORDER_PATH: &str = "/order/b563feb7b2b84b6test";

#[actix_web::test]
async fn health_check() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/health", |cfg| {
        cfg.service(health);
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
}

#[actix_web::test]
async fn fetch_order_from_cache() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_order_by_id().never();
    let mut cache = MockCache::new();
    cache.expect_get().times(1).returning(|_| Ok(Some(sample_order())));
    cache.expect_set().never();
    let (status, body) = get_request(ORDER_PATH, configure_lookup(mock_api(store, cache))).await;
    assert_eq!(status, StatusCode::OK);
    let order: Order = serde_json::from_str(&body).expect("response is an order");
    assert_eq!(order, sample_order());
}

#[actix_web::test]
async fn fetch_order_from_store_and_cache_it() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store
        .expect_fetch_order_by_id()
        .withf(|id| id.as_str() == "b563feb7b2b84b6test")
        .times(1)
        .returning(|_| Ok(Some(sample_order())));
    let mut cache = MockCache::new();
    cache.expect_get().times(1).returning(|_| Ok(None));
    cache.expect_set().withf(|id, order, _| id == &order.order_id).times(1).returning(|_, _, _| Ok(()));
    let (status, body) = get_request(ORDER_PATH, configure_lookup(mock_api(store, cache))).await;
    assert_eq!(status, StatusCode::OK);
    let order: Order = serde_json::from_str(&body).expect("response is an order");
    assert_eq!(order.order_id, OrderId::from("b563feb7b2b84b6test"));
}

#[actix_web::test]
async fn cache_failure_falls_back_to_store() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_order_by_id().times(1).returning(|_| Ok(Some(sample_order())));
    let mut cache = MockCache::new();
    cache.expect_get().returning(|_| Err(CacheError::Unavailable("connection refused".into())));
    cache.expect_set().returning(|_, _, _| Err(CacheError::Unavailable("connection refused".into())));
    let (status, body) = get_request(ORDER_PATH, configure_lookup(mock_api(store, cache))).await;
    assert_eq!(status, StatusCode::OK);
    let order: Order = serde_json::from_str(&body).expect("response is an order");
    assert_eq!(order, sample_order());
}

#[actix_web::test]
async fn fetch_missing_order() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_order_by_id().returning(|_| Ok(None));
    let mut cache = MockCache::new();
    cache.expect_get().returning(|_| Ok(None));
    cache.expect_set().never();
    let (status, body) = get_request("/order/nosuchorder", configure_lookup(mock_api(store, cache))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The data was not found. Order nosuchorder does not exist"}"#);
}

#[actix_web::test]
async fn fetch_order_when_store_is_down() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_order_by_id().returning(|_| Err(StoreError::DatabaseError("database is locked".into())));
    let mut cache = MockCache::new();
    cache.expect_get().returning(|_| Ok(None));
    let (status, body) = get_request(ORDER_PATH, configure_lookup(mock_api(store, cache))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let err: Value = serde_json::from_str(&body).expect("error body is JSON");
    assert!(err["error"].as_str().is_some_and(|s| s.contains("database is locked")));
}

#[actix_web::test]
async fn fetch_order_with_invalid_id() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_order_by_id().never();
    let mut cache = MockCache::new();
    cache.expect_get().never();
    let (status, body) = get_request("/order/bad-id", configure_lookup(mock_api(store, cache))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.starts_with(r#"{"error":"Could not read request path"#));
}

#[actix_web::test]
async fn evict_order() {
    let _ = env_logger::try_init().ok();
    let store = MockStore::new();
    let mut cache = MockCache::new();
    cache.expect_delete().withf(|id| id.as_str() == "b563feb7b2b84b6test").times(1).returning(|_| Ok(()));
    let (status, body) =
        delete_request("/order/b563feb7b2b84b6test/cache", configure_lookup(mock_api(store, cache))).await;
    assert_eq!(status, StatusCode::OK);
    let response: JsonResponse = serde_json::from_str(&body).expect("response is JSON");
    assert!(response.success);
}

#[actix_web::test]
async fn submit_order_is_queued() {
    let _ = env_logger::try_init().ok();
    let stream = MemoryOrderStream::new();
    let producer = stream.producer();
    let (status, body) = post_request("/orders", ORDER_JSON, |cfg| {
        cfg.service(SubmitOrderRoute::<StreamProducer>::new()).app_data(web::Data::new(producer));
    })
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let response: JsonResponse = serde_json::from_str(&body).expect("response is JSON");
    assert_eq!(response.message, "Order queued at offset 0");
    assert_eq!(stream.len().await, 1);
}

#[actix_web::test]
async fn submit_malformed_order() {
    let _ = env_logger::try_init().ok();
    let stream = MemoryOrderStream::new();
    let producer = stream.producer();
    let (status, body) = post_request("/orders", "{ this is not json", |cfg| {
        cfg.service(SubmitOrderRoute::<StreamProducer>::new()).app_data(web::Data::new(producer));
    })
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.starts_with(r#"{"error":"Could not read request body"#));
    assert!(stream.is_empty().await);
}

#[actix_web::test]
async fn submit_after_shutdown_is_unavailable() {
    let _ = env_logger::try_init().ok();
    let stream = MemoryOrderStream::new();
    let producer = stream.producer();
    producer.close().await;
    let (status, body) = post_request("/orders", ORDER_JSON, |cfg| {
        cfg.service(SubmitOrderRoute::<StreamProducer>::new()).app_data(web::Data::new(producer));
    })
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body.starts_with(r#"{"error":"The server is shutting down"#));
    assert!(stream.is_empty().await);
}

fn configure_lookup(api: MockOrderApi) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.service(OrderByIdRoute::<MockStore, MockCache>::new())
            .service(EvictOrderRoute::<MockStore, MockCache>::new())
            .app_data(web::Data::new(api));
    }
}
