use actix_web::{
    body::MessageBody,
    http::StatusCode,
    test,
    test::TestRequest,
    web::{Bytes, ServiceConfig},
    App,
};
use log::debug;
use order_ingest_engine::{
    db_types::Order,
    service_objects::OrderServiceConfig,
    OrderService,
    OrderValidator,
};

use crate::endpoint_tests::mocks::{MockCache, MockStore};

pub type MockOrderApi = OrderService<MockStore, MockCache>;

pub fn mock_api(store: MockStore, cache: MockCache) -> MockOrderApi {
    OrderService::new(store, cache, OrderValidator::new(), OrderServiceConfig::default())
}

pub fn sample_order() -> Order {
    serde_json::from_str(ORDER_JSON).expect("ORDER_JSON is a valid order")
}

pub async fn get_request<F>(path: &str, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    call(TestRequest::get().uri(path), configure).await
}

pub async fn post_request<F>(path: &str, body: impl Into<Bytes>, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let req = TestRequest::post().uri(path).insert_header(("content-type", "application/json")).set_payload(body);
    call(req, configure).await
}

pub async fn delete_request<F>(path: &str, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    call(TestRequest::delete().uri(path), configure).await
}

async fn call<F>(req: TestRequest, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let body = res.into_body().try_into_bytes().map(|b| String::from_utf8_lossy(&b).into_owned()).unwrap_or_default();
    (status, body)
}

pub const ORDER_JSON: &str = r#"{
    "order_uid": "b563feb7b2b84b6test",
    "track_number": "WBILMTESTTRACK",
    "entry": "WBIL",
    "delivery": {
        "name": "Test Testov",
        "phone": "+9720000000",
        "zip": "2639809",
        "city": "Kiryat Mozkin",
        "address": "Ploshad Mira 15",
        "region": "Kraiot",
        "email": "test@gmail.com"
    },
    "payment": {
        "transaction": "b563feb7b2b84b6test",
        "request_id": "",
        "currency": "USD",
        "provider": "wbpay",
        "amount": 1817,
        "payment_dt": 1637907727,
        "bank": "alpha",
        "delivery_cost": 1500,
        "goods_total": 317,
        "custom_fee": 0
    },
    "items": [
        {
            "chrt_id": 9934930,
            "track_number": "WBILMTESTTRACK",
            "price": 453,
            "rid": "ab4219087a764ae0btest",
            "name": "Mascaras",
            "sale": 30,
            "size": "0",
            "total_price": 317,
            "nm_id": 2389212,
            "brand": "Vivienne Sabo",
            "status": 202
        }
    ],
    "locale": "en",
    "internal_signature": "",
    "customer_id": "test",
    "delivery_service": "meest",
    "shardkey": "9",
    "sm_id": 99,
    "date_created": "2021-11-26T06:22:19Z",
    "oof_shard": "1"
}"#;
