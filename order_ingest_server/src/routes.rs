//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Anything that waits on I/O (the store, the cache, the stream) must
//! be awaited, never blocked on.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use order_ingest_engine::{db_types::OrderId, stream::OrderPublisher, OrderCache, OrderService, OrderStore};
use serde_json::Value;

use crate::{data_objects::JsonResponse, errors::ServerError};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(order_by_id => Get "/order/{order_uid}" impl OrderStore, OrderCache);
/// Look up a single order by its `order_uid`.
///
/// The order is served from the cache when possible. On a miss, it is read from the order database and cached on the
/// way out.
///
/// * `200` with the full order JSON if the order exists.
/// * `404` if no order with this id has been ingested.
/// * `400` if the id is not alphanumeric.
/// * `500` if the order database could not be read.
pub async fn order_by_id<S, C>(
    path: web::Path<String>,
    api: web::Data<OrderService<S, C>>,
) -> Result<HttpResponse, ServerError>
where
    S: OrderStore,
    C: OrderCache,
{
    let order_id = path.into_inner();
    debug!("💻️ GET order_by_id({order_id})");
    api.validator().validate_order_id(&order_id).map_err(|e| ServerError::InvalidRequestPath(e.to_string()))?;
    let order_id = OrderId::from(order_id);
    match api.get_order_by_id(&order_id).await? {
        Some(order) => Ok(HttpResponse::Ok().json(order)),
        None => Err(ServerError::NoRecordFound(format!("Order {order_id} does not exist"))),
    }
}

route!(evict_order => Delete "/order/{order_uid}/cache" impl OrderStore, OrderCache);
/// Drop an order from the cache. The stored order is unaffected and will be re-cached on the next lookup.
pub async fn evict_order<S, C>(
    path: web::Path<String>,
    api: web::Data<OrderService<S, C>>,
) -> Result<HttpResponse, ServerError>
where
    S: OrderStore,
    C: OrderCache,
{
    let order_id = path.into_inner();
    debug!("💻️ DELETE evict_order({order_id})");
    api.validator().validate_order_id(&order_id).map_err(|e| ServerError::InvalidRequestPath(e.to_string()))?;
    let order_id = OrderId::from(order_id);
    api.evict(&order_id).await.map_err(|e| ServerError::BackendError(e.to_string()))?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Order {order_id} evicted from the cache"))))
}

route!(submit_order => Post "/orders" impl OrderPublisher);
/// Publish an order onto the order stream.
///
/// The body is forwarded verbatim. It only has to be JSON; the order itself is validated by the ingestion consumer,
/// so a `202` means the order was queued, not that it was accepted.
pub async fn submit_order<P: OrderPublisher>(
    body: web::Bytes,
    producer: web::Data<P>,
) -> Result<HttpResponse, ServerError> {
    let value = serde_json::from_slice::<Value>(&body).map_err(|e| {
        debug!("💻️ Rejected order submission. {e}");
        ServerError::InvalidRequestBody(e.to_string())
    })?;
    let key = value.get("order_uid").and_then(Value::as_str).map(String::from);
    debug!("💻️ POST submit_order({})", key.as_deref().unwrap_or("<no order_uid>"));
    let offset = producer.publish(key, body.to_vec()).await?;
    Ok(HttpResponse::Accepted().json(JsonResponse::success(format!("Order queued at offset {offset}"))))
}
