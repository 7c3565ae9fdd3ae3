//! Request handler definitions
//!
//! Define each route and its handler here. Handlers must not block the worker thread: anything that waits on I/O is
//! an async call, and work that outlives the request is spawned onto the runtime.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use marketplace_tools::MarketplaceOrder;
use order_sync_engine::{
    db_types::WebhookEvent,
    traits::{FinOpsOperations, MarketplaceOrders, SyncDatabase},
    OrderSyncApi,
    WebhookOutcome,
};

use crate::{
    data_objects::JsonResponse,
    errors::{AuthError, ServerError},
    webhook_auth::ValidatedEvent,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ where authenticated) => {
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
                    .to($name::< $( [< T $bounds:camel >], )+>)
                    .wrap($crate::middleware::WebhookAuthFactory::new());
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Webhooks  ----------------------------------------------------
route!(validate_order => Post "/orders/validate" impl SyncDatabase, FinOpsOperations, MarketplaceOrders where authenticated);
/// Route handler for the draft-validation webhook.
///
/// Mounted under `/v1/products/{product_id}`. The request has already been authenticated by the
/// [`crate::middleware::WebhookAuthFactory`] middleware, so the body is known to come from the tenant in the path.
///
/// The event is recorded and the order moved to `Validating` before the response is sent. Creating the FinOps
/// operation happens afterwards, on a separate task; any failure there is picked up again by the poller.
///
/// Replies with `202 Accepted` for new and duplicate deliveries alike.
pub async fn validate_order<B, F, M>(
    event: web::ReqData<ValidatedEvent>,
    api: web::Data<OrderSyncApi<B, F, M>>,
) -> Result<HttpResponse, ServerError>
where
    B: SyncDatabase + 'static,
    F: FinOpsOperations + 'static,
    M: MarketplaceOrders + 'static,
{
    let event = event.into_inner();
    let order = serde_json::from_slice::<MarketplaceOrder>(&event.payload).map_err(|e| {
        debug!("💻️ Could not deserialize webhook payload for {}. {e}", event.product_id);
        ServerError::InvalidRequestBody(e.to_string())
    })?;
    if order.product.id != event.product_id {
        warn!("💻️ Webhook at {} carries order {} for product {}", event.product_id, order.id, order.product.id);
        return Err(AuthError::TenantMismatch { tenant: event.product_id, claimed: order.product.id }.into());
    }
    trace!("💻️ Received draft validation webhook for order {} (status {})", order.id, order.status);
    let webhook = WebhookEvent {
        product_id: event.product_id.into(),
        order_id: order.id.into(),
        payload_hash: event.payload_hash,
        webhook_id: event.webhook_id,
        received_at: event.received_at,
    };
    let outcome = api.accept_webhook_event(webhook).await?;
    let order_id = outcome.order().order_id.clone();
    let message = match &outcome {
        WebhookOutcome::Accepted(order) => {
            let api = api.into_inner();
            let id = order.order_id.clone();
            actix_web::rt::spawn(async move {
                match api.process_order(&id).await {
                    Ok(result) if result.changed() => {
                        info!("💻️ Order {id} moved from {} to {}", result.previous, result.order.state)
                    },
                    Ok(_) => debug!("💻️ Order {id} was not changed after validation"),
                    Err(e) => warn!("💻️ Order {id} could not be processed after validation. The poller will retry. {e}"),
                }
            });
            format!("Order {order_id} accepted for validation")
        },
        WebhookOutcome::Duplicate(_) => format!("Duplicate webhook for order {order_id} ignored"),
        WebhookOutcome::AlreadyProgressed(order) => format!("Order {order_id} is already {}", order.state),
    };
    info!("💻️ {message}");
    Ok(HttpResponse::Accepted().json(JsonResponse::success(message)))
}
