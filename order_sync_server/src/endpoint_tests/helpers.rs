use std::{collections::HashMap, sync::Arc, time::Duration};

use actix_web::{
    http::{
        header::{ContentType, AUTHORIZATION},
        StatusCode,
    },
    test,
    test::TestRequest,
    web,
    App,
};
use chrono::{DateTime, Utc};
use finops_tools::FinOpsConfig;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use order_sync_engine::{
    db_types::{Order, OrderId, SyncState},
    events::EventProducers,
    traits::{FinOpsOperations, MarketplaceOrders},
    OrderSyncApi,
    RetryPolicy,
    SqliteDatabase,
};
use osb_common::Secret;

use crate::{
    routes::{health, ValidateOrderRoute},
    tenants::TenantRegistry,
    webhook_auth::WebhookClaims,
};

pub type TestSyncApi<F, M> = OrderSyncApi<SqliteDatabase, F, M>;

/// Signs a webhook token the way the marketplace does. DO NOT re-use these secrets anywhere.
pub fn issue_token(secret: &str, product_id: &str, expiry: DateTime<Utc>) -> String {
    let claims = WebhookClaims {
        product_id: product_id.to_string(),
        webhook_id: Some("WH-1".to_string()),
        iat: Utc::now().timestamp(),
        exp: expiry.timestamp(),
    };
    jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .expect("Failed to sign token")
}

/// `PRD-1111-1111` signs with `s1` and `PRD-2222-2222` with `s2`.
pub fn test_registry() -> TenantRegistry {
    let products = vec!["PRD-1111-1111".to_string(), "PRD-2222-2222".to_string()];
    let secrets = [("PRD-1111-1111", "s1"), ("PRD-2222-2222", "s2")]
        .into_iter()
        .map(|(p, s)| (p.to_string(), Secret::new(s.to_string())))
        .collect::<HashMap<_, _>>();
    TenantRegistry::new(&products, &secrets, FinOpsConfig::default()).expect("Invalid test registry")
}

pub fn test_api<F, M>(db: SqliteDatabase, finops: F, marketplace: M) -> Arc<TestSyncApi<F, M>> {
    let retry = RetryPolicy::new(Duration::from_millis(1), Duration::from_millis(4), 3);
    Arc::new(OrderSyncApi::new(db, finops, marketplace, EventProducers::default()).with_retry_policy(retry))
}

pub fn order_json(order_id: &str, product_id: &str) -> String {
    serde_json::json!({
        "id": order_id,
        "type": "Purchase",
        "status": "Draft",
        "product": { "id": product_id },
        "parameters": {
            "ordering": [
                { "externalId": "organizationName", "value": "Acme" },
                { "externalId": "currency", "value": "USD" },
                { "externalId": "adminContact", "value": { "email": "jo@acme.test" } }
            ]
        }
    })
    .to_string()
}

/// Posts `body` to `path` on an app with the health and webhook routes. Errors raised by middleware are converted
/// into their responses, so that every outcome is a status and a body.
pub async fn post_webhook<F, M>(
    api: Arc<TestSyncApi<F, M>>,
    path: &str,
    token: Option<&str>,
    body: &str,
) -> (StatusCode, String)
where
    F: FinOpsOperations + 'static,
    M: MarketplaceOrders + 'static,
{
    let app = App::new()
        .app_data(web::Data::from(api))
        .app_data(web::Data::new(test_registry()))
        .service(health)
        .service(
            web::scope("/v1/products/{product_id}")
                .service(ValidateOrderRoute::<SqliteDatabase, F, M>::new()),
        );
    let service = test::init_service(app).await;
    let mut req = TestRequest::post().uri(path).insert_header(ContentType::json()).set_payload(body.to_string());
    if let Some(token) = token {
        req = req.insert_header((AUTHORIZATION, format!("Bearer {token}")));
    }
    match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => {
            let status = res.status();
            let body = test::read_body(res).await;
            (status, String::from_utf8_lossy(&body).into_owned())
        },
        Err(e) => (e.error_response().status(), e.to_string()),
    }
}

/// Waits up to a second for the order to reach `state`, and returns it.
pub async fn wait_for_state<F, M>(api: &TestSyncApi<F, M>, order_id: &str, state: SyncState) -> Order
where
    F: FinOpsOperations,
    M: MarketplaceOrders,
{
    let order_id = OrderId::from(order_id);
    let mut order = None;
    for _ in 0..100 {
        order = api.fetch_order(&order_id).await.expect("Database error");
        if order.as_ref().map(|o| o.state == state).unwrap_or(false) {
            break;
        }
        actix_web::rt::time::sleep(Duration::from_millis(10)).await;
    }
    let order = order.expect("Order was not stored");
    assert_eq!(order.state, state, "Order {order_id} did not reach {state}");
    order
}
