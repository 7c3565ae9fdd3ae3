use actix_web::{http::StatusCode, test, App};
use chrono::{Duration, Utc};
use order_sync_engine::{
    db_types::{OperationId, OrderId, RemoteOperationStatus, SyncState},
    test_utils::prepare_test_db,
    traits::{OrderDetails, RemoteOperation},
};

use super::{
    helpers::{issue_token, order_json, post_webhook, test_api, wait_for_state},
    mocks::{MockFinOps, MockMarketplace},
};
use crate::routes::health;

const VALIDATE_1111: &str = "/v1/products/PRD-1111-1111/orders/validate";

fn valid_token() -> String {
    issue_token("s1", "PRD-1111-1111", Utc::now() + Duration::minutes(5))
}

fn order_details(order_id: &str) -> OrderDetails {
    OrderDetails {
        order_id: order_id.into(),
        product_id: "PRD-1111-1111".into(),
        status: "Draft".into(),
        order_type: "Purchase".into(),
        organization_name: Some("Acme".into()),
        currency: Some("USD".into()),
        admin_contact: Some("jo@acme.test".into()),
    }
}

/// Mocks that expect exactly one operation to be created for `order_id`.
fn mocks_for_one_operation(order_id: &'static str) -> (MockFinOps, MockMarketplace) {
    let mut marketplace = MockMarketplace::new();
    marketplace.expect_fetch_order().times(1).returning(move |_| Ok(order_details(order_id)));
    let mut finops = MockFinOps::new();
    finops.expect_find_operation_for_order().times(1).returning(|_| Ok(None));
    finops.expect_create_operation().times(1).returning(|req| {
        assert_eq!(req.currency, "USD");
        Ok(RemoteOperation {
            id: OperationId::from("OP-1"),
            status: RemoteOperationStatus::Pending,
            error_message: None,
        })
    });
    (finops, marketplace)
}

#[actix_web::test]
async fn health_check() {
    let _ = env_logger::try_init().ok();
    let app = test::init_service(App::new().service(health)).await;
    let req = test::TestRequest::get().uri("/health").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[actix_web::test]
async fn validated_webhook_moves_draft_order_to_processing() {
    let (db, _dir) = prepare_test_db().await;
    let (finops, marketplace) = mocks_for_one_operation("ORD-1");
    let api = test_api(db, finops, marketplace);
    let token = valid_token();
    let (status, body) =
        post_webhook(api.clone(), VALIDATE_1111, Some(&token), &order_json("ORD-1", "PRD-1111-1111")).await;
    assert_eq!(status, StatusCode::ACCEPTED, "{body}");
    assert_eq!(body, r#"{"success":true,"message":"Order ORD-1 accepted for validation"}"#);

    let order = wait_for_state(&api, "ORD-1", SyncState::Processing).await;
    assert_eq!(order.operation_id, Some(OperationId::from("OP-1")));
    assert!(order.due_date.is_some());
    let transitions = api.fetch_transitions(&OrderId::from("ORD-1")).await.unwrap();
    let steps = transitions.iter().map(|t| (t.from_state, t.to_state)).collect::<Vec<_>>();
    assert_eq!(steps, vec![
        (SyncState::Draft, SyncState::Validating),
        (SyncState::Validating, SyncState::Processing)
    ]);
}

#[actix_web::test]
async fn duplicate_webhooks_create_one_operation() {
    let (db, _dir) = prepare_test_db().await;
    let (finops, marketplace) = mocks_for_one_operation("ORD-3");
    let api = test_api(db, finops, marketplace);
    let token = valid_token();
    let body = order_json("ORD-3", "PRD-1111-1111");
    let (status, _) = post_webhook(api.clone(), VALIDATE_1111, Some(&token), &body).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    wait_for_state(&api, "ORD-3", SyncState::Processing).await;

    let (status, response) = post_webhook(api.clone(), VALIDATE_1111, Some(&token), &body).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert!(response.contains("Duplicate webhook for order ORD-3 ignored"), "{response}");
    let transitions = api.fetch_transitions(&OrderId::from("ORD-3")).await.unwrap();
    assert_eq!(transitions.len(), 2);
}

#[actix_web::test]
async fn unknown_product_is_rejected_without_storing_anything() {
    let (db, _dir) = prepare_test_db().await;
    let api = test_api(db, MockFinOps::new(), MockMarketplace::new());
    let body = order_json("ORD-1", "PRD-9999-9999");
    let path = "/v1/products/PRD-9999-9999/orders/validate";
    for token in [
        Some(issue_token("s9", "PRD-9999-9999", Utc::now() + Duration::minutes(5))),
        Some(valid_token()),
        None,
    ] {
        let (status, body) = post_webhook(api.clone(), path, token.as_deref(), &body).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{body}");
        assert!(body.contains("Unknown tenant: PRD-9999-9999"), "{body}");
    }
    assert!(api.fetch_order(&OrderId::from("ORD-1")).await.unwrap().is_none());
}

#[actix_web::test]
async fn missing_token_is_a_bad_request() {
    let (db, _dir) = prepare_test_db().await;
    let api = test_api(db, MockFinOps::new(), MockMarketplace::new());
    let (status, _) = post_webhook(api.clone(), VALIDATE_1111, None, &order_json("ORD-1", "PRD-1111-1111")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(api.fetch_order(&OrderId::from("ORD-1")).await.unwrap().is_none());
}

#[actix_web::test]
async fn expired_and_forged_tokens_are_unauthorized() {
    let (db, _dir) = prepare_test_db().await;
    let api = test_api(db, MockFinOps::new(), MockMarketplace::new());
    let body = order_json("ORD-1", "PRD-1111-1111");
    let expired = issue_token("s1", "PRD-1111-1111", Utc::now() - Duration::minutes(5));
    let (status, response) = post_webhook(api.clone(), VALIDATE_1111, Some(&expired), &body).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(response.contains("expired"), "{response}");
    let forged = issue_token("s2", "PRD-1111-1111", Utc::now() + Duration::minutes(5));
    let (status, _) = post_webhook(api.clone(), VALIDATE_1111, Some(&forged), &body).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(api.fetch_order(&OrderId::from("ORD-1")).await.unwrap().is_none());
}

#[actix_web::test]
async fn token_for_another_product_is_forbidden() {
    let (db, _dir) = prepare_test_db().await;
    let api = test_api(db, MockFinOps::new(), MockMarketplace::new());
    let token = issue_token("s1", "PRD-1111-1111", Utc::now() + Duration::minutes(5));
    let path = "/v1/products/PRD-2222-2222/orders/validate";
    let (status, _) = post_webhook(api.clone(), path, Some(&token), &order_json("ORD-1", "PRD-2222-2222")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(api.fetch_order(&OrderId::from("ORD-1")).await.unwrap().is_none());
}

#[actix_web::test]
async fn payload_for_another_product_is_forbidden() {
    let (db, _dir) = prepare_test_db().await;
    let api = test_api(db, MockFinOps::new(), MockMarketplace::new());
    let token = valid_token();
    let (status, _) =
        post_webhook(api.clone(), VALIDATE_1111, Some(&token), &order_json("ORD-1", "PRD-2222-2222")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(api.fetch_order(&OrderId::from("ORD-1")).await.unwrap().is_none());
}

#[actix_web::test]
async fn unparsable_payload_is_a_bad_request() {
    let (db, _dir) = prepare_test_db().await;
    let api = test_api(db, MockFinOps::new(), MockMarketplace::new());
    let token = valid_token();
    let (status, body) = post_webhook(api.clone(), VALIDATE_1111, Some(&token), r#"{"id": 12}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
}
