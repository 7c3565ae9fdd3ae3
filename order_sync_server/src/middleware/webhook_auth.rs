//! Webhook authentication middleware for Actix Web.
//!
//! Wrap any resource that receives marketplace webhooks with this middleware. The resource path must contain a
//! `{product_id}` segment, and a [`TenantRegistry`] must be registered as app data.
//!
//! The token is read from the `Authorization: Bearer <token>` header and checked with
//! [`crate::webhook_auth::authenticate`] against the raw request body. On success the [`ValidatedEvent`] is stored in
//! the request extensions, and the body is put back so that the handler can read it again.
use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_http::h1;
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    error::{ErrorBadRequest, ErrorInternalServerError},
    http::header::AUTHORIZATION,
    web,
    Error,
    HttpMessage,
};
use chrono::Utc;
use futures::future::LocalBoxFuture;
use log::*;

use crate::{
    errors::ServerError,
    tenants::TenantRegistry,
    webhook_auth::{authenticate, ValidatedEvent},
};

#[derive(Default)]
pub struct WebhookAuthFactory;

impl WebhookAuthFactory {
    pub fn new() -> Self {
        Self
    }
}

impl<S, B> Transform<S, ServiceRequest> for WebhookAuthFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = WebhookAuthService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(WebhookAuthService { service: Rc::new(service) }))
    }
}

pub struct WebhookAuthService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for WebhookAuthService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        Box::pin(async move {
            let registry = req.app_data::<web::Data<TenantRegistry>>().cloned().ok_or_else(|| {
                error!("🔐️ No tenant registry is configured for this route. Denying access.");
                ErrorInternalServerError("Webhook authentication is not configured.")
            })?;
            let tenant = req.match_info().get("product_id").unwrap_or_default().to_string();
            trace!("🔐️ Authenticating webhook for {tenant}");
            // Unknown tenants are rejected before the request is looked at any further
            registry.resolve(&tenant).map_err(|e| {
                warn!("🔐️ Webhook for unknown tenant '{tenant}' rejected");
                ServerError::from(e)
            })?;
            let token = bearer_token(&req).ok_or_else(|| {
                warn!("🔐️ No bearer token found in webhook for {tenant}. Denying access.");
                ServerError::CouldNotDeserializeAuthToken
            })?;
            let data = req.extract::<web::Bytes>().await.map_err(|e| {
                warn!("🔐️ Failed to extract request data: {e:?}");
                ErrorBadRequest("Failed to extract request data.")
            })?;
            let event = authenticate(&registry, &tenant, &token, data.as_ref(), Utc::now()).map_err(|e| {
                warn!("🔐️ Webhook for {tenant} rejected. {e}");
                ServerError::from(e)
            })?;
            debug!("🔐️ Webhook for {tenant} authenticated ✅️ (payload hash {})", event.payload_hash);
            req.extensions_mut().insert::<ValidatedEvent>(event);
            req.set_payload(bytes_to_payload(data));
            service.call(req).await
        })
    }
}

fn bearer_token(req: &ServiceRequest) -> Option<String> {
    let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ").map(str::trim)?;
    (!token.is_empty()).then(|| token.to_string())
}

fn bytes_to_payload(buf: web::Bytes) -> Payload {
    let (_, mut pl) = h1::Payload::create(true);
    pl.unread_data(buf);
    Payload::from(pl)
}
