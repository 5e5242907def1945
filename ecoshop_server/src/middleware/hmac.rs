//! Signature checks for payment gateway callbacks.
//!
//! The gateway signs each callback with the base64-encoded HMAC-SHA256 of the raw request body, keyed with the
//! secret shared with the gateway (`ECOSHOP_GATEWAY_HMAC_SECRET`). The signature travels in a request header,
//! `X-Callback-Signature` unless configured otherwise.
//!
//! Routes wrapped in [`SignedCallbacks`] only ever see callbacks whose signature verified.

use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_http::h1;
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    error::{ErrorBadRequest, ErrorForbidden},
    web,
    Error,
};
use ecoshop_common::Secret;
use futures::future::LocalBoxFuture;
use log::{trace, warn};

use crate::helpers::verify_hmac;

struct CallbackSignature {
    header: String,
    secret: Secret<String>,
    // when false every request passes unchecked
    enforced: bool,
}

impl CallbackSignature {
    /// Verifies the request body against its signature header. The body is put back into the request afterwards
    /// so that the route handler can still read it.
    async fn check(&self, req: &mut ServiceRequest) -> Result<(), Error> {
        if !self.enforced {
            trace!("🔐️ Callback signature checks are disabled. Allowing request.");
            return Ok(());
        }
        let secret = self.secret.reveal();
        if secret.is_empty() {
            warn!("🔐️ No callback signing secret is configured, so no callback can be verified. Denying access.");
            return Err(ErrorForbidden("Callback signatures cannot be verified."));
        }
        let body = req.extract::<web::Bytes>().await.map_err(|e| {
            warn!("🔐️ Failed to extract request data: {e:?}");
            ErrorBadRequest("Failed to extract request data.")
        })?;
        let signature = req.headers().get(&self.header).ok_or_else(|| {
            warn!("🔐️ No signature found in {}. Denying access.", self.header);
            ErrorForbidden("No HMAC signature found.")
        })?;
        if !verify_hmac(secret, &body, signature.as_bytes()) {
            warn!("🔐️ Invalid callback signature. Denying access.");
            return Err(ErrorForbidden("Invalid HMAC signature."));
        }
        trace!("🔐️ Callback signature check ✅️");
        req.set_payload(replay_body(body));
        Ok(())
    }
}

fn replay_body(body: web::Bytes) -> Payload {
    let (_, mut payload) = h1::Payload::create(true);
    payload.unread_data(body);
    Payload::from(payload)
}

/// Middleware factory that rejects callbacks without a valid signature.
pub struct SignedCallbacks {
    signature: Rc<CallbackSignature>,
}

impl SignedCallbacks {
    pub fn new(header: &str, secret: Secret<String>, enforced: bool) -> Self {
        let signature = CallbackSignature { header: header.to_string(), secret, enforced };
        Self { signature: Rc::new(signature) }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SignedCallbacks
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = SignedCallbacksService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SignedCallbacksService { signature: Rc::clone(&self.signature), inner: Rc::new(service) }))
    }
}

pub struct SignedCallbacksService<S> {
    signature: Rc<CallbackSignature>,
    inner: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for SignedCallbacksService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(inner);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let signature = Rc::clone(&self.signature);
        let inner = Rc::clone(&self.inner);
        Box::pin(async move {
            signature.check(&mut req).await?;
            inner.call(req).await
        })
    }
}
