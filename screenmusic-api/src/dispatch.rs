//! Generic CRUD dispatcher
//!
//! One [`Dispatcher`] is created per request, before the handler body runs
//! (it is an axum extractor). Creating it mints the correlation id through the
//! [`RequestLog`], registers it in the [`CorrelationRegistry`] and opens the
//! request span. Each capability call then goes through [`Dispatcher::respond`]:
//!
//! 1. business fault → incidents envelope (call notifications ignored)
//! 2. unexpected fault → fault envelope (call notifications ignored)
//! 3. otherwise the call's notifications join the request accumulator
//! 4. any negative in the accumulator → rejected envelope
//! 5. else the value is serialized into the success envelope; a serialization
//!    failure becomes a fault envelope
//!
//! The accumulator lives as long as the dispatcher, so sequential calls on
//! one dispatcher see each other's notifications.

use std::fmt;
use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use screenmusic_common::correlation::CorrelationGuard;
use screenmusic_common::{
    CorrelationId, CorrelationRegistry, CrudService, DispatcherId, Notifications, Reply,
    RequestContext, RequestLog, ServiceFault,
};
use tracing::{debug, error, info_span, warn, Instrument, Span};

use crate::envelope::Envelope;

/// Response header carrying the request's correlation id
pub static CORRELATION_HEADER: HeaderName = HeaderName::from_static("x-correlation-id");

/// Everything a dispatcher needs for one resource
pub struct ResourceState<S> {
    pub service: Arc<S>,
    pub request_log: Arc<dyn RequestLog>,
    pub registry: CorrelationRegistry,
}

impl<S> Clone for ResourceState<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            request_log: Arc::clone(&self.request_log),
            registry: self.registry.clone(),
        }
    }
}

impl<S: CrudService> ResourceState<S> {
    pub fn new(
        service: S,
        request_log: Arc<dyn RequestLog>,
        registry: CorrelationRegistry,
    ) -> Self {
        Self {
            service: Arc::new(service),
            request_log,
            registry,
        }
    }
}

/// Per-request dispatcher over one capability service
pub struct Dispatcher<S> {
    service: Arc<S>,
    request_log: Arc<dyn RequestLog>,
    context: RequestContext,
    notifications: Notifications,
    span: Span,
    _slot: CorrelationGuard,
}

impl<S: CrudService> Dispatcher<S> {
    /// Request setup: mint and register the correlation id
    ///
    /// Any failure here is reported as a fault envelope.
    pub async fn begin(
        state: &ResourceState<S>,
        method: &str,
        path: &str,
    ) -> Result<Self, Envelope> {
        Self::begin_as(state, DispatcherId::generate(), method, path).await
    }

    async fn begin_as(
        state: &ResourceState<S>,
        dispatcher_id: DispatcherId,
        method: &str,
        path: &str,
    ) -> Result<Self, Envelope> {
        let correlation_id = state
            .request_log
            .begin_request(method, path)
            .await
            .map_err(|e| {
                error!(method, path, "Failed to begin request: {}", e);
                Envelope::fault(e.to_string())
            })?;

        let slot = match state.registry.register(dispatcher_id, correlation_id) {
            Ok(slot) => slot,
            Err(e) => {
                error!(%correlation_id, "Failed to register correlation id: {}", e);
                let envelope = Envelope::fault(e.to_string());
                // The request is already logged; close it with the failure status
                if let Err(e) = state
                    .request_log
                    .finish_request(correlation_id, envelope.status().as_u16())
                    .await
                {
                    warn!(%correlation_id, "Failed to record request completion: {}", e);
                }
                return Err(envelope);
            }
        };

        let span = info_span!(
            "request",
            %correlation_id,
            %dispatcher_id,
            method,
            path
        );

        Ok(Self {
            service: Arc::clone(&state.service),
            request_log: Arc::clone(&state.request_log),
            context: RequestContext {
                dispatcher_id,
                correlation_id,
            },
            notifications: Notifications::new(),
            span,
            _slot: slot,
        })
    }

    pub fn context(&self) -> &RequestContext {
        &self.context
    }

    pub fn correlation_id(&self) -> CorrelationId {
        self.context.correlation_id
    }

    /// Notifications accumulated by every completed call so far
    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    pub async fn get_all(&mut self) -> Envelope {
        let reply = self
            .service
            .get_all(&self.context)
            .instrument(self.span.clone())
            .await;
        self.respond(reply, StatusCode::OK)
    }

    pub async fn get(&mut self, id: i64) -> Envelope {
        let reply = self
            .service
            .get(&self.context, id)
            .instrument(self.span.clone())
            .await;
        self.respond(reply, StatusCode::OK)
    }

    pub async fn get_by_identifier(&mut self, identifier: S::IdentifierInput) -> Envelope {
        let reply = self
            .service
            .get_by_identifier(&self.context, identifier)
            .instrument(self.span.clone())
            .await;
        self.respond(reply, StatusCode::OK)
    }

    pub async fn create(&mut self, input: S::CreateInput) -> Envelope {
        let reply = self
            .service
            .create(&self.context, input)
            .instrument(self.span.clone())
            .await;
        self.respond(reply, StatusCode::CREATED)
    }

    pub async fn update(&mut self, id: i64, input: S::UpdateInput) -> Envelope {
        let reply = self
            .service
            .update(&self.context, id, input)
            .instrument(self.span.clone())
            .await;
        self.respond(reply, StatusCode::OK)
    }

    pub async fn delete(&mut self, id: i64) -> Envelope {
        let reply = self
            .service
            .delete(&self.context, id)
            .instrument(self.span.clone())
            .await;
        self.respond(reply, StatusCode::OK)
    }

    /// Reconcile one completed call into an envelope
    pub fn respond<T: Serialize>(&mut self, reply: Reply<T>, status: StatusCode) -> Envelope {
        let _entered = self.span.enter();
        let Reply {
            outcome,
            notifications,
        } = reply;

        let value = match outcome {
            Ok(value) => value,
            Err(ServiceFault::Business(incidents)) => {
                warn!(incidents = incidents.len(), "Business fault");
                return Envelope::Incidents(incidents);
            }
            Err(ServiceFault::Unexpected(message)) => {
                error!("Capability call failed: {}", message);
                return Envelope::Fault(message);
            }
        };

        self.notifications.extend(notifications);

        let negatives = self.notifications.negatives();
        if !negatives.is_empty() {
            debug!(negatives = negatives.len(), "Call rejected by notifications");
            return Envelope::Rejected(negatives);
        }

        match serde_json::to_value(value) {
            Ok(result) => Envelope::Success { status, result },
            Err(e) => {
                error!("Failed to build response envelope: {}", e);
                Envelope::fault(e.to_string())
            }
        }
    }

    /// Turn a request-input rejection (body, path, query) into a fault
    pub fn reject(&self, rejection: impl fmt::Display) -> Envelope {
        let _entered = self.span.enter();
        warn!("Request input rejected: {}", rejection);
        Envelope::fault(rejection.to_string())
    }

    /// Close the request: report the status and tag the response
    pub async fn conclude(self, envelope: Envelope) -> Response {
        let status = envelope.status();
        let correlation_id = self.context.correlation_id;

        if let Err(e) = self
            .request_log
            .finish_request(correlation_id, status.as_u16())
            .instrument(self.span.clone())
            .await
        {
            warn!(%correlation_id, "Failed to record request completion: {}", e);
        }

        let mut response = envelope.into_response();
        if let Ok(value) = HeaderValue::from_str(&correlation_id.to_string()) {
            response
                .headers_mut()
                .insert(CORRELATION_HEADER.clone(), value);
        }
        response
    }
}

#[async_trait]
impl<S: CrudService> FromRequestParts<ResourceState<S>> for Dispatcher<S> {
    type Rejection = Envelope;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ResourceState<S>,
    ) -> Result<Self, Self::Rejection> {
        Dispatcher::begin(state, parts.method.as_str(), parts.uri.path()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use screenmusic_common::correlation::EphemeralRequestLog;
    use screenmusic_common::{Incident, Notification};
    use serde::ser::Error as _;
    use serde_json::json;

    /// Scripted service: every operation returns what the test configured
    struct ScriptedService;

    #[async_trait]
    impl CrudService for ScriptedService {
        type CreateInput = serde_json::Value;
        type UpdateInput = serde_json::Value;
        type Output = String;
        type IdentifierInput = String;

        async fn get_all(&self, _ctx: &RequestContext) -> Reply<Vec<String>> {
            Reply::value(vec!["a".to_string(), "b".to_string()])
                .notify(Notification::positive("listed"))
        }

        async fn get(&self, _ctx: &RequestContext, id: i64) -> Reply<String> {
            if id == 999 {
                Reply::negative("not found")
            } else {
                Reply::value(format!("artist-{}", id))
            }
        }

        async fn get_by_identifier(&self, _ctx: &RequestContext, name: String) -> Reply<String> {
            Reply::fault(ServiceFault::business([Incident::new("name", name)]))
                .notify(Notification::negative("ignored"))
        }

        async fn create(&self, _ctx: &RequestContext, _input: serde_json::Value) -> Reply<String> {
            Reply::value("42".to_string()).notify(Notification::positive("Artist created"))
        }

        async fn update(
            &self,
            _ctx: &RequestContext,
            _id: i64,
            _input: serde_json::Value,
        ) -> Reply<String> {
            Reply::value("3".to_string()).notify(Notification::negative("name clash"))
        }

        async fn delete(&self, _ctx: &RequestContext, _id: i64) -> Reply<bool> {
            Reply::fault(ServiceFault::unexpected("DB timeout"))
                .notify(Notification::negative("ignored"))
        }
    }

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<Ser: serde::Serializer>(&self, _s: Ser) -> Result<Ser::Ok, Ser::Error> {
            Err(Ser::Error::custom("cannot encode value"))
        }
    }

    fn state() -> ResourceState<ScriptedService> {
        ResourceState::new(
            ScriptedService,
            Arc::new(EphemeralRequestLog),
            CorrelationRegistry::new(),
        )
    }

    async fn dispatcher() -> Dispatcher<ScriptedService> {
        Dispatcher::begin(&state(), "GET", "/api/artist")
            .await
            .expect("dispatcher should start")
    }

    #[tokio::test]
    async fn test_not_found_is_rejected() {
        let mut dispatcher = dispatcher().await;

        let envelope = dispatcher.get(999).await;

        assert_eq!(envelope.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            envelope.to_json(),
            json!([{"message": "not found", "messageType": "Negative"}])
        );
    }

    #[tokio::test]
    async fn test_create_succeeds_with_201_and_drops_positive() {
        let mut dispatcher = dispatcher().await;

        let envelope = dispatcher.create(json!({"name": "Foo"})).await;

        assert_eq!(envelope.status(), StatusCode::CREATED);
        assert_eq!(envelope.to_json(), json!({"value": {"result": "42"}}));
        assert_eq!(dispatcher.notifications().len(), 1);
    }

    #[tokio::test]
    async fn test_unexpected_fault_wins_over_notifications() {
        let mut dispatcher = dispatcher().await;

        let envelope = dispatcher.delete(5).await;

        assert_eq!(envelope, Envelope::Fault("DB timeout".to_string()));
        assert_eq!(envelope.to_json(), json!({"value": "DB timeout"}));
        assert!(dispatcher.notifications().is_empty());
    }

    #[tokio::test]
    async fn test_value_with_negative_is_rejected() {
        let mut dispatcher = dispatcher().await;

        let envelope = dispatcher.update(3, json!({"name": "Foo"})).await;

        assert_eq!(envelope.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            envelope.to_json(),
            json!([{"message": "name clash", "messageType": "Negative"}])
        );
    }

    #[tokio::test]
    async fn test_business_fault_returns_incidents_verbatim() {
        let mut dispatcher = dispatcher().await;

        let envelope = dispatcher.get_by_identifier("Name is required".to_string()).await;

        assert_eq!(
            envelope.to_json(),
            json!({
                "value": {
                    "result": null,
                    "listNotification": [{"key": "name", "message": "Name is required"}]
                }
            })
        );
        assert!(dispatcher.notifications().is_empty());
    }

    #[tokio::test]
    async fn test_list_success_hides_positive() {
        let mut dispatcher = dispatcher().await;

        let envelope = dispatcher.get_all().await;

        assert_eq!(envelope.status(), StatusCode::OK);
        assert_eq!(envelope.to_json(), json!({"value": {"result": ["a", "b"]}}));
        assert!(!envelope.to_json().to_string().contains("listed"));
    }

    #[tokio::test]
    async fn test_notifications_accumulate_across_calls() {
        let mut dispatcher = dispatcher().await;

        let first = dispatcher.get(999).await;
        assert!(!first.is_success());

        // The earlier negative still dominates a clean call on the same dispatcher
        let second = dispatcher.get(1).await;
        assert_eq!(
            second.to_json(),
            json!([{"message": "not found", "messageType": "Negative"}])
        );
    }

    #[tokio::test]
    async fn test_serialization_failure_becomes_fault() {
        let mut dispatcher = dispatcher().await;

        let envelope = dispatcher.respond(Reply::value(Unserializable), StatusCode::OK);

        assert_eq!(envelope, Envelope::Fault("cannot encode value".to_string()));
    }

    #[tokio::test]
    async fn test_empty_reply_without_negatives_is_null_success() {
        let mut dispatcher = dispatcher().await;

        let envelope = dispatcher.respond(Reply::<String>::empty(), StatusCode::OK);

        assert_eq!(envelope.to_json(), json!({"value": {"result": null}}));
    }

    #[tokio::test]
    async fn test_correlation_slot_lives_with_dispatcher() {
        let state = state();

        let dispatcher = Dispatcher::begin(&state, "GET", "/api/artist").await.unwrap();
        let context = dispatcher.context().clone();
        assert_eq!(
            state.registry.lookup(context.dispatcher_id),
            Some(context.correlation_id)
        );

        let response = dispatcher.conclude(Envelope::fault("x")).await;
        assert_eq!(
            response.headers()[&CORRELATION_HEADER],
            context.correlation_id.to_string().as_str()
        );
        assert_eq!(state.registry.lookup(context.dispatcher_id), None);
    }

    #[tokio::test]
    async fn test_failed_registration_closes_logged_request() {
        use std::sync::Mutex;

        #[derive(Default)]
        struct RecordingLog {
            finished: Mutex<Vec<(CorrelationId, u16)>>,
        }

        #[async_trait]
        impl RequestLog for RecordingLog {
            async fn begin_request(
                &self,
                _method: &str,
                _path: &str,
            ) -> screenmusic_common::Result<CorrelationId> {
                Ok(CorrelationId::generate())
            }

            async fn finish_request(
                &self,
                correlation_id: CorrelationId,
                status: u16,
            ) -> screenmusic_common::Result<()> {
                self.finished.lock().unwrap().push((correlation_id, status));
                Ok(())
            }
        }

        let log = Arc::new(RecordingLog::default());
        let state = ResourceState::new(ScriptedService, log.clone(), CorrelationRegistry::new());
        let dispatcher_id = DispatcherId::generate();
        let holder = CorrelationId::generate();
        let _held = state.registry.register(dispatcher_id, holder).unwrap();

        let result = Dispatcher::begin_as(&state, dispatcher_id, "GET", "/api/artist").await;

        assert!(matches!(result, Err(Envelope::Fault(_))));
        let finished = log.finished.lock().unwrap().clone();
        assert_eq!(finished.len(), 1);
        assert_ne!(finished[0].0, holder);
        assert_eq!(finished[0].1, 400);
        assert_eq!(state.registry.lookup(dispatcher_id), Some(holder));
    }

    #[tokio::test]
    async fn test_failed_request_log_becomes_fault() {
        struct BrokenLog;

        #[async_trait]
        impl RequestLog for BrokenLog {
            async fn begin_request(
                &self,
                _method: &str,
                _path: &str,
            ) -> screenmusic_common::Result<CorrelationId> {
                Err(screenmusic_common::Error::Internal("log unavailable".to_string()))
            }
        }

        let state = ResourceState::new(
            ScriptedService,
            Arc::new(BrokenLog),
            CorrelationRegistry::new(),
        );

        let result = Dispatcher::begin(&state, "GET", "/api/artist").await;

        match result {
            Err(envelope) => {
                assert_eq!(envelope.status(), StatusCode::BAD_REQUEST);
                assert_eq!(
                    envelope.to_json(),
                    json!({"value": "Internal error: log unavailable"})
                );
            }
            Ok(_) => panic!("Expected setup failure"),
        }
        assert_eq!(state.registry.active(), 0);
    }
}
