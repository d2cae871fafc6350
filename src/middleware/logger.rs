//! Request-scoped logger handed explicitly to service calls.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use http::request::Parts;
use tracing::field::display;
use tracing::{Span, info_span};

use super::client_ip::ClientIp;
use super::request_id::RequestId;

/// Logger carrying the transport, operation, caller ip and request id of one call.
///
/// Adapters build it per request and pass it into [`crate::services::LibraryService`]
/// so every domain event is attributed to the call that caused it.
#[derive(Debug, Clone)]
pub struct RequestLogger {
    span: Span,
}

impl RequestLogger {
    #[must_use]
    pub fn new(
        transport: &'static str,
        operation: &str,
        request_id: Option<&RequestId>,
        client_ip: ClientIp,
    ) -> Self {
        let span = info_span!(
            "call",
            transport,
            operation,
            ip = client_ip.ip().map(display),
            request_id = request_id.map_or("", RequestId::as_str),
        );
        Self { span }
    }

    /// Logger for a gRPC method.
    #[must_use]
    pub fn from_grpc<T>(request: &tonic::Request<T>, method: &'static str) -> Self {
        Self::new(
            "grpc",
            method,
            request.extensions().get::<RequestId>(),
            ClientIp::from_grpc(request),
        )
    }

    #[must_use]
    pub const fn span(&self) -> &Span {
        &self.span
    }
}

impl<S: Send + Sync> FromRequestParts<S> for RequestLogger {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let operation = format!("{} {}", parts.method, parts.uri.path());
        Ok(Self::new(
            "rest",
            &operation,
            parts.extensions.get::<RequestId>(),
            parts.extensions.get::<ClientIp>().copied().unwrap_or_default(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tracing::field::{Field, Visit};
    use tracing::span::{Attributes, Id};
    use tracing::subscriber::with_default;
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::{Layer, Registry};

    use super::*;

    type Fields = Arc<Mutex<Vec<(String, String)>>>;

    /// Captures the fields of every new span.
    struct SpanFields(Fields);

    impl Visit for SpanFields {
        fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
            self.0
                .lock()
                .unwrap()
                .push((field.name().to_string(), format!("{value:?}")));
        }
    }

    impl<S: tracing::Subscriber> Layer<S> for SpanFields {
        fn on_new_span(&self, attrs: &Attributes<'_>, _id: &Id, _ctx: Context<'_, S>) {
            attrs.record(&mut SpanFields(self.0.clone()));
        }
    }

    fn captured(client_ip: ClientIp) -> Vec<(String, String)> {
        let fields = Fields::default();
        let subscriber = Registry::default().with(SpanFields(fields.clone()));
        let request_id = RequestId::generate();
        with_default(subscriber, || {
            let _log = RequestLogger::new("rest", "POST /login", Some(&request_id), client_ip);
        });
        let fields = fields.lock().unwrap().clone();
        fields
    }

    fn field<'a>(fields: &'a [(String, String)], name: &str) -> Option<&'a str> {
        fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    #[test]
    fn span_carries_caller_ip_and_operation() {
        let fields = captured(ClientIp(Some("203.0.113.5".parse().unwrap())));
        assert_eq!(field(&fields, "ip"), Some("203.0.113.5"));
        assert_eq!(field(&fields, "operation"), Some("\"POST /login\""));
    }

    #[test]
    fn unknown_caller_leaves_ip_empty() {
        let fields = captured(ClientIp::default());
        assert_eq!(field(&fields, "ip"), None);
        assert_eq!(field(&fields, "transport"), Some("\"rest\""));
    }
}
