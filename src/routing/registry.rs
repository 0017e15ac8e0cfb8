//! Handler registry.
//!
//! # Responsibilities
//! - Map (routing prefix, HTTP method) pairs to handler kinds
//! - Refuse a second claim on the same pair
//! - Answer lookups from any number of request tasks
//!
//! # Design Decisions
//! - Populated explicitly at startup (`HandlerRegistry::standard`)
//! - Immutable after construction (thread-safe without locks)
//! - O(n) scan, exact match on both prefix and method

use axum::http::Method;

use crate::error::RegistryError;

/// The closed set of request handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    /// Static greeting at the mount point.
    Welcome,
    /// Framed WebSocket for browser clients.
    WebSocket,
    /// Raw WebSocket for everything else.
    RawWebSocket,
}

impl HandlerKind {
    /// Routing prefix the handler claims.
    ///
    /// The raw variant's prefix is rooted: it lives directly under the
    /// mount point while the framed one sits below server/session segments.
    pub fn routing_prefix(&self) -> &'static str {
        match self {
            HandlerKind::Welcome => "",
            HandlerKind::WebSocket => "websocket",
            HandlerKind::RawWebSocket => "/websocket",
        }
    }

    pub fn method(&self) -> Method {
        Method::GET
    }

    pub fn name(&self) -> &'static str {
        match self {
            HandlerKind::Welcome => "welcome",
            HandlerKind::WebSocket => "websocket",
            HandlerKind::RawWebSocket => "raw_websocket",
        }
    }
}

/// One immutable registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerRegistration {
    pub prefix: String,
    pub method: Method,
    pub handler: HandlerKind,
}

#[derive(Debug, Clone, Default)]
pub struct HandlerRegistry {
    registrations: Vec<HandlerRegistration>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in handler.
    pub fn standard() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for kind in [
            HandlerKind::Welcome,
            HandlerKind::WebSocket,
            HandlerKind::RawWebSocket,
        ] {
            registry.register(kind.routing_prefix(), kind.method(), kind)?;
        }
        Ok(registry)
    }

    /// Claim `(prefix, method)` for `handler`.
    pub fn register(
        &mut self,
        prefix: impl Into<String>,
        method: Method,
        handler: HandlerKind,
    ) -> Result<(), RegistryError> {
        let prefix = prefix.into();
        if self.resolve(&prefix, &method).is_some() {
            return Err(RegistryError::Duplicate {
                prefix,
                method: method.to_string(),
            });
        }

        tracing::debug!(prefix = %prefix, method = %method, handler = handler.name(), "Handler registered");
        self.registrations.push(HandlerRegistration {
            prefix,
            method,
            handler,
        });
        Ok(())
    }

    pub fn resolve(&self, prefix: &str, method: &Method) -> Option<HandlerKind> {
        self.registrations
            .iter()
            .find(|r| r.prefix == prefix && r.method == *method)
            .map(|r| r.handler)
    }

    /// Methods registered under `prefix`, for `Allow` headers.
    pub fn allowed_methods(&self, prefix: &str) -> Vec<Method> {
        self.registrations
            .iter()
            .filter(|r| r.prefix == prefix)
            .map(|r| r.method.clone())
            .collect()
    }

    pub fn registrations(&self) -> &[HandlerRegistration] {
        &self.registrations
    }
}
