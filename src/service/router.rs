//! Request dispatch to class service handlers.
//!
//! Requests are processed one at a time to completion; the router borrows
//! the registry mutably for the duration of each request.

use super::{MessageRouterRequest, MessageRouterResponse};
use crate::core::error::GeneralStatus;
use crate::object::ObjectRegistry;

/// Routes requests to the handler registered for the addressed class.
#[derive(Default)]
pub struct MessageRouter {
    registry: ObjectRegistry,
}

impl MessageRouter {
    /// Create a router over a populated registry.
    pub fn new(registry: ObjectRegistry) -> Self {
        Self { registry }
    }

    /// The object registry.
    pub fn registry(&self) -> &ObjectRegistry {
        &self.registry
    }

    /// The object registry, mutably.
    pub fn registry_mut(&mut self) -> &mut ObjectRegistry {
        &mut self.registry
    }

    /// Dispatch one request and build its response.
    pub fn dispatch(&mut self, request: &MessageRouterRequest) -> MessageRouterResponse {
        let path = request.path;
        let Some((class, instance)) = self.registry.instance_mut(path.class, path.instance) else {
            tracing::debug!(path = %path, "no such class or instance");
            return MessageRouterResponse::for_request(request, GeneralStatus::PathDestinationUnknown);
        };

        let Some(handler) = class.service(request.service) else {
            tracing::debug!(
                path = %path,
                service = request.service,
                "service not supported by class"
            );
            return MessageRouterResponse::for_request(request, GeneralStatus::ServiceNotSupported);
        };

        handler.handle(class, instance, request)
    }
}
