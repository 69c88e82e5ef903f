//! Session lifecycle events
//!
//! Dependents of the auth orchestrator (tenant context, caches, UI state)
//! subscribe to session events instead of being hard-wired into the login
//! and logout paths. Handlers run in registration order on the emitting
//! task; a failing handler is logged and never blocks the lifecycle
//! transition that triggered it.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{error::EventError, session::AuthSession, user::UserId};

/// Events emitted by the auth orchestrator.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A session was established, online or offline.
    Established(AuthSession),

    /// The user logged out.
    LoggedOut(UserId),

    /// The session was invalidated externally (e.g. a 401 on an
    /// authenticated call).
    Expired(UserId),
}

/// A handler for session lifecycle events.
#[async_trait]
pub trait SessionEventHandler: Send + Sync + 'static {
    async fn handle_event(&self, event: &SessionEvent) -> Result<(), EventError>;
}

/// Registers handlers and fans session events out to them.
#[derive(Default, Clone)]
pub struct SessionEventBus {
    handlers: Arc<RwLock<Vec<Arc<dyn SessionEventHandler>>>>,
}

impl SessionEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, handler: Arc<dyn SessionEventHandler>) {
        self.handlers.write().await.push(handler);
    }

    /// Emit an event to all handlers. Handler failures are logged, not
    /// propagated: lifecycle transitions (logout in particular) have no
    /// failure path.
    pub async fn emit(&self, event: &SessionEvent) {
        let handlers = self.handlers.read().await;
        for handler in handlers.iter() {
            if let Err(e) = handler.handle_event(event).await {
                tracing::warn!(error = %e, "Session event handler failed");
            }
        }
    }
}

impl std::fmt::Debug for SessionEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionEventBus").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counter {
        seen: AtomicUsize,
    }

    #[async_trait]
    impl SessionEventHandler for Counter {
        async fn handle_event(&self, _event: &SessionEvent) -> Result<(), EventError> {
            self.seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl SessionEventHandler for Failing {
        async fn handle_event(&self, _event: &SessionEvent) -> Result<(), EventError> {
            Err(EventError::HandlerError("boom".to_string()))
        }
    }

    #[tokio::test]
    async fn test_events_reach_all_handlers() {
        let bus = SessionEventBus::new();
        let counter = Arc::new(Counter {
            seen: AtomicUsize::new(0),
        });
        bus.register(counter.clone()).await;

        bus.emit(&SessionEvent::LoggedOut(UserId::new("usr_1"))).await;
        bus.emit(&SessionEvent::Expired(UserId::new("usr_1"))).await;

        assert_eq!(counter.seen.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failing_handler_does_not_block_others() {
        let bus = SessionEventBus::new();
        bus.register(Arc::new(Failing)).await;
        let counter = Arc::new(Counter {
            seen: AtomicUsize::new(0),
        });
        bus.register(counter.clone()).await;

        bus.emit(&SessionEvent::LoggedOut(UserId::new("usr_1"))).await;

        assert_eq!(counter.seen.load(Ordering::SeqCst), 1);
    }
}
