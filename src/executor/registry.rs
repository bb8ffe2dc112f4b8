//! Task-handler trait and the name→handler registry.
//!
//! The registry is built once at startup; duplicate registration is
//! rejected there, and a queue message addressing an unregistered name is
//! a loud dispatch-time configuration error — never silently dropped.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::HubError;
use crate::identity::TaskId;

/// One executable task kind.
///
/// Handlers receive the raw parameter JSON and return the result payload
/// to persist; parameter validation is the handler's first move.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    /// Executes the task and returns its result payload.
    async fn run(&self, task_id: &TaskId, params: Value) -> Result<Value, HubError>;
}

/// Fixed mapping of task names to handlers, built at startup.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use async_trait::async_trait;
/// use serde_json::Value;
/// use taskhub::error::HubError;
/// use taskhub::executor::registry::{HandlerRegistry, TaskHandler};
/// use taskhub::identity::TaskId;
///
/// struct Echo;
///
/// #[async_trait]
/// impl TaskHandler for Echo {
///     async fn run(&self, _id: &TaskId, params: Value) -> Result<Value, HubError> {
///         Ok(params)
///     }
/// }
///
/// let mut registry = HandlerRegistry::new();
/// registry.register("echo", Arc::new(Echo)).unwrap();
/// assert!(registry.dispatch("echo").is_ok());
/// assert!(registry.dispatch("missing").is_err());
/// ```
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn TaskHandler>>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler under `name`.
    ///
    /// # Errors
    ///
    /// [`HubError::DuplicateHandler`] when `name` is already taken.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        handler: Arc<dyn TaskHandler>,
    ) -> Result<(), HubError> {
        let name = name.into();
        if self.handlers.contains_key(&name) {
            return Err(HubError::DuplicateHandler { name });
        }
        self.handlers.insert(name, handler);
        Ok(())
    }

    /// Looks up the handler for a task name.
    ///
    /// # Errors
    ///
    /// [`HubError::UnknownTask`] when no handler carries that name — a
    /// configuration fault, not a recoverable per-task condition.
    pub fn dispatch(&self, name: &str) -> Result<Arc<dyn TaskHandler>, HubError> {
        self.handlers
            .get(name)
            .cloned()
            .ok_or_else(|| HubError::UnknownTask {
                name: name.to_string(),
            })
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Nop;

    #[async_trait]
    impl TaskHandler for Nop {
        async fn run(&self, _id: &TaskId, _params: Value) -> Result<Value, HubError> {
            Ok(Value::Null)
        }
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = HandlerRegistry::new();
        registry.register("t", Arc::new(Nop)).unwrap();
        assert!(matches!(
            registry.register("t", Arc::new(Nop)),
            Err(HubError::DuplicateHandler { .. })
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn unknown_name_is_a_loud_error() {
        let registry = HandlerRegistry::new();
        assert!(matches!(
            registry.dispatch("ghost"),
            Err(HubError::UnknownTask { .. })
        ));
    }
}
