//! # Type Registry
//!
//! Registry mapping a stable type name to a construction function, so a
//! codec can reconstruct concrete message types from wire tags without a
//! class hierarchy. The registry is a capability set: a codec built with it
//! accepts exactly the registered types and nothing else.

use std::collections::HashMap;

use crate::core::message::{Message, ValueHolder, ValueReport, ValueRequest};

/// Constructs a default instance of one catalog type.
pub type MessageFactory = fn() -> Box<dyn Message>;

/// Maps stable type names to message constructors.
#[derive(Default)]
pub struct TypeRegistry {
    factories: HashMap<&'static str, MessageFactory>,
}

impl TypeRegistry {
    /// An empty registry. Most callers want [`TypeRegistry::with_catalog`].
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the full built-in catalog.
    pub fn with_catalog() -> Self {
        let mut registry = Self::new();
        registry.register(ValueRequest::NAME, || Box::<ValueRequest>::default());
        registry.register(ValueReport::NAME, || Box::<ValueReport>::default());
        registry.register(ValueHolder::NAME, || Box::<ValueHolder>::default());
        registry
    }

    /// Register a constructor under `name`. Re-registering replaces the
    /// previous constructor.
    pub fn register(&mut self, name: &'static str, factory: MessageFactory) {
        self.factories.insert(name, factory);
    }

    /// Whether `name` identifies a registered type.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Construct a default instance of the type registered under `name`.
    pub fn construct(&self, name: &str) -> Option<Box<dyn Message>> {
        self.factories.get(name).map(|factory| factory())
    }

    /// Names of all registered types, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_registers_every_type() {
        let registry = TypeRegistry::with_catalog();
        for name in [ValueRequest::NAME, ValueReport::NAME, ValueHolder::NAME] {
            assert!(registry.contains(name), "missing {name}");
        }
        assert_eq!(registry.names().count(), 3);
    }

    #[test]
    fn test_construct_by_tag() {
        let registry = TypeRegistry::with_catalog();

        let message = registry.construct(ValueRequest::NAME).expect("registered");
        assert_eq!(message.type_name(), ValueRequest::NAME);
        assert!(message.as_any().downcast_ref::<ValueRequest>().is_some());

        assert!(registry.construct("NoSuchType").is_none());
    }

    #[test]
    fn test_empty_registry_constructs_nothing() {
        let registry = TypeRegistry::new();
        assert!(!registry.contains(ValueRequest::NAME));
        assert!(registry.construct(ValueRequest::NAME).is_none());
    }
}
