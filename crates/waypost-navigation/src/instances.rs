//! Component instances registered by the UI layer.
//!
//! When the UI layer creates the component for a matched record's view, it
//! registers a handle here. The router only looks handles up, to run the
//! callbacks that component enter guards leave for after the commit. The
//! registry holds weak references, so a handle disappears once the UI layer
//! drops its instance.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock, Weak};

use waypost_routing::guard::InstanceHandle;
use waypost_routing::record::RecordId;

type InstanceKey = (RecordId, String);

/// Weak component-instance handles keyed by record and view.
#[derive(Default)]
pub struct InstanceRegistry {
    instances: RwLock<HashMap<InstanceKey, Weak<dyn std::any::Any + Send + Sync>>>,
}

impl fmt::Debug for InstanceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceRegistry")
            .field("len", &self.len())
            .finish()
    }
}

impl InstanceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `instance` as the component rendering `view` of `record`.
    ///
    /// Replaces any earlier registration for the same slot.
    pub fn register(&self, record: RecordId, view: impl Into<String>, instance: &InstanceHandle) {
        self.instances
            .write()
            .expect("instance registry lock poisoned")
            .insert((record, view.into()), Arc::downgrade(instance));
    }

    /// Removes the registration for `view` of `record`.
    pub fn unregister(&self, record: RecordId, view: &str) -> bool {
        self.instances
            .write()
            .expect("instance registry lock poisoned")
            .remove(&(record, view.to_string()))
            .is_some()
    }

    /// The live instance for `view` of `record`, if any.
    pub fn get(&self, record: RecordId, view: &str) -> Option<InstanceHandle> {
        self.instances
            .read()
            .expect("instance registry lock poisoned")
            .get(&(record, view.to_string()))
            .and_then(Weak::upgrade)
    }

    /// Drops registrations whose instance no longer exists.
    pub fn prune(&self) {
        self.instances
            .write()
            .expect("instance registry lock poisoned")
            .retain(|_, instance| instance.strong_count() > 0);
    }

    /// Returns the number of registrations, including dead ones.
    pub fn len(&self) -> usize {
        self.instances
            .read()
            .expect("instance registry lock poisoned")
            .len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_get() {
        let registry = InstanceRegistry::new();
        let instance: InstanceHandle = Arc::new(String::from("panel"));
        registry.register(RecordId(1), "default", &instance);

        let found = registry.get(RecordId(1), "default").unwrap();
        assert_eq!(found.downcast_ref::<String>().map(String::as_str), Some("panel"));
        assert!(registry.get(RecordId(1), "aside").is_none());
        assert!(registry.get(RecordId(2), "default").is_none());
    }

    #[test]
    fn test_dropped_instance_is_gone() {
        let registry = InstanceRegistry::new();
        let instance: InstanceHandle = Arc::new(42_u32);
        registry.register(RecordId(3), "default", &instance);
        drop(instance);

        assert!(registry.get(RecordId(3), "default").is_none());
        assert_eq!(registry.len(), 1);
        registry.prune();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unregister() {
        let registry = InstanceRegistry::new();
        let instance: InstanceHandle = Arc::new(());
        registry.register(RecordId(4), "default", &instance);
        assert!(registry.unregister(RecordId(4), "default"));
        assert!(!registry.unregister(RecordId(4), "default"));
    }
}
