//! By-tag lookup of shared components.
//!
//! [`References`] is the seam through which a persistence component finds
//! collaborators it does not own, most importantly a shared connection
//! manager. It is a flat tag-to-component map with type-safe resolution;
//! container wiring beyond that stays outside this crate.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A registry of shared components, keyed by tag.
///
/// Components are held behind `Arc`, so registering a component here does
/// not transfer ownership: the registry and every resolver share it.
/// Resolution is type-checked; asking for the wrong type under a tag yields
/// `None`, the same as an absent tag.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use docbase::references::References;
/// use docbase::memory::MemoryConnection;
///
/// let mut references = References::new();
/// references.put("connection", Arc::new(MemoryConnection::default()));
///
/// let connection: Option<Arc<MemoryConnection>> = references.get("connection");
/// assert!(connection.is_some());
/// ```
#[derive(Default, Clone)]
pub struct References {
    components: HashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl References {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a component under the given tag, replacing any previous one.
    pub fn put<T: Send + Sync + 'static>(&mut self, tag: impl Into<String>, component: Arc<T>) {
        self.components.insert(tag.into(), component);
    }

    /// Resolves the component registered under the given tag, if it exists
    /// and has the requested type.
    pub fn get<T: Send + Sync + 'static>(&self, tag: &str) -> Option<Arc<T>> {
        self.components
            .get(tag)
            .cloned()
            .and_then(|component| component.downcast::<T>().ok())
    }

    /// Removes the component registered under the given tag.
    pub fn remove(&mut self, tag: &str) {
        self.components.remove(tag);
    }

    /// Returns `true` when a component is registered under the given tag.
    pub fn contains(&self, tag: &str) -> bool {
        self.components.contains_key(tag)
    }
}

impl fmt::Debug for References {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("References")
            .field("tags", &self.components.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Probe(u32);

    #[test]
    fn resolves_by_tag_and_type() {
        let mut references = References::new();
        references.put("probe", Arc::new(Probe(7)));

        let resolved: Option<Arc<Probe>> = references.get("probe");
        assert_eq!(resolved.as_deref(), Some(&Probe(7)));
    }

    #[test]
    fn wrong_type_resolves_to_none() {
        let mut references = References::new();
        references.put("probe", Arc::new(Probe(7)));

        let resolved: Option<Arc<String>> = references.get("probe");
        assert!(resolved.is_none());
    }

    #[test]
    fn absent_tag_resolves_to_none() {
        let references = References::new();
        let resolved: Option<Arc<Probe>> = references.get("missing");
        assert!(resolved.is_none());
    }

    #[test]
    fn resolution_shares_the_component() {
        let mut references = References::new();
        let component = Arc::new(Probe(1));
        references.put("probe", component.clone());

        let resolved: Arc<Probe> = references.get("probe").unwrap();
        assert!(Arc::ptr_eq(&component, &resolved));
    }

    #[test]
    fn put_replaces_and_remove_drops() {
        let mut references = References::new();
        references.put("probe", Arc::new(Probe(1)));
        references.put("probe", Arc::new(Probe(2)));
        assert_eq!(references.get::<Probe>("probe").unwrap().0, 2);

        references.remove("probe");
        assert!(!references.contains("probe"));
    }
}
