use super::path::{NodePath, normalize};
use super::spec::{NodeTypeSpec, PropertyDefault, SlotLabel, Worker};
use ahash::AHashMap;
use std::sync::Arc;
use tracing::debug;

/// One category of registered node types. `name` keeps the display form the
/// category was first registered under; the map keys are normalized titles.
#[derive(Debug, Clone, Default)]
pub struct CategoryEntry {
    pub name: String,
    pub nodes: AHashMap<String, Arc<NodeTypeSpec>>,
}

/// A catalog of node type specifications.
///
/// Two registries cooperate per graph: a local one owned by the graph for
/// entries meaningful only to that graph (live sensor readers bound to a
/// device, per-experiment sinks), optionally chained to a shared base
/// catalog of process-wide types. The chain is explicit: registries are
/// plain values handed to `Dataflow` at construction, so independent
/// catalogs and test isolation come for free.
///
/// Lookup resolution is whole-record: when a path exists locally, the local
/// spec wins outright and the base is never consulted for it, not even for
/// individual fields.
#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    base: Option<Arc<NodeRegistry>>,
    categories: AHashMap<String, CategoryEntry>,
}

impl NodeRegistry {
    /// An empty registry with no base catalog.
    pub fn new() -> NodeRegistry {
        NodeRegistry::default()
    }

    /// An empty registry that falls back to `base` for paths it does not
    /// hold itself.
    pub fn with_base(base: Arc<NodeRegistry>) -> NodeRegistry {
        NodeRegistry {
            base: Some(base),
            categories: AHashMap::new(),
        }
    }

    /// Registers a node type and returns its unique path, or `None` when the
    /// path is already taken in this registry (the base is not consulted;
    /// shadowing a base entry is how local overrides work).
    ///
    /// The sizes of `input_labels` and `output_labels` define the node's
    /// slot counts. A `name` default property equal to the title is injected
    /// when the caller does not provide one.
    pub fn register(
        &mut self,
        title: &str,
        category: &str,
        input_labels: Vec<SlotLabel>,
        output_labels: Vec<SlotLabel>,
        worker: Worker,
        default_properties: impl IntoIterator<Item = (String, PropertyDefault)>,
    ) -> Option<NodePath> {
        let cat_key = normalize(category);
        let title_key = normalize(title);
        let entry = self
            .categories
            .entry(cat_key.clone())
            .or_insert_with(|| CategoryEntry {
                name: category.to_string(),
                nodes: AHashMap::new(),
            });
        if entry.nodes.contains_key(&title_key) {
            return None;
        }

        let mut defaults: AHashMap<String, PropertyDefault> =
            default_properties.into_iter().collect();
        defaults
            .entry("name".to_string())
            .or_insert_with(|| PropertyDefault::new(title));

        let spec = NodeTypeSpec {
            title: title.to_string(),
            category: category.to_string(),
            input_labels,
            output_labels,
            worker,
            default_properties: defaults,
        };
        entry.nodes.insert(title_key, Arc::new(spec));
        let path = NodePath::new(category, title);
        debug!(path = %path, "registered node type");
        Some(path)
    }

    /// Removes a node type from this registry. Base entries are untouched.
    pub fn unregister(&mut self, path: &NodePath) -> bool {
        let Some(entry) = self.categories.get_mut(path.category()) else {
            return false;
        };
        entry.nodes.remove(path.title()).is_some()
    }

    /// Resolves a path, local registry first, then the base chain.
    pub fn lookup(&self, path: &NodePath) -> Option<Arc<NodeTypeSpec>> {
        if let Some(spec) = self
            .categories
            .get(path.category())
            .and_then(|entry| entry.nodes.get(path.title()))
        {
            return Some(spec.clone());
        }
        self.base.as_ref().and_then(|base| base.lookup(path))
    }

    pub fn contains(&self, path: &NodePath) -> bool {
        self.lookup(path).is_some()
    }

    /// Every spec visible through this registry, keyed by normalized
    /// category and title. Base entries shadowed by local ones are omitted.
    pub fn visible(&self) -> AHashMap<String, CategoryEntry> {
        let mut merged = match &self.base {
            Some(base) => base.visible(),
            None => AHashMap::new(),
        };
        for (cat_key, entry) in &self.categories {
            let target = merged.entry(cat_key.clone()).or_insert_with(|| {
                CategoryEntry {
                    name: entry.name.clone(),
                    nodes: AHashMap::new(),
                }
            });
            for (title_key, spec) in &entry.nodes {
                target.nodes.insert(title_key.clone(), spec.clone());
            }
        }
        merged
    }
}
