//! Key → attribute lookup tables loaded once per conversion.

use indexmap::IndexMap;

use crate::node::Node;

/// An ordered string-keyed table.
///
/// Queries ignore trailing spaces on the lookup key, since workbook cells are
/// frequently typed with a stray space. When a key occurs more than once the
/// first row wins.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupTable<V> {
    entries: IndexMap<String, V>,
}

impl<V> Default for LookupTable<V> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }
}

impl<V> LookupTable<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        if self.entries.contains_key(&key) {
            log::debug!("Ignoring duplicate lookup table entry '{key}'");
            return;
        }
        self.entries.insert(key, value);
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(normalize_key(key))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(normalize_key(key))
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for LookupTable<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (key, value) in iter {
            table.insert(key, value);
        }
        table
    }
}

fn normalize_key(key: &str) -> &str {
    key.trim_end_matches(' ')
}

/// Unit label → ontology unit key.
pub type UnitMap = LookupTable<String>;
/// Connector key → ontology type for freshly created connector nodes.
pub type ConnectorMap = LookupTable<Option<String>>;
/// Known term → persistent identifier.
pub type UniqueIdMap = LookupTable<Option<String>>;

/// The lookup tables the structural builder consults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LookupTables {
    pub units: UnitMap,
    pub connectors: ConnectorMap,
    pub unique_ids: UniqueIdMap,
}

impl LookupTables {
    /// Ontology key for a unit label.
    pub fn unit_key(&self, unit: &str) -> Option<&str> {
        self.units.get(unit).map(String::as_str)
    }

    #[cfg(test)]
    pub(crate) fn is_connector(&self, key: &str) -> bool {
        self.connectors.contains(key)
    }

    /// Seed for a newly created node under `key`: typed when the connector
    /// table maps it to a type, empty otherwise.
    pub fn seed_node(&self, key: &str) -> Node {
        match self.connectors.get(key) {
            Some(Some(type_name)) if !type_name.trim().is_empty() => Node::typed(type_name),
            _ => Node::new(),
        }
    }

    /// Whether `term` is listed in the unique-id table at all.
    pub fn has_unique_id(&self, term: &str) -> bool {
        self.unique_ids.contains(term)
    }

    /// Identifier for `term`, ignoring rows whose identifier cell is blank.
    pub fn unique_id(&self, term: &str) -> Option<&str> {
        self.unique_ids
            .get(term)
            .and_then(Option::as_deref)
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}
