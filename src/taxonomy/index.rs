use crate::model::{StoreError, TaxonomyError, TaxonomyId, TaxonomyKind};
use crate::taxonomy::dictionary::CanonicalCategory;
use crate::taxonomy::store::TaxonomyStore;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Lookup key of a source-locale label.
pub fn normalize_key(label: &str) -> String {
    label.trim().to_lowercase()
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaxonomyEntry {
    pub key: String,
    pub id: TaxonomyId,
    pub external_id: String,
    pub labels: BTreeMap<String, String>,
}

impl TaxonomyEntry {
    pub fn new(key: String, id: TaxonomyId, external_id: String) -> Self {
        Self {
            key,
            id,
            external_id,
            labels: BTreeMap::new(),
        }
    }

    pub fn with_label(mut self, locale: &str, label: &str) -> Self {
        self.labels.insert(locale.to_string(), label.to_string());
        self
    }

    pub fn label(&self, locale: &str) -> Option<&str> {
        self.labels.get(locale).map(String::as_str)
    }
}

/// Categories and features known to the current run, keyed by normalized source label.
///
/// Ordered maps keep iteration (and therefore fuzzy-match tie-breaking) deterministic.
#[derive(Debug, Clone, Default)]
pub struct TaxonomyIndex {
    categories: BTreeMap<String, TaxonomyEntry>,
    features: BTreeMap<String, TaxonomyEntry>,
}

impl TaxonomyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every category and feature in both locales.
    pub async fn load<S>(
        store: &S,
        source_locale: &str,
        target_locale: &str,
    ) -> Result<Self, StoreError>
    where
        S: TaxonomyStore + ?Sized,
    {
        let mut index = Self::new();
        for kind in [TaxonomyKind::Category, TaxonomyKind::Feature] {
            for stored in store.list_labels(kind, source_locale).await? {
                let key = normalize_key(&stored.label);
                if key.is_empty() {
                    warn!("Skipping {} {} with a blank name", kind, stored.id);
                    continue;
                }
                if index.contains(kind, &key) {
                    warn!("Duplicate {} '{}' in the CMS, keeping the first", kind, key);
                    continue;
                }
                let entry = TaxonomyEntry::new(key, stored.id, stored.external_id)
                    .with_label(source_locale, &stored.label);
                index.insert(kind, entry);
            }

            for stored in store.list_labels(kind, target_locale).await? {
                match index
                    .map_mut(kind)
                    .values_mut()
                    .find(|e| e.external_id == stored.external_id)
                {
                    Some(entry) => {
                        entry.labels.insert(target_locale.to_string(), stored.label);
                    }
                    None => debug!(
                        "{} '{}' exists only in locale {}",
                        kind, stored.label, target_locale
                    ),
                }
            }
            info!("Loaded {} existing {}", index.len(kind), kind.collection());
        }
        Ok(index)
    }

    fn map(&self, kind: TaxonomyKind) -> &BTreeMap<String, TaxonomyEntry> {
        match kind {
            TaxonomyKind::Category => &self.categories,
            TaxonomyKind::Feature => &self.features,
        }
    }

    fn map_mut(&mut self, kind: TaxonomyKind) -> &mut BTreeMap<String, TaxonomyEntry> {
        match kind {
            TaxonomyKind::Category => &mut self.categories,
            TaxonomyKind::Feature => &mut self.features,
        }
    }

    pub fn get(&self, kind: TaxonomyKind, key: &str) -> Option<&TaxonomyEntry> {
        self.map(kind).get(key)
    }

    pub fn get_mut(&mut self, kind: TaxonomyKind, key: &str) -> Option<&mut TaxonomyEntry> {
        self.map_mut(kind).get_mut(key)
    }

    pub fn contains(&self, kind: TaxonomyKind, key: &str) -> bool {
        self.map(kind).contains_key(key)
    }

    /// Inserts or replaces the entry stored under `entry.key`.
    pub fn insert(&mut self, kind: TaxonomyKind, entry: TaxonomyEntry) {
        self.map_mut(kind).insert(entry.key.clone(), entry);
    }

    /// Keys of `kind` in lexicographic order.
    pub fn keys(&self, kind: TaxonomyKind) -> impl Iterator<Item = &str> {
        self.map(kind).keys().map(String::as_str)
    }

    pub fn len(&self, kind: TaxonomyKind) -> usize {
        self.map(kind).len()
    }

    pub fn missing_categories(&self) -> Vec<CanonicalCategory> {
        CanonicalCategory::ALL
            .into_iter()
            .filter(|c| !self.contains(TaxonomyKind::Category, c.source_name()))
            .collect()
    }

    /// Fails unless all five canonical categories are present.
    pub fn ensure_provisioned(&self) -> Result<(), TaxonomyError> {
        let missing = self.missing_categories();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(TaxonomyError::NotProvisioned(
                missing.iter().map(|c| c.source_name().to_string()).collect(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::store::memory::MemoryStore;

    #[tokio::test]
    async fn load_merges_locales_by_external_id() {
        let store = MemoryStore::new();
        store.seed_categories();
        let pool = store.seed(TaxonomyKind::Feature, &[("es", "Piscina"), ("en", "Pool")]);
        store.seed(TaxonomyKind::Feature, &[("es", "Gimnasio")]);
        store.seed(TaxonomyKind::Feature, &[("en", "Helipad")]);

        let index = TaxonomyIndex::load(&store, "es", "en").await.unwrap();

        assert_eq!(index.len(TaxonomyKind::Category), 5);
        assert_eq!(index.len(TaxonomyKind::Feature), 2);
        let entry = index.get(TaxonomyKind::Feature, "piscina").unwrap();
        assert_eq!(entry.id, pool);
        assert_eq!(entry.label("es"), Some("Piscina"));
        assert_eq!(entry.label("en"), Some("Pool"));
        assert_eq!(index.get(TaxonomyKind::Feature, "gimnasio").unwrap().label("en"), None);
        assert!(index.ensure_provisioned().is_ok());
    }

    #[tokio::test]
    async fn duplicate_names_keep_the_first_entry() {
        let store = MemoryStore::new();
        let first = store.seed(TaxonomyKind::Feature, &[("es", "Terraza")]);
        store.seed(TaxonomyKind::Feature, &[("es", " terraza ")]);

        let index = TaxonomyIndex::load(&store, "es", "en").await.unwrap();
        assert_eq!(index.len(TaxonomyKind::Feature), 1);
        assert_eq!(index.get(TaxonomyKind::Feature, "terraza").unwrap().id, first);
    }

    #[test]
    fn missing_canonical_category_is_reported() {
        let mut index = TaxonomyIndex::new();
        for (i, name) in ["apartamentos", "casas", "lotes", "oficinas"].iter().enumerate() {
            index.insert(
                TaxonomyKind::Category,
                TaxonomyEntry::new(name.to_string(), i as u64, format!("doc-{}", i)),
            );
        }
        assert_eq!(index.missing_categories(), vec![CanonicalCategory::Farms]);
        match index.ensure_provisioned() {
            Err(TaxonomyError::NotProvisioned(missing)) => assert_eq!(missing, vec!["fincas"]),
            other => panic!("expected NotProvisioned, got {:?}", other),
        }
    }

    #[test]
    fn keys_iterate_in_lexicographic_order() {
        let mut index = TaxonomyIndex::new();
        for (i, key) in ["terraza", "balcón", "jardín"].iter().enumerate() {
            index.insert(
                TaxonomyKind::Feature,
                TaxonomyEntry::new(key.to_string(), i as u64, String::new()),
            );
        }
        assert_eq!(
            index.keys(TaxonomyKind::Feature).collect::<Vec<_>>(),
            vec!["balcón", "jardín", "terraza"]
        );
    }
}
