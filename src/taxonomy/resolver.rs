use crate::config::AppConfig;
use crate::model::{TaxonomyError, TaxonomyId, TaxonomyKind};
use crate::taxonomy::dictionary::{
    category_synonym, feature_translation, CanonicalCategory, CATEGORY_SYNONYMS,
};
use crate::taxonomy::index::{normalize_key, TaxonomyEntry, TaxonomyIndex};
use crate::taxonomy::similarity::best_match;
use crate::taxonomy::store::TaxonomyStore;
use std::fmt;
use tracing::{debug, info, warn};

/// Shortest label taking part in substring matching against the synonym table.
const MIN_CONTAINMENT_LEN: usize = 3;

#[derive(Debug, Clone)]
pub struct ResolverSettings {
    pub source_locale: String,
    pub target_locale: String,
    pub category_threshold: f64,
    pub feature_threshold: f64,
    pub default_category: CanonicalCategory,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            source_locale: "es".into(),
            target_locale: "en".into(),
            category_threshold: 0.7,
            feature_threshold: 0.8,
            default_category: CanonicalCategory::Apartments,
        }
    }
}

impl ResolverSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            source_locale: config.default_locale.clone(),
            target_locale: config.secondary_locale.clone(),
            category_threshold: config.taxonomy.category_threshold,
            feature_threshold: config.taxonomy.feature_threshold,
            default_category: config.taxonomy.default_category,
        }
    }
}

/// How a category label was mapped onto the closed set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CategoryMatch {
    Exact,
    Contains,
    Fuzzy(f64),
    Fallback,
}

/// Degraded outcomes worth surfacing in the run summary.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionNote {
    CategoryFallback {
        label: String,
        category: CanonicalCategory,
    },
    LocalizationIncomplete {
        kind: TaxonomyKind,
        key: String,
        locale: String,
        reason: String,
    },
    Skipped {
        kind: TaxonomyKind,
        label: String,
        reason: String,
    },
}

impl fmt::Display for ResolutionNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionNote::CategoryFallback { label, category } => {
                write!(f, "category '{}' fell back to '{}'", label, category)
            }
            ResolutionNote::LocalizationIncomplete {
                kind,
                key,
                locale,
                reason,
            } => write!(f, "{} '{}' has no {} label: {}", kind, key, locale, reason),
            ResolutionNote::Skipped {
                kind,
                label,
                reason,
            } => write!(f, "{} '{}' skipped: {}", kind, label, reason),
        }
    }
}

/// Maps free-text category and feature names onto CMS taxonomy ids, creating
/// feature entries when nothing similar exists yet.
pub struct TaxonomyResolver<'s, S: ?Sized> {
    store: &'s S,
    settings: ResolverSettings,
    notes: Vec<ResolutionNote>,
}

impl<'s, S> TaxonomyResolver<'s, S>
where
    S: TaxonomyStore + ?Sized,
{
    pub fn new(store: &'s S, settings: ResolverSettings) -> Self {
        Self {
            store,
            settings,
            notes: Vec::new(),
        }
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    /// Records a note produced outside the resolver, e.g. by the pipeline.
    pub fn note(&mut self, note: ResolutionNote) {
        self.notes.push(note);
    }

    /// Returns and clears the notes gathered since the last call.
    pub fn take_notes(&mut self) -> Vec<ResolutionNote> {
        std::mem::take(&mut self.notes)
    }

    /// Resolves `source_label` to a taxonomy id. `target_label` is the best-effort
    /// translation stored as the target-locale label when one has to be written.
    pub async fn resolve(
        &mut self,
        index: &mut TaxonomyIndex,
        kind: TaxonomyKind,
        source_label: &str,
        target_label: &str,
    ) -> Result<TaxonomyId, TaxonomyError> {
        let key = normalize_key(source_label);
        if key.is_empty() {
            return Err(TaxonomyError::Validation {
                kind,
                label: source_label.to_string(),
                reason: "label is empty",
            });
        }
        if key.chars().all(|c| !c.is_alphanumeric()) {
            return Err(TaxonomyError::Validation {
                kind,
                label: source_label.to_string(),
                reason: "label has no letters or digits",
            });
        }

        match kind {
            TaxonomyKind::Category => self.resolve_category(index, &key).await,
            TaxonomyKind::Feature => {
                self.resolve_feature(index, &key, source_label.trim(), target_label)
                    .await
            }
        }
    }

    /// Maps a normalized label onto the closed category set without touching the store.
    pub fn classify_category(&self, key: &str) -> (CanonicalCategory, CategoryMatch) {
        if let Some(category) = category_synonym(key) {
            return (category, CategoryMatch::Exact);
        }

        let key_len = key.chars().count();
        for &(synonym, category) in CATEGORY_SYNONYMS {
            let label_in_synonym = key_len >= MIN_CONTAINMENT_LEN && synonym.contains(key);
            let synonym_in_label =
                synonym.chars().count() >= MIN_CONTAINMENT_LEN && key.contains(synonym);
            if label_in_synonym || synonym_in_label {
                return (category, CategoryMatch::Contains);
            }
        }

        let synonyms = CATEGORY_SYNONYMS.iter().map(|(synonym, _)| *synonym);
        if let Some(found) = best_match(key, synonyms, self.settings.category_threshold) {
            if let Some(category) = category_synonym(found.key) {
                return (category, CategoryMatch::Fuzzy(found.score));
            }
        }

        (self.settings.default_category, CategoryMatch::Fallback)
    }

    async fn resolve_category(
        &mut self,
        index: &mut TaxonomyIndex,
        key: &str,
    ) -> Result<TaxonomyId, TaxonomyError> {
        let (category, how) = self.classify_category(key);
        match how {
            CategoryMatch::Fallback => {
                warn!(
                    "No category matches '{}', falling back to '{}'",
                    key, category
                );
                self.notes.push(ResolutionNote::CategoryFallback {
                    label: key.to_string(),
                    category,
                });
            }
            other => debug!("Category '{}' -> '{}' ({:?})", key, category, other),
        }

        let canonical = category.source_name();
        let id = index
            .get(TaxonomyKind::Category, canonical)
            .map(|entry| entry.id)
            .ok_or_else(|| TaxonomyError::NotProvisioned(vec![canonical.to_string()]))?;

        self.fill_missing_label(index, TaxonomyKind::Category, canonical, category.target_name())
            .await;
        Ok(id)
    }

    /// Key of the existing feature that `key` should reuse, if any.
    fn find_feature<'i>(&self, index: &'i TaxonomyIndex, key: &str) -> Option<&'i str> {
        if let Some(entry) = index.get(TaxonomyKind::Feature, key) {
            return Some(entry.key.as_str());
        }

        let threshold = self.settings.feature_threshold;
        let first_word = key.split_whitespace().next().unwrap_or(key);
        let same_start = index
            .keys(TaxonomyKind::Feature)
            .filter(|candidate| candidate.starts_with(first_word));
        if let Some(found) = best_match(key, same_start, threshold) {
            return Some(found.key);
        }

        best_match(key, index.keys(TaxonomyKind::Feature), threshold).map(|found| found.key)
    }

    async fn resolve_feature(
        &mut self,
        index: &mut TaxonomyIndex,
        key: &str,
        source_label: &str,
        target_label: &str,
    ) -> Result<TaxonomyId, TaxonomyError> {
        let target = match feature_translation(key) {
            Some(known) => {
                debug!("Using predefined translation: {} -> {}", source_label, known);
                known.to_string()
            }
            None if target_label.trim().is_empty() => source_label.to_string(),
            None => target_label.trim().to_string(),
        };

        if let Some(existing) = self.find_feature(index, key).map(str::to_string) {
            if existing != key {
                info!("Feature '{}' matches existing '{}'", key, existing);
            }
            let id = index
                .get(TaxonomyKind::Feature, &existing)
                .map(|entry| entry.id)
                .ok_or_else(|| TaxonomyError::NotProvisioned(vec![existing.clone()]))?;
            self.fill_missing_label(index, TaxonomyKind::Feature, &existing, &target)
                .await;
            return Ok(id);
        }

        let source_locale = self.settings.source_locale.clone();
        let target_locale = self.settings.target_locale.clone();
        let created = self
            .store
            .create_entry(TaxonomyKind::Feature, &source_locale, source_label)
            .await?;

        let mut entry = TaxonomyEntry::new(key.to_string(), created.id, created.external_id)
            .with_label(&source_locale, source_label);
        match self
            .store
            .put_locale_label(
                TaxonomyKind::Feature,
                &entry.external_id,
                &target_locale,
                &target,
            )
            .await
        {
            Ok(()) => {
                entry.labels.insert(target_locale, target.clone());
            }
            Err(e) => {
                warn!(
                    "Created feature '{}' but failed to add its {} label: {}",
                    source_label, target_locale, e
                );
                self.notes.push(ResolutionNote::LocalizationIncomplete {
                    kind: TaxonomyKind::Feature,
                    key: key.to_string(),
                    locale: target_locale,
                    reason: e.to_string(),
                });
            }
        }

        let id = entry.id;
        index.insert(TaxonomyKind::Feature, entry);
        info!("Created new feature: {} ({})", source_label, target);
        Ok(id)
    }

    /// Writes the target-locale label of an existing entry when it has none.
    /// Failure leaves the entry usable and is only noted.
    async fn fill_missing_label(
        &mut self,
        index: &mut TaxonomyIndex,
        kind: TaxonomyKind,
        key: &str,
        label: &str,
    ) {
        let target_locale = self.settings.target_locale.clone();
        let Some(entry) = index.get_mut(kind, key) else {
            return;
        };
        if entry.label(&target_locale).is_some() {
            return;
        }

        match self
            .store
            .put_locale_label(kind, &entry.external_id, &target_locale, label)
            .await
        {
            Ok(()) => {
                info!("Added {} label '{}' to {} '{}'", target_locale, label, kind, key);
                entry.labels.insert(target_locale, label.to_string());
            }
            Err(e) => {
                warn!("Failed to add {} label to {} '{}': {}", target_locale, kind, key, e);
                self.notes.push(ResolutionNote::LocalizationIncomplete {
                    kind,
                    key: key.to_string(),
                    locale: target_locale,
                    reason: e.to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::store::memory::MemoryStore;

    async fn provisioned() -> (MemoryStore, TaxonomyIndex) {
        let store = MemoryStore::new();
        store.seed_categories();
        let index = TaxonomyIndex::load(&store, "es", "en").await.unwrap();
        (store, index)
    }

    fn category_id(index: &TaxonomyIndex, category: CanonicalCategory) -> TaxonomyId {
        index
            .get(TaxonomyKind::Category, category.source_name())
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn every_synonym_coerces_to_its_category() {
        let (store, mut index) = provisioned().await;
        let mut resolver = TaxonomyResolver::new(&store, ResolverSettings::default());

        for &(synonym, category) in CATEGORY_SYNONYMS {
            let id = resolver
                .resolve(&mut index, TaxonomyKind::Category, synonym, "")
                .await
                .unwrap();
            assert_eq!(id, category_id(&index, category), "synonym {}", synonym);
        }
        assert_eq!(store.creates(), 0);
        assert!(resolver.take_notes().is_empty());
    }

    #[tokio::test]
    async fn documented_synonyms_map_as_expected() {
        let (store, mut index) = provisioned().await;
        let mut resolver = TaxonomyResolver::new(&store, ResolverSettings::default());

        for (label, category) in [
            ("Depto", CanonicalCategory::Apartments),
            ("rancho", CanonicalCategory::Farms),
            (" SOLAR ", CanonicalCategory::Lots),
            ("villa", CanonicalCategory::Houses),
            ("terreno", CanonicalCategory::Lots),
            ("condominio", CanonicalCategory::Apartments),
        ] {
            let id = resolver
                .resolve(&mut index, TaxonomyKind::Category, label, "")
                .await
                .unwrap();
            assert_eq!(id, category_id(&index, category), "label {}", label);
        }
    }

    #[tokio::test]
    async fn containment_and_fuzzy_category_matches() {
        let (store, _) = provisioned().await;
        let resolver = TaxonomyResolver::new(&store, ResolverSettings::default());

        assert_eq!(
            resolver.classify_category("casa adosada"),
            (CanonicalCategory::Houses, CategoryMatch::Contains)
        );
        assert_eq!(
            resolver.classify_category("ofi").0,
            CanonicalCategory::Offices
        );
        match resolver.classify_category("apartamneto") {
            (CanonicalCategory::Apartments, CategoryMatch::Fuzzy(score)) => assert!(score >= 0.7),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn unknown_category_falls_back_and_is_noted() {
        let (store, mut index) = provisioned().await;
        let settings = ResolverSettings {
            default_category: CanonicalCategory::Houses,
            ..ResolverSettings::default()
        };
        let mut resolver = TaxonomyResolver::new(&store, settings);

        let id = resolver
            .resolve(&mut index, TaxonomyKind::Category, "yate", "yacht")
            .await
            .unwrap();
        assert_eq!(id, category_id(&index, CanonicalCategory::Houses));
        assert_eq!(
            resolver.take_notes(),
            vec![ResolutionNote::CategoryFallback {
                label: "yate".into(),
                category: CanonicalCategory::Houses,
            }]
        );
    }

    #[tokio::test]
    async fn unprovisioned_category_is_fatal() {
        let store = MemoryStore::new();
        let mut index = TaxonomyIndex::new();
        let mut resolver = TaxonomyResolver::new(&store, ResolverSettings::default());

        let err = resolver
            .resolve(&mut index, TaxonomyKind::Category, "finca", "farm")
            .await
            .unwrap_err();
        assert!(matches!(err, TaxonomyError::NotProvisioned(ref m) if m == &["fincas"]));
        assert_eq!(store.creates(), 0);
    }

    #[tokio::test]
    async fn category_without_target_label_is_repaired() {
        let store = MemoryStore::new();
        for category in CanonicalCategory::ALL {
            store.seed(TaxonomyKind::Category, &[("es", category.source_name())]);
        }
        let mut index = TaxonomyIndex::load(&store, "es", "en").await.unwrap();
        let mut resolver = TaxonomyResolver::new(&store, ResolverSettings::default());

        let id = resolver
            .resolve(&mut index, TaxonomyKind::Category, "lote", "lot")
            .await
            .unwrap();
        assert_eq!(
            store.label_of(TaxonomyKind::Category, id, "en").as_deref(),
            Some("lots")
        );
        assert_eq!(
            index.get(TaxonomyKind::Category, "lotes").unwrap().label("en"),
            Some("lots")
        );
    }

    #[tokio::test]
    async fn existing_feature_is_reused_despite_dictionary_translation() {
        let store = MemoryStore::new();
        let pool = store.seed(TaxonomyKind::Feature, &[("es", "piscina")]);
        let mut index = TaxonomyIndex::load(&store, "es", "en").await.unwrap();
        let mut resolver = TaxonomyResolver::new(&store, ResolverSettings::default());

        let id = resolver
            .resolve(&mut index, TaxonomyKind::Feature, "Piscina", "pool")
            .await
            .unwrap();

        assert_eq!(id, pool);
        assert_eq!(store.creates(), 0);
        assert_eq!(store.count(TaxonomyKind::Feature), 1);
        // the dictionary only supplies the missing label text
        assert_eq!(
            store.label_of(TaxonomyKind::Feature, pool, "en").as_deref(),
            Some("swimming pool")
        );
    }

    #[tokio::test]
    async fn new_feature_gets_both_labels() {
        let store = MemoryStore::new();
        let mut index = TaxonomyIndex::new();
        let mut resolver = TaxonomyResolver::new(&store, ResolverSettings::default());

        let id = resolver
            .resolve(&mut index, TaxonomyKind::Feature, "Jacuzzi", "Jacuzzi")
            .await
            .unwrap();

        assert_eq!(store.creates(), 1);
        assert_eq!(store.label_of(TaxonomyKind::Feature, id, "es").as_deref(), Some("Jacuzzi"));
        assert_eq!(store.label_of(TaxonomyKind::Feature, id, "en").as_deref(), Some("jacuzzi"));
        assert!(resolver.take_notes().is_empty());
        assert_eq!(index.get(TaxonomyKind::Feature, "jacuzzi").unwrap().id, id);
    }

    #[tokio::test]
    async fn failed_target_label_is_a_warning_and_repaired_later() {
        let store = MemoryStore::new();
        store.fail_label_writes(1);
        let mut index = TaxonomyIndex::new();
        let mut resolver = TaxonomyResolver::new(&store, ResolverSettings::default());

        let id = resolver
            .resolve(&mut index, TaxonomyKind::Feature, "Jacuzzi", "Jacuzzi")
            .await
            .unwrap();
        let notes = resolver.take_notes();
        assert!(matches!(
            notes.as_slice(),
            [ResolutionNote::LocalizationIncomplete { key, locale, .. }] if key == "jacuzzi" && locale == "en"
        ));
        assert_eq!(store.label_of(TaxonomyKind::Feature, id, "en"), None);

        let again = resolver
            .resolve(&mut index, TaxonomyKind::Feature, "jacuzzi", "hot tub")
            .await
            .unwrap();
        assert_eq!(again, id);
        assert_eq!(store.creates(), 1);
        assert_eq!(store.label_of(TaxonomyKind::Feature, id, "en").as_deref(), Some("jacuzzi"));
        assert!(resolver.take_notes().is_empty());
    }

    #[tokio::test]
    async fn repeated_mentions_create_one_entry() {
        let store = MemoryStore::new();
        let mut index = TaxonomyIndex::new();
        let mut resolver = TaxonomyResolver::new(&store, ResolverSettings::default());

        let first = resolver
            .resolve(&mut index, TaxonomyKind::Feature, "Cuarto de servicio", "maid's room")
            .await
            .unwrap();
        let second = resolver
            .resolve(&mut index, TaxonomyKind::Feature, "cuarto de servicio ", "service room")
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(store.creates(), 1);
    }

    #[tokio::test]
    async fn resolution_is_deterministic() {
        let store = MemoryStore::new();
        let terraza = store.seed(TaxonomyKind::Feature, &[("es", "terraza"), ("en", "terrace")]);
        store.seed(TaxonomyKind::Feature, &[("es", "terrazas"), ("en", "terraces")]);
        let index = TaxonomyIndex::load(&store, "es", "en").await.unwrap();

        // 0.875 against both keys with equal shared prefixes
        let mut ids = Vec::new();
        for _ in 0..2 {
            let mut fresh = index.clone();
            let mut resolver = TaxonomyResolver::new(&store, ResolverSettings::default());
            ids.push(
                resolver
                    .resolve(&mut fresh, TaxonomyKind::Feature, "Terrazaz ", "terrace")
                    .await
                    .unwrap(),
            );
        }
        assert_eq!(ids[0], ids[1]);
        assert_eq!(ids[0], terraza);
        assert_eq!(store.creates(), 0);
    }

    #[tokio::test]
    async fn fuzzy_threshold_is_inclusive() {
        let store = MemoryStore::new();
        let patio = store.seed(TaxonomyKind::Feature, &[("es", "patio"), ("en", "patio")]);
        let mut index = TaxonomyIndex::load(&store, "es", "en").await.unwrap();
        let mut resolver = TaxonomyResolver::new(&store, ResolverSettings::default());

        // one substitution over five characters scores exactly 0.8
        let id = resolver
            .resolve(&mut index, TaxonomyKind::Feature, "patia", "patio")
            .await
            .unwrap();
        assert_eq!(id, patio);
        assert_eq!(store.creates(), 0);
    }

    #[tokio::test]
    async fn below_threshold_creates_new_entry() {
        let store = MemoryStore::new();
        let gym = store.seed(TaxonomyKind::Feature, &[("es", "gyms"), ("en", "gyms")]);
        let mut index = TaxonomyIndex::load(&store, "es", "en").await.unwrap();
        let mut resolver = TaxonomyResolver::new(&store, ResolverSettings::default());

        // 0.75 against "gyms"
        let id = resolver
            .resolve(&mut index, TaxonomyKind::Feature, "gym", "gym")
            .await
            .unwrap();
        assert_ne!(id, gym);
        assert_eq!(store.creates(), 1);
    }

    #[tokio::test]
    async fn raised_threshold_rejects_former_match() {
        let store = MemoryStore::new();
        store.seed(TaxonomyKind::Feature, &[("es", "patio"), ("en", "patio")]);
        let mut index = TaxonomyIndex::load(&store, "es", "en").await.unwrap();
        let settings = ResolverSettings {
            feature_threshold: 0.81,
            ..ResolverSettings::default()
        };
        let mut resolver = TaxonomyResolver::new(&store, settings);

        resolver
            .resolve(&mut index, TaxonomyKind::Feature, "patia", "patio")
            .await
            .unwrap();
        assert_eq!(store.creates(), 1);
    }

    #[tokio::test]
    async fn fuzzy_match_widens_beyond_first_word() {
        let store = MemoryStore::new();
        let view = store.seed(TaxonomyKind::Feature, &[("es", "vista al mar"), ("en", "ocean view")]);
        let mut index = TaxonomyIndex::load(&store, "es", "en").await.unwrap();
        let mut resolver = TaxonomyResolver::new(&store, ResolverSettings::default());

        // "bista" shares no first word with any key
        let id = resolver
            .resolve(&mut index, TaxonomyKind::Feature, "bista al mar", "sea view")
            .await
            .unwrap();
        assert_eq!(id, view);
    }

    #[tokio::test]
    async fn empty_label_is_rejected_without_side_effects() {
        let store = MemoryStore::new();
        let mut index = TaxonomyIndex::new();
        let mut resolver = TaxonomyResolver::new(&store, ResolverSettings::default());

        for label in ["", "   ", "--"] {
            let err = resolver
                .resolve(&mut index, TaxonomyKind::Feature, label, "x")
                .await
                .unwrap_err();
            assert!(matches!(err, TaxonomyError::Validation { .. }));
        }
        assert_eq!(store.creates(), 0);
        assert_eq!(index.len(TaxonomyKind::Feature), 0);
    }

    #[tokio::test]
    async fn failed_create_leaves_index_untouched() {
        let store = MemoryStore::new();
        store.fail_creates(true);
        let mut index = TaxonomyIndex::new();
        let mut resolver = TaxonomyResolver::new(&store, ResolverSettings::default());

        let err = resolver
            .resolve(&mut index, TaxonomyKind::Feature, "Sauna", "sauna")
            .await
            .unwrap_err();
        assert!(matches!(err, TaxonomyError::PersistenceUnavailable(_)));
        assert!(!index.contains(TaxonomyKind::Feature, "sauna"));

        store.fail_creates(false);
        resolver
            .resolve(&mut index, TaxonomyKind::Feature, "Sauna", "sauna")
            .await
            .unwrap();
        assert_eq!(store.creates(), 1);
    }
}
