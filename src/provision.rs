// Creates the canonical categories the resolver depends on
use crate::model::{StoreError, TaxonomyKind};
use crate::taxonomy::{CanonicalCategory, TaxonomyEntry, TaxonomyIndex, TaxonomyStore};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

#[derive(Debug, Default)]
pub struct ProvisionReport {
    pub created: Vec<CanonicalCategory>,
    pub existing: Vec<CanonicalCategory>,
    pub failed: Vec<(CanonicalCategory, StoreError)>,
    /// Categories whose target-locale label could not be written.
    pub unlocalized: Vec<CanonicalCategory>,
}

impl ProvisionReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn log_summary(&self) {
        info!(
            "Categories: {} created, {} already present, {} failed",
            self.created.len(),
            self.existing.len(),
            self.failed.len()
        );
        for (category, e) in &self.failed {
            error!("  {}: {}", category, e);
        }
        for category in &self.unlocalized {
            warn!("  {} has no translated label", category);
        }
    }
}

/// Ensures every canonical category exists in `source_locale` and carries its
/// `target_locale` label. Entries already in `index` are not created again.
pub async fn provision_categories<S>(
    store: &S,
    index: &mut TaxonomyIndex,
    source_locale: &str,
    target_locale: &str,
    pause: Duration,
) -> ProvisionReport
where
    S: TaxonomyStore + ?Sized,
{
    let mut report = ProvisionReport::default();

    for (i, category) in CanonicalCategory::ALL.into_iter().enumerate() {
        if i > 0 && !pause.is_zero() {
            sleep(pause).await;
        }
        let key = category.source_name();

        let external_id = match index.get(TaxonomyKind::Category, key) {
            Some(entry) => {
                info!("Category {} already exists", key);
                report.existing.push(category);
                if entry.label(target_locale).is_some() {
                    continue;
                }
                info!("Category {} has no {} label yet", key, target_locale);
                entry.external_id.clone()
            }
            None => {
                info!("Creating category: {}", key);
                match store.create_entry(TaxonomyKind::Category, source_locale, key).await {
                    Ok(stored) => {
                        let entry = TaxonomyEntry::new(key.to_string(), stored.id, stored.external_id)
                            .with_label(source_locale, key);
                        let external_id = entry.external_id.clone();
                        index.insert(TaxonomyKind::Category, entry);
                        report.created.push(category);
                        external_id
                    }
                    Err(e) => {
                        error!("Error creating category {}: {}", key, e);
                        report.failed.push((category, e));
                        continue;
                    }
                }
            }
        };

        match store
            .put_locale_label(TaxonomyKind::Category, &external_id, target_locale, category.target_name())
            .await
        {
            Ok(()) => {
                info!("Added {} label: {}", target_locale, category.target_name());
                if let Some(entry) = index.get_mut(TaxonomyKind::Category, key) {
                    entry
                        .labels
                        .insert(target_locale.to_string(), category.target_name().to_string());
                }
            }
            Err(e) => {
                warn!("Category {} has no {} label: {}", key, target_locale, e);
                report.unlocalized.push(category);
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::store::memory::MemoryStore;

    #[tokio::test]
    async fn provisions_empty_store() {
        let store = MemoryStore::new();
        let mut index = TaxonomyIndex::new();

        let report = provision_categories(&store, &mut index, "es", "en", Duration::ZERO).await;

        assert_eq!(report.created.len(), 5);
        assert!(report.is_complete());
        assert!(index.ensure_provisioned().is_ok());
        let houses = index.get(TaxonomyKind::Category, "casas").unwrap();
        assert_eq!(houses.label("en"), Some("houses"));
        assert_eq!(store.label_of(TaxonomyKind::Category, houses.id, "en").as_deref(), Some("houses"));
    }

    #[tokio::test]
    async fn rerun_creates_nothing() {
        let store = MemoryStore::new();
        store.seed_categories();
        let mut index = TaxonomyIndex::load(&store, "es", "en").await.unwrap();

        let report = provision_categories(&store, &mut index, "es", "en", Duration::ZERO).await;

        assert!(report.created.is_empty());
        assert_eq!(report.existing.len(), 5);
        assert_eq!(store.creates(), 0);
        assert_eq!(store.label_writes(), 0);
        assert_eq!(store.count(TaxonomyKind::Category), 5);
    }

    #[tokio::test]
    async fn fills_missing_translation_of_existing_category() {
        let store = MemoryStore::new();
        let lots = store.seed(TaxonomyKind::Category, &[("es", "lotes")]);
        let mut index = TaxonomyIndex::load(&store, "es", "en").await.unwrap();

        let report = provision_categories(&store, &mut index, "es", "en", Duration::ZERO).await;

        assert_eq!(report.existing, vec![CanonicalCategory::Lots]);
        assert_eq!(report.created.len(), 4);
        assert_eq!(store.label_of(TaxonomyKind::Category, lots, "en").as_deref(), Some("lots"));
    }

    #[tokio::test]
    async fn failures_are_reported() {
        let store = MemoryStore::new();
        store.fail_creates(true);
        let mut index = TaxonomyIndex::new();

        let report = provision_categories(&store, &mut index, "es", "en", Duration::ZERO).await;

        assert_eq!(report.failed.len(), 5);
        assert!(!report.is_complete());
        assert!(index.ensure_provisioned().is_err());

        store.fail_creates(false);
        store.fail_label_writes(1);
        let report = provision_categories(&store, &mut index, "es", "en", Duration::ZERO).await;
        assert_eq!(report.created.len(), 5);
        assert_eq!(report.unlocalized, vec![CanonicalCategory::Apartments]);
    }
}
