use crate::model::{StoreError, TaxonomyId, TaxonomyKind};

/// One locale's view of a taxonomy entry as the backing store returns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredLabel {
    pub id: TaxonomyId,
    pub external_id: String,
    pub label: String,
}

/// Persistence collaborator for categories and features.
#[async_trait::async_trait]
pub trait TaxonomyStore: Send + Sync {
    /// Bulk-lists every entry of `kind` in `locale`.
    async fn list_labels(
        &self,
        kind: TaxonomyKind,
        locale: &str,
    ) -> Result<Vec<StoredLabel>, StoreError>;

    /// Creates a new entry carrying only its `locale` label.
    async fn create_entry(
        &self,
        kind: TaxonomyKind,
        locale: &str,
        label: &str,
    ) -> Result<StoredLabel, StoreError>;

    /// Adds or replaces the `locale` label of an existing entry.
    async fn put_locale_label(
        &self,
        kind: TaxonomyKind,
        external_id: &str,
        locale: &str,
        label: &str,
    ) -> Result<(), StoreError>;
}
