pub mod client;
pub mod payload;

pub use client::CmsClient;

use crate::model::{BilingualListing, CreatedProperty, StoreError, TaxonomyId, UploadedFile};

/// Writes finished listings into the CMS.
#[async_trait::async_trait]
pub trait PropertyStore: Send + Sync {
    /// Creates the source-locale record, then attaches the target-locale texts.
    /// A failed localization is reported through `CreatedProperty::localized`.
    async fn create_property(
        &self,
        listing: &BilingualListing,
        category: TaxonomyId,
        features: &[TaxonomyId],
    ) -> Result<CreatedProperty, StoreError>;
}

/// Media library access and the `images` relation of a property.
#[async_trait::async_trait]
pub trait ImageStore: Send + Sync {
    /// Image ids attached to the property in `locale`, or `None` when the
    /// property has no entry in that locale.
    async fn property_images(
        &self,
        document_id: &str,
        locale: &str,
    ) -> Result<Option<Vec<u64>>, StoreError>;

    async fn uploaded_files(&self) -> Result<Vec<UploadedFile>, StoreError>;

    async fn upload_file(
        &self,
        name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadedFile, StoreError>;

    /// Replaces the `images` relation of the property in `locale`.
    async fn set_property_images(
        &self,
        document_id: &str,
        locale: &str,
        images: &[u64],
    ) -> Result<(), StoreError>;
}
