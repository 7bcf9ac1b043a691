// Strapi request and response bodies
use crate::model::{
    Characteristic, Currency, ListingDraft, PropertyType, StoreError, TaxonomyId, TaxonomyKind,
    UploadedFile,
};
use crate::utils::slugify;
use crate::taxonomy::StoredLabel;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `{ "data": ..., "meta": ... }` wrapper around every Strapi response.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
    #[serde(default)]
    pub meta: Meta,
}

#[derive(Debug, Default, Deserialize)]
pub struct Meta {
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page_count: u32,
}

/// Entry as returned by Strapi v5 (flat) or v4 (`attributes` wrapper).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEntry {
    pub id: TaxonomyId,
    pub document_id: Option<String>,
    pub name: Option<String>,
    pub attributes: Option<Value>,
}

impl RawEntry {
    fn attribute(&self, key: &str) -> Option<String> {
        self.attributes
            .as_ref()
            .and_then(|a| a.get(key))
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    /// Stable id for locale writes; v4 entries only have the numeric id.
    pub fn external_id(&self) -> String {
        self.document_id
            .clone()
            .or_else(|| self.attribute("documentId"))
            .unwrap_or_else(|| self.id.to_string())
    }

    pub fn into_label(self) -> Result<StoredLabel, StoreError> {
        let external_id = self.external_id();
        let label = self
            .name
            .clone()
            .or_else(|| self.attribute("name"))
            .ok_or_else(|| StoreError::Decode(format!("entry {} has no name", self.id)))?;
        Ok(StoredLabel {
            id: self.id,
            external_id,
            label,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct MediaRef {
    pub id: u64,
}

/// Property fetched with `populate=images`.
#[derive(Debug, Deserialize)]
pub struct PropertyImages {
    #[serde(default)]
    pub images: Option<Vec<MediaRef>>,
}

impl PropertyImages {
    pub fn ids(self) -> Vec<u64> {
        self.images.unwrap_or_default().into_iter().map(|m| m.id).collect()
    }
}

/// `/api/upload/files` answers with a bare array; some setups wrap it in `data`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum FileList {
    Plain(Vec<UploadedFile>),
    Wrapped { data: Vec<UploadedFile> },
}

impl FileList {
    pub fn into_files(self) -> Vec<UploadedFile> {
        match self {
            FileList::Plain(files) | FileList::Wrapped { data: files } => files,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ImagesPayload<'a> {
    pub images: &'a [u64],
}

#[derive(Debug, Serialize)]
pub struct DataBody<T> {
    pub data: T,
}

/// Taxonomy entry body. `locale` is only sent on create; locale writes carry
/// it in the query string.
#[derive(Debug, Serialize)]
pub struct TaxonomyPayload<'a> {
    pub name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

impl<'a> TaxonomyPayload<'a> {
    pub fn new(kind: TaxonomyKind, name: &'a str) -> Self {
        Self {
            name,
            locale: None,
            slug: (kind == TaxonomyKind::Category).then(|| slugify(name)),
        }
    }

    pub fn with_locale(mut self, locale: &'a str) -> Self {
        self.locale = Some(locale);
        self
    }
}

#[derive(Debug, Serialize)]
pub struct CharacteristicPayload<'a> {
    pub label: &'a str,
    pub value: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub suffix: &'a str,
}

impl<'a> From<&'a Characteristic> for CharacteristicPayload<'a> {
    fn from(c: &'a Characteristic) -> Self {
        Self {
            label: &c.label,
            value: &c.value,
            suffix: &c.suffix,
        }
    }
}

/// One locale of a property record. Numbers and relations always come from
/// the source-locale draft so both locales agree.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyPayload<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub address: &'a str,
    pub price: f64,
    pub currency: Currency,
    pub bedrooms: u32,
    pub bathrooms: f64,
    pub property_type: PropertyType,
    pub category: TaxonomyId,
    pub features: &'a [TaxonomyId],
    pub characteristics: Vec<CharacteristicPayload<'a>>,
    pub is_featured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
}

impl<'a> PropertyPayload<'a> {
    pub fn new(
        texts: &'a ListingDraft,
        numbers: &'a ListingDraft,
        category: TaxonomyId,
        features: &'a [TaxonomyId],
    ) -> Self {
        Self {
            title: &texts.title,
            description: &texts.description,
            address: &texts.address,
            price: numbers.price,
            currency: numbers.currency,
            bedrooms: numbers.bedrooms,
            bathrooms: numbers.bathrooms,
            property_type: numbers.property_type,
            category,
            features,
            characteristics: texts.characteristics.iter().map(Into::into).collect(),
            is_featured: false,
            locale: None,
            published_at: None,
        }
    }

    pub fn with_locale(mut self, locale: &'a str) -> Self {
        self.locale = Some(locale);
        self
    }

    pub fn published_now(mut self) -> Self {
        self.published_at = Some(chrono::Utc::now().to_rfc3339());
        self
    }
}
