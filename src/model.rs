// Core structs: ScrapedPage, ListingDraft, taxonomy kinds, error enums
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Identifier the CMS assigns to a taxonomy entry when it is created.
pub type TaxonomyId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaxonomyKind {
    Category,
    Feature,
}

impl TaxonomyKind {
    /// REST collection name of this kind in the CMS.
    pub fn collection(self) -> &'static str {
        match self {
            TaxonomyKind::Category => "categories",
            TaxonomyKind::Feature => "features",
        }
    }
}

impl fmt::Display for TaxonomyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaxonomyKind::Category => write!(f, "category"),
            TaxonomyKind::Feature => write!(f, "feature"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    #[default]
    Sale,
    Rent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Pab,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Characteristic {
    pub key: String,
    pub label: String,
    pub value: String,
    pub suffix: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

impl Location {
    /// "neighborhood, city, country" with the missing parts left out.
    pub fn joined(&self) -> String {
        [&self.neighborhood, &self.city, &self.country]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Text and hints pulled out of a listing page before it is handed to the LLM.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScrapedPage {
    pub url: String,
    pub title: String,
    pub description: String,
    pub price: String,
    pub features: Vec<String>,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<SiteDetails>,
}

/// Fields a site-specific parser could read directly from the markup.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SiteDetails {
    pub site: String,
    pub price: Option<u64>,
    pub currency: Currency,
    pub location: String,
    pub bedrooms: u32,
    pub bathrooms: f64,
    pub area: Option<f64>,
    pub characteristics: Vec<Characteristic>,
    pub images: Vec<String>,
    pub property_type: PropertyType,
    pub category: String,
}

/// A property description after the LLM output passed schema validation.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingDraft {
    pub title: String,
    pub description: String,
    pub address: String,
    pub price: f64,
    pub currency: Currency,
    pub bedrooms: u32,
    pub bathrooms: f64,
    pub property_type: PropertyType,
    pub category: String,
    pub features: Vec<String>,
    pub characteristics: Vec<Characteristic>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BilingualListing {
    pub source: ListingDraft,
    pub target: ListingDraft,
    /// False when translation failed and `target` is a copy of `source`.
    pub translated: bool,
}

impl BilingualListing {
    /// Target-locale label for the feature at `index`, falling back to the source label.
    pub fn target_feature(&self, index: usize) -> &str {
        self.target
            .features
            .get(index)
            .or_else(|| self.source.features.get(index))
            .map(String::as_str)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreatedProperty {
    pub id: u64,
    pub document_id: String,
    pub title: String,
    pub localized: bool,
}

/// A file in the CMS media library.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UploadedFile {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("http error: {0}")]
    HttpError(String),
    #[error("request timed out")]
    Timeout,
    #[error("unexpected response status {0}")]
    InvalidResponse(u16),
}

impl From<reqwest::Error> for ScraperError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ScraperError::Timeout
        } else {
            ScraperError::HttpError(e.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("invalid selector: {0}")]
    HtmlParseError(String),
    #[error("page has no usable {0}")]
    MissingField(&'static str),
}

#[derive(Debug, Error)]
pub enum AiError {
    #[error("model request failed: {0}")]
    Http(String),
    #[error("model API responded {status}: {body}")]
    Status { status: u16, body: String },
    #[error("model returned no text")]
    EmptyResponse,
    #[error("no JSON object found in model response")]
    NoJson,
    #[error("malformed JSON from model: {0}")]
    Json(#[from] serde_json::Error),
    #[error("listing failed validation: {0}")]
    Schema(String),
}

impl From<reqwest::Error> for AiError {
    fn from(e: reqwest::Error) -> Self {
        AiError::Http(e.to_string())
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("CMS request failed: {0}")]
    Http(String),
    #[error("CMS responded {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected CMS payload: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            StoreError::Decode(e.to_string())
        } else {
            StoreError::Http(e.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum TaxonomyError {
    #[error("invalid {kind} label {label:?}: {reason}")]
    Validation {
        kind: TaxonomyKind,
        label: String,
        reason: &'static str,
    },
    #[error("canonical categories missing from the CMS: {}", .0.join(", "))]
    NotProvisioned(Vec<String>),
    #[error("taxonomy store unavailable: {0}")]
    PersistenceUnavailable(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("not a directory: {0}")]
    NotADirectory(String),
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("property {document_id} not found in locale {locale}")]
    PropertyNotFound { document_id: String, locale: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}
