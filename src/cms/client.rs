// Strapi REST client
use crate::cms::payload::{
    DataBody, Envelope, FileList, ImagesPayload, PropertyImages, PropertyPayload, RawEntry,
    TaxonomyPayload,
};
use crate::cms::{ImageStore, PropertyStore};
use crate::model::{
    BilingualListing, CreatedProperty, StoreError, TaxonomyId, TaxonomyKind, UploadedFile,
};
use crate::taxonomy::{StoredLabel, TaxonomyStore};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct CmsClient {
    client: Client,
    base_url: String,
    token: String,
    page_size: u32,
    source_locale: String,
    target_locale: String,
}

impl CmsClient {
    pub fn new(
        base_url: &str,
        token: &str,
        timeout: Duration,
        page_size: u32,
        source_locale: &str,
        target_locale: &str,
    ) -> Result<Self, StoreError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            page_size,
            source_locale: source_locale.to_string(),
            target_locale: target_locale.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.token)
    }

    async fn checked(response: Response) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_else(|_| "unknown".into());
        warn!("CMS responded [{}]: {}", status, body);
        Err(StoreError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, StoreError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.authorized(self.client.post(self.url(path)).json(body));
        let response = Self::checked(request.send().await?).await?;
        Ok(response.json().await?)
    }

    async fn put<B>(&self, path: &str, locale: &str, body: &B) -> Result<(), StoreError>
    where
        B: Serialize + ?Sized,
    {
        let request = self.authorized(
            self.client
                .put(self.url(path))
                .query(&[("locale", locale)])
                .json(body),
        );
        Self::checked(request.send().await?).await?;
        Ok(())
    }

    /// Checks that the CMS is reachable and the token is accepted.
    pub async fn ping(&self) -> Result<(), StoreError> {
        let request = self.authorized(
            self.client
                .get(self.url("categories"))
                .query(&[("pagination[pageSize]", "1")]),
        );
        Self::checked(request.send().await?).await?;
        info!("Connected to CMS at {}", self.base_url);
        Ok(())
    }
}

#[async_trait::async_trait]
impl TaxonomyStore for CmsClient {
    async fn list_labels(
        &self,
        kind: TaxonomyKind,
        locale: &str,
    ) -> Result<Vec<StoredLabel>, StoreError> {
        let page_size = self.page_size.to_string();
        let mut labels = Vec::new();
        let mut page: u32 = 1;

        loop {
            let page_param = page.to_string();
            let request = self.authorized(self.client.get(self.url(kind.collection())).query(&[
                ("locale", locale),
                ("pagination[pageSize]", page_size.as_str()),
                ("pagination[page]", page_param.as_str()),
            ]));
            let response = Self::checked(request.send().await?).await?;
            let envelope: Envelope<Vec<RawEntry>> = response.json().await?;

            for entry in envelope.data {
                labels.push(entry.into_label()?);
            }

            match envelope.meta.pagination {
                Some(p) if page < p.page_count => page += 1,
                _ => break,
            }
        }

        debug!("Listed {} {} entries in {}", labels.len(), kind, locale);
        Ok(labels)
    }

    async fn create_entry(
        &self,
        kind: TaxonomyKind,
        locale: &str,
        label: &str,
    ) -> Result<StoredLabel, StoreError> {
        let body = DataBody {
            data: TaxonomyPayload::new(kind, label).with_locale(locale),
        };
        let envelope: Envelope<RawEntry> = self.post(kind.collection(), &body).await?;
        let stored = envelope.data.into_label()?;
        info!("Created {} '{}' (id {})", kind, stored.label, stored.id);
        Ok(stored)
    }

    async fn put_locale_label(
        &self,
        kind: TaxonomyKind,
        external_id: &str,
        locale: &str,
        label: &str,
    ) -> Result<(), StoreError> {
        let body = DataBody {
            data: TaxonomyPayload::new(kind, label),
        };
        let path = format!("{}/{}", kind.collection(), external_id);
        self.put(&path, locale, &body).await?;
        debug!("Wrote {} label '{}' for {} in {}", kind, label, external_id, locale);
        Ok(())
    }
}

#[async_trait::async_trait]
impl PropertyStore for CmsClient {
    async fn create_property(
        &self,
        listing: &BilingualListing,
        category: TaxonomyId,
        features: &[TaxonomyId],
    ) -> Result<CreatedProperty, StoreError> {
        let source = &listing.source;
        let body = DataBody {
            data: PropertyPayload::new(source, source, category, features)
                .with_locale(&self.source_locale)
                .published_now(),
        };
        let envelope: Envelope<RawEntry> = self.post("properties", &body).await?;
        let created = envelope.data;
        let document_id = created.external_id();
        info!("Property created with id {}", created.id);

        let localized_body = DataBody {
            data: PropertyPayload::new(&listing.target, source, category, features),
        };
        let path = format!("properties/{}", document_id);
        let localized = match self.put(&path, &self.target_locale, &localized_body).await {
            Ok(()) => {
                info!("Added {} localization for property {}", self.target_locale, created.id);
                true
            }
            Err(e) => {
                warn!(
                    "Property {} created but {} localization failed: {}",
                    created.id, self.target_locale, e
                );
                false
            }
        };

        Ok(CreatedProperty {
            id: created.id,
            document_id,
            title: source.title.clone(),
            localized,
        })
    }
}

#[async_trait::async_trait]
impl ImageStore for CmsClient {
    async fn property_images(
        &self,
        document_id: &str,
        locale: &str,
    ) -> Result<Option<Vec<u64>>, StoreError> {
        let request = self.authorized(
            self.client
                .get(self.url(&format!("properties/{}", document_id)))
                .query(&[("locale", locale), ("populate", "images")]),
        );
        let response = request.send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let envelope: Envelope<PropertyImages> = Self::checked(response).await?.json().await?;
        Ok(Some(envelope.data.ids()))
    }

    async fn uploaded_files(&self) -> Result<Vec<UploadedFile>, StoreError> {
        let request = self.authorized(
            self.client
                .get(self.url("upload/files"))
                .query(&[("pagination[pageSize]", "1000")]),
        );
        let files: FileList = Self::checked(request.send().await?).await?.json().await?;
        Ok(files.into_files())
    }

    async fn upload_file(
        &self,
        name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadedFile, StoreError> {
        let part = Part::bytes(bytes)
            .file_name(name.to_string())
            .mime_str(content_type)?;
        let form = Form::new().part("files", part);
        let request = self.authorized(self.client.post(self.url("upload")).multipart(form));
        let files: Vec<UploadedFile> = Self::checked(request.send().await?).await?.json().await?;
        files
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Decode(format!("upload of {} returned no file", name)))
    }

    async fn set_property_images(
        &self,
        document_id: &str,
        locale: &str,
        images: &[u64],
    ) -> Result<(), StoreError> {
        let body = DataBody {
            data: ImagesPayload { images },
        };
        self.put(&format!("properties/{}", document_id), locale, &body).await
    }
}
