// Attaches `{documentId}-{n}.{ext}` files from a directory to a property
use crate::cms::ImageStore;
use crate::model::{ImageError, StoreError, UploadedFile};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub name: String,
    pub path: PathBuf,
    pub index: u32,
    pub content_type: &'static str,
}

fn content_type(extension: &str) -> Option<&'static str> {
    match extension.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

/// Parses `{document_id}-{index}.{ext}`; anything else is not ours.
fn parse_name(document_id: &str, name: &str) -> Option<(u32, &'static str)> {
    let rest = name.strip_prefix(document_id)?.strip_prefix('-')?;
    let (index, extension) = rest.split_once('.')?;
    if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((index.parse().ok()?, content_type(extension)?))
}

/// Images in `dir` named after `document_id`, ordered by index.
pub fn find_images(document_id: &str, dir: &Path) -> Result<Vec<ImageFile>, ImageError> {
    if !dir.is_dir() {
        return Err(ImageError::NotADirectory(dir.display().to_string()));
    }
    let entries = fs::read_dir(dir).map_err(|source| ImageError::Io {
        path: dir.display().to_string(),
        source,
    })?;

    let mut images: Vec<ImageFile> = entries
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let name = entry.file_name().into_string().ok()?;
            let (index, content_type) = parse_name(document_id, &name)?;
            Some(ImageFile {
                path: entry.path(),
                name,
                index,
                content_type,
            })
        })
        .collect();
    images.sort_by_key(|image| image.index);
    Ok(images)
}

#[derive(Debug, Default)]
pub struct UploadReport {
    pub found: usize,
    pub uploaded: Vec<UploadedFile>,
    /// Files the media library already had under the same name.
    pub skipped: Vec<UploadedFile>,
    pub failed: Vec<(String, ImageError)>,
    /// Locale and image count after linking.
    pub linked: Vec<(String, usize)>,
    pub unlinked: Vec<(String, StoreError)>,
}

impl UploadReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.unlinked.is_empty()
    }

    pub fn log_summary(&self) {
        info!(
            "Images: {} found, {} uploaded, {} already present, {} failed",
            self.found,
            self.uploaded.len(),
            self.skipped.len(),
            self.failed.len()
        );
        for (locale, total) in &self.linked {
            info!("  {}: {} images linked", locale, total);
        }
        for (name, e) in &self.failed {
            error!("  {}: {}", name, e);
        }
        for (locale, e) in &self.unlinked {
            error!("  {} not updated: {}", locale, e);
        }
    }
}

/// Uploads the property's images and appends them to its `images` relation in
/// both locales. Files already in the media library are reused, not uploaded.
pub async fn upload_images<S>(
    store: &S,
    document_id: &str,
    dir: &Path,
    source_locale: &str,
    target_locale: &str,
) -> Result<UploadReport, ImageError>
where
    S: ImageStore + ?Sized,
{
    let images = find_images(document_id, dir)?;

    let Some(source_images) = store.property_images(document_id, source_locale).await? else {
        return Err(ImageError::PropertyNotFound {
            document_id: document_id.to_string(),
            locale: source_locale.to_string(),
        });
    };
    let mut locales = vec![(source_locale, source_images)];
    match store.property_images(document_id, target_locale).await {
        Ok(Some(target_images)) => locales.push((target_locale, target_images)),
        Ok(None) => warn!(
            "Property {} has no {} entry, images only go to {}",
            document_id, target_locale, source_locale
        ),
        Err(e) => warn!("Could not read {} images of {}: {}", target_locale, document_id, e),
    }

    let mut report = UploadReport {
        found: images.len(),
        ..UploadReport::default()
    };
    if images.is_empty() {
        warn!("No images named {}-<n>.<ext> in {}", document_id, dir.display());
        return Ok(report);
    }
    info!("Found {} images for {}", images.len(), document_id);

    let library = store.uploaded_files().await.unwrap_or_else(|e| {
        warn!("Could not list existing uploads, uploading everything: {}", e);
        Vec::new()
    });

    let mut attached = Vec::with_capacity(images.len());
    for image in &images {
        if let Some(existing) = library.iter().find(|f| f.name == image.name) {
            info!("Skipping {} (already uploaded as {})", image.name, existing.id);
            attached.push(existing.id);
            report.skipped.push(existing.clone());
            continue;
        }

        let bytes = match tokio::fs::read(&image.path).await {
            Ok(bytes) => bytes,
            Err(source) => {
                error!("Cannot read {}: {}", image.path.display(), source);
                let path = image.path.display().to_string();
                report.failed.push((image.name.clone(), ImageError::Io { path, source }));
                continue;
            }
        };
        info!("Uploading {}", image.name);
        match store.upload_file(&image.name, image.content_type, bytes).await {
            Ok(file) => {
                info!("Uploaded {} (id {})", image.name, file.id);
                attached.push(file.id);
                report.uploaded.push(file);
            }
            Err(e) => {
                error!("Failed to upload {}: {}", image.name, e);
                report.failed.push((image.name.clone(), e.into()));
            }
        }
    }

    if attached.is_empty() {
        return Ok(report);
    }

    for (locale, existing) in locales {
        let mut merged = existing;
        let before = merged.len();
        for id in &attached {
            if !merged.contains(id) {
                merged.push(*id);
            }
        }
        if merged.len() == before {
            info!("{} images of {} already linked", locale, document_id);
            report.linked.push((locale.to_string(), merged.len()));
            continue;
        }
        match store.set_property_images(document_id, locale, &merged).await {
            Ok(()) => {
                info!(
                    "Linked {} new images to {} ({} total)",
                    merged.len() - before,
                    locale,
                    merged.len()
                );
                report.linked.push((locale.to_string(), merged.len()));
            }
            Err(e) => {
                error!("Failed to link images to {} in {}: {}", document_id, locale, e);
                report.unlinked.push((locale.to_string(), e));
            }
        }
    }

    Ok(report)
}
