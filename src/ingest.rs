// Sequential batch runner: source -> listing -> taxonomy ids -> CMS property
use crate::ai::structuring::{structure_listing, translate_listing};
use crate::ai::LanguageModel;
use crate::cms::PropertyStore;
use crate::config::AppConfig;
use crate::model::{
    AiError, CreatedProperty, ParserError, ScraperError, StoreError, TaxonomyError, TaxonomyId,
    TaxonomyKind,
};
use crate::parser::parse_page;
use crate::scraper::Scraper;
use crate::source::Source;
use crate::taxonomy::{ResolutionNote, ResolverSettings, TaxonomyIndex, TaxonomyResolver, TaxonomyStore};
use crate::utils::{slugify, truncate_chars};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("scrape failed: {0}")]
    Scrape(#[from] ScraperError),
    #[error("page parse failed: {0}")]
    Parse(#[from] ParserError),
    #[error("structuring failed: {0}")]
    Structure(#[from] AiError),
    #[error("category resolution failed: {0}")]
    Category(TaxonomyError),
    #[error("property creation failed: {0}")]
    Create(#[from] StoreError),
}

impl IngestError {
    pub fn stage(&self) -> &'static str {
        match self {
            IngestError::Scrape(_) => "scrape",
            IngestError::Parse(_) => "parse",
            IngestError::Structure(_) => "structure",
            IngestError::Category(_) => "category",
            IngestError::Create(_) => "create",
        }
    }
}

#[derive(Debug, Clone)]
pub struct IngestSettings {
    pub delay_between_sources: Duration,
    pub max_content_length: usize,
    pub debug_html_dir: Option<PathBuf>,
}

impl IngestSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            delay_between_sources: Duration::from_millis(config.delay_between_sources_ms),
            max_content_length: config.max_content_length,
            debug_html_dir: config.debug_html_dir.as_ref().map(PathBuf::from),
        }
    }
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub succeeded: Vec<(String, CreatedProperty)>,
    pub failed: Vec<(String, IngestError)>,
    pub notes: Vec<(String, ResolutionNote)>,
}

impl RunReport {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// True when there was work to do and none of it succeeded.
    pub fn all_failed(&self) -> bool {
        self.succeeded.is_empty() && !self.failed.is_empty()
    }

    pub fn log_summary(&self) {
        info!("Processing summary ({} sources):", self.total());
        info!("Successful: {}", self.succeeded.len());
        info!("Failed: {}", self.failed.len());

        for (source, property) in &self.succeeded {
            let localized = if property.localized { "" } else { " (no translation stored)" };
            info!(
                "  {} -> property {} ({}) '{}'{}",
                source, property.id, property.document_id, property.title, localized
            );
        }
        for (i, (source, err)) in self.failed.iter().enumerate() {
            error!("  {}. {} [{}]: {}", i + 1, source, err.stage(), err);
        }
        if !self.notes.is_empty() {
            warn!("Taxonomy notes:");
            for (source, note) in &self.notes {
                warn!("  {}: {}", source, note);
            }
        }
    }
}

pub struct Ingestor<'a, C: ?Sized> {
    scraper: &'a dyn Scraper,
    model: &'a dyn LanguageModel,
    cms: &'a C,
    resolver: TaxonomyResolver<'a, C>,
    settings: IngestSettings,
}

impl<'a, C> Ingestor<'a, C>
where
    C: TaxonomyStore + PropertyStore + ?Sized,
{
    pub fn new(
        scraper: &'a dyn Scraper,
        model: &'a dyn LanguageModel,
        cms: &'a C,
        resolver_settings: ResolverSettings,
        settings: IngestSettings,
    ) -> Self {
        Self {
            scraper,
            model,
            cms,
            resolver: TaxonomyResolver::new(cms, resolver_settings),
            settings,
        }
    }

    /// Processes `sources` one after another. A failing source is recorded and the
    /// batch moves on.
    pub async fn run(&mut self, index: &mut TaxonomyIndex, sources: &[Source]) -> RunReport {
        let mut report = RunReport::default();
        info!("Processing {} property sources...", sources.len());

        for (i, source) in sources.iter().enumerate() {
            let name = source.to_string();
            info!("[{}/{}] Processing {}", i + 1, sources.len(), name);

            match self.process(index, source).await {
                Ok(created) => {
                    info!("Source processed successfully");
                    report.succeeded.push((name.clone(), created));
                }
                Err(e) => {
                    error!("Error processing source [{}]: {}", e.stage(), e);
                    report.failed.push((name.clone(), e));
                }
            }
            for note in self.resolver.take_notes() {
                report.notes.push((name.clone(), note));
            }

            if i + 1 < sources.len() && !self.settings.delay_between_sources.is_zero() {
                sleep(self.settings.delay_between_sources).await;
            }
        }

        report
    }

    async fn listing_input(&self, source: &Source) -> Result<String, IngestError> {
        match source {
            Source::Text { body, .. } => Ok(body.clone()),
            Source::Url(url) => {
                let html = self.scraper.fetch(url).await?;
                let page = match parse_page(&html, url, self.settings.max_content_length) {
                    Ok(page) => page,
                    Err(e) => {
                        self.save_debug_html(&html, url);
                        return Err(e.into());
                    }
                };
                Ok(serde_json::to_string_pretty(&page).map_err(AiError::from)?)
            }
        }
    }

    async fn process(
        &mut self,
        index: &mut TaxonomyIndex,
        source: &Source,
    ) -> Result<CreatedProperty, IngestError> {
        let input = self.listing_input(source).await?;

        let (source_locale, target_locale) = {
            let s = self.resolver.settings();
            (s.source_locale.clone(), s.target_locale.clone())
        };
        let draft = structure_listing(self.model, &input, &source_locale).await?;
        let listing = translate_listing(self.model, draft, &source_locale, &target_locale).await;

        let category_label = if listing.source.category.trim().is_empty() {
            let fallback = self.resolver.settings().default_category;
            warn!("Listing has no category, using '{}'", fallback);
            self.resolver.note(ResolutionNote::CategoryFallback {
                label: String::new(),
                category: fallback,
            });
            fallback.source_name().to_string()
        } else {
            listing.source.category.clone()
        };
        let category = match self
            .resolver
            .resolve(index, TaxonomyKind::Category, &category_label, &listing.target.category)
            .await
        {
            Ok(id) => id,
            Err(TaxonomyError::Validation { label, reason, .. }) => {
                let fallback = self.resolver.settings().default_category;
                warn!("Category '{}' is unusable ({}), using '{}'", label, reason, fallback);
                self.resolver.note(ResolutionNote::CategoryFallback {
                    label,
                    category: fallback,
                });
                let (source_name, target_name) = (fallback.source_name(), fallback.target_name());
                self.resolver
                    .resolve(index, TaxonomyKind::Category, source_name, target_name)
                    .await
                    .map_err(IngestError::Category)?
            }
            Err(e) => return Err(IngestError::Category(e)),
        };

        let mut features: Vec<TaxonomyId> = Vec::new();
        for (i, feature) in listing.source.features.iter().enumerate() {
            let target = listing.target_feature(i);
            match self
                .resolver
                .resolve(index, TaxonomyKind::Feature, feature, target)
                .await
            {
                Ok(id) if !features.contains(&id) => features.push(id),
                Ok(_) => {}
                Err(e) => {
                    warn!("Skipping feature '{}': {}", feature, e);
                    self.resolver.note(ResolutionNote::Skipped {
                        kind: TaxonomyKind::Feature,
                        label: feature.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok(self.cms.create_property(&listing, category, &features).await?)
    }

    fn save_debug_html(&self, html: &str, url: &str) {
        let Some(folder) = &self.settings.debug_html_dir else {
            return;
        };
        if let Err(e) = fs::create_dir_all(folder) {
            warn!("Failed to create debug folder: {}", e);
            return;
        }
        let slug = slugify(url);
        let filename = folder.join(format!("debug-{}.html", truncate_chars(&slug, 80)));
        if let Err(e) = fs::write(&filename, html) {
            warn!("Failed to write debug HTML: {}", e);
        } else {
            info!("Saved HTML for inspection: {}", filename.display());
        }
    }
}
