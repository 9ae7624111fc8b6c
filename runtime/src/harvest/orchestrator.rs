//! Fetch orchestrator.
//!
//! Discovers the listing size, reads the selected listing pages, then runs
//! every subject through locate → fetch → parse → extract with at most
//! `max_workers` requests in flight. Only a page-count failure aborts the
//! run; page and subject failures are recorded and the run continues.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use handbook_requisites::{
    extract_constraints, InherentBoilerplate, SectionParser, SubjectRecord, SubjectStub,
};
use tracing::{debug, info, warn};
use url::Url;

use super::{FailedPage, FailedSubject, HarvestReport};
use crate::acquisition::http_client::resolve_url;
use crate::acquisition::{
    Fetcher, HarvestResult, HttpClient, ListingDiscoverer, RequirementLocator,
};
use crate::config::HarvestConfig;
use crate::progress::{Emitter, HarvestEventKind, ProgressSender};

pub struct Harvester {
    fetcher: Arc<dyn Fetcher>,
    listing: ListingDiscoverer,
    locator: RequirementLocator,
    parser: Arc<SectionParser>,
    base: Url,
    config: HarvestConfig,
    emitter: Emitter,
}

impl Harvester {
    /// Harvester over any document source. The boilerplate list is fixed for
    /// the lifetime of the harvester.
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        config: HarvestConfig,
        boilerplate: InherentBoilerplate,
    ) -> Self {
        let base = config.base_url.clone();
        Self {
            listing: ListingDiscoverer::new(fetcher.clone(), base.clone()),
            locator: RequirementLocator::new(fetcher.clone(), base.clone()),
            parser: Arc::new(SectionParser::new(boilerplate)),
            fetcher,
            base,
            config,
            emitter: Emitter::default(),
        }
    }

    /// HTTP harvester built from resolved configuration.
    pub fn from_config(config: HarvestConfig) -> HarvestResult<Self> {
        let boilerplate = config.load_boilerplate()?;
        info!(
            entries = boilerplate.len(),
            "loaded inherent requirement boilerplate"
        );
        let client = HttpClient::new(config.timeout_ms, config.max_retries);
        Ok(Self::new(Arc::new(client), config, boilerplate))
    }

    pub fn with_progress(mut self, tx: ProgressSender) -> Self {
        self.emitter = Emitter::new(Some(tx));
        self
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    /// Run a full harvest.
    pub async fn run(&self) -> HarvestResult<HarvestReport> {
        let started = Instant::now();
        let harvested_at = Utc::now();
        let workers = self.config.max_workers.max(1);

        let page_count = self.listing.page_count().await?;
        let pages = self.config.pages.clamp(page_count);
        let pages_selected = pages.clone().count() as u32;
        info!(
            page_count,
            pages = %self.config.pages,
            pages_selected,
            workers,
            "listing discovered"
        );
        self.emitter.emit(HarvestEventKind::PagesDiscovered {
            page_count,
            pages_selected,
        });

        let (stubs, failed_pages) = self.list_subjects(pages, workers).await;
        info!(
            subjects = stubs.len(),
            failed_pages = failed_pages.len(),
            "listing pages read"
        );

        let harvested: Vec<SubjectRecord> = stream::iter(stubs)
            .map(|stub| self.harvest_subject(stub))
            .buffer_unordered(workers)
            .collect()
            .await;

        let mut records = Vec::with_capacity(harvested.len());
        let mut failed_subjects = Vec::new();
        for record in harvested {
            if let Some(error) = &record.error {
                failed_subjects.push(FailedSubject {
                    code: record.code.clone(),
                    href: record.href.clone(),
                    error: error.clone(),
                });
                if !self.config.include_incomplete {
                    continue;
                }
            }
            records.push(record);
        }

        let elapsed_ms = started.elapsed().as_millis() as u64;
        self.emitter.emit(HarvestEventKind::HarvestComplete {
            subjects: records.len() as u32,
            failed: failed_subjects.len() as u32,
            elapsed_ms,
        });

        let report = HarvestReport {
            records,
            failed_subjects,
            failed_pages,
            page_count,
            elapsed_ms,
            harvested_at,
        };
        info!(
            failed_subjects = report.failed_subjects.len(),
            "{}",
            report.summary()
        );
        Ok(report)
    }

    /// Read listing pages concurrently. Stubs come back in page order; pages
    /// that fail contribute nothing.
    async fn list_subjects(
        &self,
        pages: impl Iterator<Item = u32>,
        workers: usize,
    ) -> (Vec<SubjectStub>, Vec<FailedPage>) {
        let mut listed: Vec<(u32, HarvestResult<Vec<SubjectStub>>)> = stream::iter(pages)
            .map(|page| async move { (page, self.listing.subjects_on_page(page).await) })
            .buffer_unordered(workers)
            .collect()
            .await;
        listed.sort_by_key(|(page, _)| *page);

        let mut stubs = Vec::new();
        let mut failed = Vec::new();
        for (page, result) in listed {
            match result {
                Ok(page_stubs) => {
                    debug!(page, subjects = page_stubs.len(), "listing page read");
                    self.emitter.emit(HarvestEventKind::PageListed {
                        page,
                        subjects: page_stubs.len() as u32,
                    });
                    stubs.extend(page_stubs);
                }
                Err(e) => {
                    warn!(page, error = %e, "skipping listing page");
                    self.emitter.emit(HarvestEventKind::PageFailed {
                        page,
                        message: e.to_string(),
                    });
                    failed.push(FailedPage {
                        page,
                        error: e.to_string(),
                    });
                }
            }
        }
        (stubs, failed)
    }

    /// Run one subject's pipeline. Never fails: errors are stored on the
    /// returned record.
    pub async fn harvest_subject(&self, stub: SubjectStub) -> SubjectRecord {
        let mut record = SubjectRecord::from_stub(stub);
        match self.fill_requirements(&mut record).await {
            Ok(()) => {
                debug!(
                    code = %record.code,
                    constraints = record.constraints.len(),
                    "subject harvested"
                );
                self.emitter.emit(HarvestEventKind::SubjectHarvested {
                    code: record.code.clone(),
                    constraints: record.constraints.len() as u32,
                });
            }
            Err(e) => {
                warn!(code = %record.code, href = %record.href, error = %e, "failed to harvest subject");
                self.emitter.emit(HarvestEventKind::SubjectFailed {
                    code: record.code.clone(),
                    href: record.href.clone(),
                    message: e.to_string(),
                });
                record.error = Some(e.to_string());
            }
        }
        record
    }

    async fn fill_requirements(&self, record: &mut SubjectRecord) -> HarvestResult<()> {
        let href = self.locator.locate(&record.href).await?;
        let url = resolve_url(&self.base, &href)?;
        let html = self.fetcher.fetch(&url).await?;

        let parsed = self.parser.parse_page(&html)?;
        record.last_updated = parsed.last_updated;
        record.sections = parsed.sections;
        record.constraints = extract_constraints(&record.code, &record.sections);
        Ok(())
    }
}
