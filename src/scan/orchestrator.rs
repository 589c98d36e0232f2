use crate::config::ScanConfig;
use crate::error::Result;
use crate::normalize::UrlNormalizer;
use crate::page::{self, Page};
use crate::results::{ScanProgress, ScanResult};
use crate::scan::{Bucket, HarvestOutcome, ImageLedger, PopoverHarvester, ScanOptions};
use crate::utils::short_label;
use std::collections::HashSet;
use tokio::sync::mpsc;
use tokio::time::sleep;

/// One selectable product option found on the page
#[derive(Debug, Clone)]
pub struct Variant<E> {
    pub handle: E,
    pub label: String,
    /// The page marks this option as the active one
    pub selected: bool,
}

/// The variants a scan will walk through
#[derive(Debug, Clone)]
pub enum VariantPlan<E> {
    Discovered {
        variants: Vec<Variant<E>>,
        initial_index: usize,
    },
    /// The page exposes no variants; its current state is harvested as the
    /// main variant without selecting anything.
    Implicit,
}

impl<E> VariantPlan<E> {
    /// Number of variants found on the page
    pub fn discovered(&self) -> usize {
        match self {
            VariantPlan::Discovered { variants, .. } => variants.len(),
            VariantPlan::Implicit => 0,
        }
    }

    pub fn initial_index(&self) -> usize {
        match self {
            VariantPlan::Discovered { initial_index, .. } => *initial_index,
            VariantPlan::Implicit => 0,
        }
    }
}

/// Drives a scan: finds the variants, selects each in turn and lets the
/// [`PopoverHarvester`] collect its gallery.
pub struct ScrapeOrchestrator<'a, P: Page> {
    page: &'a P,
    config: &'a ScanConfig,
    normalizer: UrlNormalizer,
    progress: Option<mpsc::Sender<ScanProgress>>,
}

impl<'a, P: Page> ScrapeOrchestrator<'a, P> {
    pub fn new(page: &'a P, config: &'a ScanConfig) -> Result<Self> {
        Ok(Self {
            page,
            config,
            normalizer: UrlNormalizer::new(&config.normalization)?,
            progress: None,
        })
    }

    /// Reports progress on `sender`; the receiver must be drained or dropped
    pub fn with_progress(mut self, sender: mpsc::Sender<ScanProgress>) -> Self {
        self.progress = Some(sender);
        self
    }

    /// Runs a full scan of the page
    pub async fn run_scan(&self, options: ScanOptions) -> ScanResult {
        ::log::info!("Starting scan (only main: {})", options.only_main);

        let plan = self.discover().await;
        let initial_index = plan.initial_index();
        self.report(ScanProgress::VariantsDiscovered {
            count: plan.discovered(),
            initial_index,
        })
        .await;
        sleep(self.config.timings.discovery_pause()).await;

        let harvester = PopoverHarvester::new(
            self.page,
            &self.config.selectors,
            &self.config.timings,
            &self.normalizer,
        );
        let mut ledger = ImageLedger::new();

        match &plan {
            VariantPlan::Implicit => {
                ::log::info!("No variants found, scanning the current page as main");
                self.report(ScanProgress::VariantStarted {
                    index: 0,
                    total: 1,
                    label: "Current page".to_string(),
                })
                .await;
                let outcome = harvester.harvest(&mut ledger, Bucket::Main).await;
                self.report_harvest(0, Bucket::Main, outcome, &ledger).await;
            }
            VariantPlan::Discovered { variants, .. } => {
                let total = variants.len();
                for (index, variant) in variants.iter().enumerate() {
                    if options.only_main && index != initial_index {
                        ::log::debug!("Skipping variant {} (only main)", index + 1);
                        self.report(ScanProgress::VariantSkipped { index }).await;
                        continue;
                    }

                    ::log::info!(
                        "Variant {}/{}: {}",
                        index + 1,
                        total,
                        short_label(&variant.label)
                    );
                    self.report(ScanProgress::VariantStarted {
                        index,
                        total,
                        label: variant.label.clone(),
                    })
                    .await;

                    self.select(variant).await;
                    sleep(self.config.timings.variant_settle()).await;

                    let bucket = Bucket::for_index(index, initial_index);
                    let outcome = harvester.harvest(&mut ledger, bucket).await;
                    self.report_harvest(index, bucket, outcome, &ledger).await;
                }
            }
        }

        let title = match self.page.title().await {
            Ok(title) => title,
            Err(e) => {
                ::log::warn!("Could not read page title: {}", e);
                String::new()
            }
        };

        let main_count = ledger.count(Bucket::Main);
        let variant_count = ledger.count(Bucket::Variant);
        ::log::info!(
            "Scan complete: {} main and {} variant images",
            main_count,
            variant_count
        );
        self.report(ScanProgress::Completed {
            main_count,
            variant_count,
        })
        .await;

        ledger.into_result(title)
    }

    /// Enumerates the page's variants and picks the initially selected one
    pub async fn discover(&self) -> VariantPlan<P::Element> {
        let variants = self.discover_variants().await;
        if variants.is_empty() {
            return VariantPlan::Implicit;
        }

        let initial_index = variants.iter().position(|v| v.selected).unwrap_or(0);
        ::log::info!(
            "Found {} variants, initial variant is {}",
            variants.len(),
            initial_index + 1
        );

        VariantPlan::Discovered {
            variants,
            initial_index,
        }
    }

    async fn discover_variants(&self) -> Vec<Variant<P::Element>> {
        let selectors = &self.config.selectors;

        let items = match self.variant_container().await {
            Some(container) => self
                .page
                .children(&container, &selectors.variant_item_tag)
                .await
                .unwrap_or_else(|e| {
                    ::log::warn!("Could not list variant items: {}", e);
                    Vec::new()
                }),
            None => {
                ::log::debug!("No variant group found, falling back to variation lists");
                let mut items = Vec::new();
                for selector in &selectors.fallback_variants {
                    match self.page.find_all(selector).await {
                        Ok(found) => items.extend(found),
                        Err(e) => {
                            ::log::warn!("Could not list variation items {}: {}", selector, e)
                        }
                    }
                }
                items
            }
        };

        let mut seen = HashSet::new();
        let mut variants = Vec::new();
        for item in items {
            let unavailable = self
                .page
                .matches(&item, &selectors.unavailable)
                .await
                .unwrap_or(false);
            if unavailable {
                continue;
            }
            if !seen.insert(self.page.element_key(&item)) {
                continue;
            }

            let label = self.label(&item, variants.len()).await;
            let selected = page::carries_any(self.page, &item, &selectors.selected).await;
            variants.push(Variant {
                handle: item,
                label,
                selected,
            });
        }

        variants
    }

    /// First variant group that is not part of the thumbnail sidebar
    async fn variant_container(&self) -> Option<P::Element> {
        let selectors = &self.config.selectors;
        let candidates = match self.page.find_all(&selectors.variant_groups).await {
            Ok(candidates) => candidates,
            Err(e) => {
                ::log::debug!("Variant group lookup failed: {}", e);
                return None;
            }
        };

        let inside_sidebar = format!(
            "{region}, {region} *",
            region = selectors.thumbnail_region
        );
        for candidate in candidates {
            let in_sidebar = self
                .page
                .matches(&candidate, &inside_sidebar)
                .await
                .unwrap_or(false);
            if !in_sidebar {
                return Some(candidate);
            }
        }
        None
    }

    async fn label(&self, item: &P::Element, position: usize) -> String {
        if let Ok(Some(title)) = self.page.attr(item, "title").await {
            let title = title.trim();
            if !title.is_empty() {
                return title.to_string();
            }
        }
        if let Ok(text) = self.page.text(item).await {
            if let Some(line) = text.lines().map(str::trim).find(|line| !line.is_empty()) {
                return line.to_string();
            }
        }
        format!("Var {}", position + 1)
    }

    /// Clicks the most specific interactive part of a variant
    async fn select(&self, variant: &Variant<P::Element>) {
        let target = page::resolve(
            self.page,
            Some(&variant.handle),
            &self.config.selectors.activation_targets,
        )
        .await
        .unwrap_or_else(|| variant.handle.clone());

        if let Err(e) = self.page.activate(&target).await {
            ::log::debug!("Selecting {} had no effect: {}", variant.label, e);
        }
    }

    async fn report_harvest(
        &self,
        index: usize,
        bucket: Bucket,
        outcome: HarvestOutcome,
        ledger: &ImageLedger,
    ) {
        self.report(ScanProgress::VariantHarvested {
            index,
            bucket,
            outcome,
            main_count: ledger.count(Bucket::Main),
            variant_count: ledger.count(Bucket::Variant),
        })
        .await;
    }

    async fn report(&self, event: ScanProgress) {
        if let Some(sender) = &self.progress {
            if sender.send(event).await.is_err() {
                ::log::trace!("Progress receiver dropped");
            }
        }
    }
}
