use crate::config::{ScanTimings, SelectorConfig};
use crate::error::Result;
use crate::normalize::{ImageUrl, UrlNormalizer};
use crate::page::{self, Page};
use crate::scan::{Bucket, ImageLedger};
use tokio::time::sleep;

/// What a single pass over the gallery overlay produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarvestOutcome {
    /// No element opens the gallery
    NoTrigger,
    /// The overlay did not appear, even after the retry
    OverlayMissing,
    Harvested(HarvestStats),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HarvestStats {
    /// Thumbnails present in the overlay
    pub thumbnails: usize,
    /// New URLs recorded in the destination bucket
    pub added: usize,
    /// URLs that were already collected
    pub duplicates: usize,
    pub skipped_videos: usize,
    /// Thumbnails whose image could not be read
    pub failed: usize,
}

impl HarvestOutcome {
    pub fn added(&self) -> usize {
        match self {
            HarvestOutcome::Harvested(stats) => stats.added,
            _ => 0,
        }
    }
}

/// Opens the gallery overlay for whatever the page currently shows, cycles
/// its thumbnails and records one full-resolution URL per thumbnail.
pub struct PopoverHarvester<'a, P: Page> {
    page: &'a P,
    selectors: &'a SelectorConfig,
    timings: &'a ScanTimings,
    normalizer: &'a UrlNormalizer,
}

impl<'a, P: Page> PopoverHarvester<'a, P> {
    pub fn new(
        page: &'a P,
        selectors: &'a SelectorConfig,
        timings: &'a ScanTimings,
        normalizer: &'a UrlNormalizer,
    ) -> Self {
        Self {
            page,
            selectors,
            timings,
            normalizer,
        }
    }

    /// Harvests the open gallery into `destination`.
    ///
    /// Never fails: missing page elements end the pass early and unreadable
    /// thumbnails are skipped.
    pub async fn harvest(&self, ledger: &mut ImageLedger, destination: Bucket) -> HarvestOutcome {
        let Some(trigger) = page::resolve(self.page, None, &self.selectors.popover_triggers).await
        else {
            ::log::warn!("No main image found to open the gallery");
            return HarvestOutcome::NoTrigger;
        };

        self.activate(&trigger).await;
        sleep(self.timings.popover_open()).await;

        if !self.overlay_open().await {
            ::log::info!("Gallery not detected, retrying click");
            self.activate(&trigger).await;
            sleep(self.timings.popover_retry()).await;

            if !self.overlay_open().await {
                ::log::warn!("Gallery did not open, skipping this variant");
                return HarvestOutcome::OverlayMissing;
            }
        }

        let stats = self.cycle_thumbnails(ledger, destination).await;
        ::log::debug!(
            "Gallery pass: {} thumbnails, {} new, {} duplicate, {} video, {} failed",
            stats.thumbnails,
            stats.added,
            stats.duplicates,
            stats.skipped_videos,
            stats.failed
        );

        self.close().await;
        HarvestOutcome::Harvested(stats)
    }

    async fn cycle_thumbnails(&self, ledger: &mut ImageLedger, destination: Bucket) -> HarvestStats {
        let thumbnails = match self.page.find_all(&self.selectors.thumbnails).await {
            Ok(thumbnails) => thumbnails,
            Err(e) => {
                ::log::warn!("Could not list gallery thumbnails: {}", e);
                Vec::new()
            }
        };

        let mut stats = HarvestStats {
            thumbnails: thumbnails.len(),
            ..HarvestStats::default()
        };

        for (index, thumbnail) in thumbnails.iter().enumerate() {
            let is_video = self
                .page
                .matches(thumbnail, &self.selectors.video_marker)
                .await
                .unwrap_or(false);
            if is_video {
                ::log::trace!("Skipping video thumbnail {}", index);
                stats.skipped_videos += 1;
                continue;
            }

            self.activate(thumbnail).await;
            sleep(self.timings.thumbnail_settle()).await;

            match self.displayed_image().await {
                Ok(Some(url)) => {
                    if ledger.record(destination, url) {
                        stats.added += 1;
                    } else {
                        stats.duplicates += 1;
                    }
                }
                Ok(None) => {
                    ::log::debug!("Thumbnail {} shows no readable image", index);
                    stats.failed += 1;
                }
                Err(e) => {
                    ::log::debug!("Failed to read image for thumbnail {}: {}", index, e);
                    stats.failed += 1;
                }
            }
        }

        stats
    }

    /// Normalized URL of the image in the overlay's large-image container
    async fn displayed_image(&self) -> Result<Option<ImageUrl>> {
        let Some(container) = self
            .page
            .find_all(&self.selectors.large_image)
            .await?
            .into_iter()
            .next()
        else {
            return Ok(None);
        };
        let Some(image) = self
            .page
            .find_all_within(&container, &self.selectors.large_image_img)
            .await?
            .into_iter()
            .next()
        else {
            return Ok(None);
        };

        let source = self.page.image_source(&image).await?;
        Ok(source.and_then(|src| self.normalizer.normalize(&src)))
    }

    async fn overlay_open(&self) -> bool {
        match self.page.find_all(&self.selectors.large_image).await {
            Ok(found) => !found.is_empty(),
            Err(e) => {
                ::log::debug!("Overlay check failed: {}", e);
                false
            }
        }
    }

    async fn close(&self) {
        match page::resolve(self.page, None, &self.selectors.close_controls).await {
            Some(control) => self.activate(&control).await,
            None => {
                ::log::debug!("No close control found, sending Escape");
                if let Err(e) = self.page.press_escape().await {
                    ::log::warn!("Failed to send Escape: {}", e);
                }
            }
        }
        sleep(self.timings.popover_close()).await;
    }

    async fn activate(&self, element: &P::Element) {
        if let Err(e) = self.page.activate(element).await {
            ::log::debug!("Click was not delivered: {}", e);
        }
    }
}
