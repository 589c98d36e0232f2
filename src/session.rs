//! Request/response exchange between a caller and the page being scanned.
//!
//! A [`ScanService`] owns the page and the last completed result; callers talk
//! to it through a cloneable [`ScanClient`]. The service processes one request
//! at a time, so at most one scan runs per page.

use crate::config::ScanConfig;
use crate::error::{Result, ScrapeError};
use crate::page::Page;
use crate::results::{ScanProgress, ScanResult};
use crate::scan::{ScanOptions, ScrapeOrchestrator};
use tokio::sync::{mpsc, oneshot};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanRequest {
    /// Checks that the page side is reachable
    Ping,
    RunScan(ScanOptions),
    /// The most recently completed result, if any
    LastResult,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanResponse {
    Pong,
    Completed(ScanResult),
    LastResult(Option<ScanResult>),
}

type Envelope = (ScanRequest, oneshot::Sender<Result<ScanResponse>>);

/// Creates a connected client and the request stream for [`ScanService::serve`]
pub fn channel(capacity: usize) -> (ScanClient, mpsc::Receiver<Envelope>) {
    let (tx, rx) = mpsc::channel(capacity);
    (ScanClient { tx }, rx)
}

#[derive(Debug, Clone)]
pub struct ScanClient {
    tx: mpsc::Sender<Envelope>,
}

impl ScanClient {
    pub async fn request(&self, request: ScanRequest) -> Result<ScanResponse> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send((request, reply_tx))
            .await
            .map_err(|_| ScrapeError::ServiceClosed)?;
        reply_rx.await.map_err(|_| ScrapeError::ServiceClosed)?
    }

    pub async fn ping(&self) -> Result<()> {
        match self.request(ScanRequest::Ping).await? {
            ScanResponse::Pong => Ok(()),
            _ => Err(ScrapeError::UnexpectedResponse("ping")),
        }
    }

    pub async fn run_scan(&self, options: ScanOptions) -> Result<ScanResult> {
        match self.request(ScanRequest::RunScan(options)).await? {
            ScanResponse::Completed(result) => Ok(result),
            _ => Err(ScrapeError::UnexpectedResponse("run scan")),
        }
    }

    pub async fn last_result(&self) -> Result<Option<ScanResult>> {
        match self.request(ScanRequest::LastResult).await? {
            ScanResponse::LastResult(result) => Ok(result),
            _ => Err(ScrapeError::UnexpectedResponse("last result")),
        }
    }
}

/// Page-side handler for scan requests
pub struct ScanService<P: Page> {
    page: P,
    config: ScanConfig,
    last_result: Option<ScanResult>,
    progress: Option<mpsc::Sender<ScanProgress>>,
}

impl<P: Page> ScanService<P> {
    pub fn new(page: P, config: ScanConfig) -> Self {
        Self {
            page,
            config,
            last_result: None,
            progress: None,
        }
    }

    /// Forwards progress of every scan to `sender`
    pub fn with_progress(mut self, sender: mpsc::Sender<ScanProgress>) -> Self {
        self.progress = Some(sender);
        self
    }

    pub fn last_result(&self) -> Option<&ScanResult> {
        self.last_result.as_ref()
    }

    pub async fn handle(&mut self, request: ScanRequest) -> Result<ScanResponse> {
        match request {
            ScanRequest::Ping => Ok(ScanResponse::Pong),
            ScanRequest::RunScan(options) => {
                let mut orchestrator = ScrapeOrchestrator::new(&self.page, &self.config)?;
                if let Some(progress) = &self.progress {
                    orchestrator = orchestrator.with_progress(progress.clone());
                }
                let result = orchestrator.run_scan(options).await;
                self.last_result = Some(result.clone());
                Ok(ScanResponse::Completed(result))
            }
            ScanRequest::LastResult => Ok(ScanResponse::LastResult(self.last_result.clone())),
        }
    }

    /// Answers requests until every client is dropped, then hands the page back
    pub async fn serve(mut self, mut requests: mpsc::Receiver<Envelope>) -> P {
        while let Some((request, reply)) = requests.recv().await {
            ::log::trace!("Scan service received {:?}", request);
            let response = self.handle(request).await;
            if reply.send(response).is_err() {
                ::log::debug!("Scan client went away before the reply");
            }
        }
        ::log::debug!("Scan service stopped, no clients left");
        self.page
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::tests::fixture::{ProductFixture, VariantFixture};

    fn fixture() -> ProductFixture {
        ProductFixture::new("Travel Mug")
            .variant(VariantFixture::new("Black").images(&["https://img.example/I/black._AC_SX425_.jpg"]))
            .variant(VariantFixture::new("Teal").images(&["https://img.example/I/teal._AC_SX425_.jpg"]))
            .initially_selected(0)
    }

    #[tokio::test(start_paused = true)]
    async fn test_last_result_before_and_after_scan() {
        let service = ScanService::new(fixture().into_page(), ScanConfig::default());
        let (client, requests) = channel(4);

        let (_page, outcome) = tokio::join!(service.serve(requests), async move {
            client.ping().await?;
            let before = client.last_result().await?;
            let scanned = client.run_scan(ScanOptions::default()).await?;
            let after = client.last_result().await?;
            let again = client.last_result().await?;
            Ok::<_, ScrapeError>((before, scanned, after, again))
        });

        let (before, scanned, after, again) = outcome.unwrap();
        assert!(before.is_none());
        assert_eq!(scanned.title, "Travel Mug");
        assert_eq!(scanned.main_images.len(), 1);
        assert_eq!(scanned.variant_images.len(), 1);
        assert_eq!(after.as_ref(), Some(&scanned));
        assert_eq!(after, again);
    }

    #[tokio::test(start_paused = true)]
    async fn test_handle_keeps_latest_result() {
        let mut service = ScanService::new(fixture().into_page(), ScanConfig::default());

        let first = service
            .handle(ScanRequest::RunScan(ScanOptions { only_main: true }))
            .await
            .unwrap();
        let ScanResponse::Completed(first) = first else {
            panic!("expected a completed scan");
        };
        assert!(first.variant_images.is_empty());

        service
            .handle(ScanRequest::RunScan(ScanOptions::default()))
            .await
            .unwrap();
        assert_eq!(service.last_result().unwrap().variant_images.len(), 1);
    }

    #[tokio::test]
    async fn test_client_errors_when_service_is_gone() {
        let (client, requests) = channel(1);
        drop(requests);
        assert!(matches!(client.ping().await, Err(ScrapeError::ServiceClosed)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_pattern_fails_the_request() {
        let mut config = ScanConfig::default();
        config.normalization.pattern = "(".to_string();
        let mut service = ScanService::new(fixture().into_page(), config);

        let response = service
            .handle(ScanRequest::RunScan(ScanOptions::default()))
            .await;
        assert!(matches!(response, Err(ScrapeError::InvalidPattern(_))));
        assert!(service.last_result().is_none());
    }
}
