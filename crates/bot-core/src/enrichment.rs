//! Enrichment pipeline - exchanges credential pairs for tokens with a
//! bounded number of lookups in flight.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::error::TokenError;
use crate::ports::{ProgressReporter, TokenService};
use crate::types::{CredentialPair, TokenResult};

pub const DEFAULT_MAX_CONCURRENCY: usize = 20;
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_PROGRESS_EVERY: usize = 5;

#[derive(Debug, Clone)]
pub struct EnrichmentConfig {
    /// Maximum number of lookups in flight.
    pub max_concurrency: usize,
    /// Upper bound for a single lookup.
    pub lookup_timeout: Duration,
    /// Report progress every this many completions (and on the last one).
    pub progress_every: usize,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
            progress_every: DEFAULT_PROGRESS_EVERY,
        }
    }
}

pub struct EnrichmentPipeline {
    service: Arc<dyn TokenService>,
    config: EnrichmentConfig,
}

impl EnrichmentPipeline {
    pub fn new(service: Arc<dyn TokenService>) -> Self {
        Self {
            service,
            config: EnrichmentConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EnrichmentConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &EnrichmentConfig {
        &self.config
    }

    /// Look up a token for every pair.
    ///
    /// Results come back in completion order. Pairs whose lookup fails are
    /// left out; incomplete pairs are counted as done without a call.
    pub async fn enrich(
        &self,
        pairs: Vec<CredentialPair>,
        progress: &dyn ProgressReporter,
    ) -> Vec<TokenResult> {
        let total = pairs.len();
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));
        let mut tasks = JoinSet::new();

        for pair in pairs {
            let service = Arc::clone(&self.service);
            let semaphore = Arc::clone(&semaphore);
            let timeout = self.config.lookup_timeout;
            tasks.spawn(async move {
                if !pair.is_complete() {
                    return None;
                }
                let _permit = semaphore.acquire_owned().await.ok()?;
                match lookup(service.as_ref(), &pair, timeout).await {
                    Ok(token) => Some(TokenResult { token }),
                    Err(e) => {
                        log::debug!("No token for uid {}: {}", pair.uid, e);
                        None
                    }
                }
            });
        }

        let every = self.config.progress_every.max(1);
        let mut results = Vec::new();
        let mut completed = 0;
        while let Some(joined) = tasks.join_next().await {
            completed += 1;
            match joined {
                Ok(Some(result)) => results.push(result),
                Ok(None) => {}
                Err(e) => log::warn!("Token lookup task aborted: {}", e),
            }

            if completed % every == 0 || completed == total {
                if let Err(e) = progress.report(completed, total).await {
                    log::debug!("Ignoring progress report failure: {}", e);
                }
            }
        }

        log::info!("Enrichment finished: {}/{} tokens", results.len(), total);
        results
    }
}

async fn lookup(
    service: &dyn TokenService,
    pair: &CredentialPair,
    timeout: Duration,
) -> Result<String, TokenError> {
    match tokio::time::timeout(timeout, service.fetch_token(pair)).await {
        Ok(result) => result,
        Err(_) => Err(TokenError::Timeout),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportResult;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct EchoService {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TokenService for EchoService {
        async fn fetch_token(&self, pair: &CredentialPair) -> Result<String, TokenError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("token-{}", pair.uid))
        }
    }

    struct SlowService;

    #[async_trait]
    impl TokenService for SlowService {
        async fn fetch_token(&self, _pair: &CredentialPair) -> Result<String, TokenError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok("late".to_string())
        }
    }

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(usize, usize)>>,
    }

    #[async_trait]
    impl ProgressReporter for Recorder {
        async fn report(&self, completed: usize, total: usize) -> TransportResult<()> {
            self.calls.lock().unwrap().push((completed, total));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_incomplete_pairs_are_skipped_without_a_call() {
        let service = Arc::new(EchoService {
            calls: AtomicUsize::new(0),
        });
        let pipeline = EnrichmentPipeline::new(service.clone());
        let recorder = Recorder::default();

        let results = pipeline
            .enrich(
                vec![
                    CredentialPair::new("1", "a"),
                    CredentialPair::new("", "b"),
                    CredentialPair::new("3", ""),
                ],
                &recorder,
            )
            .await;

        assert_eq!(
            results,
            vec![TokenResult {
                token: "token-1".to_string()
            }]
        );
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);
        assert_eq!(*recorder.calls.lock().unwrap(), vec![(3, 3)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lookup_timeout_drops_the_pair() {
        let pipeline = EnrichmentPipeline::new(Arc::new(SlowService));
        let recorder = Recorder::default();

        let results = pipeline
            .enrich(vec![CredentialPair::new("1", "a")], &recorder)
            .await;

        assert!(results.is_empty());
        assert_eq!(*recorder.calls.lock().unwrap(), vec![(1, 1)]);
    }

    #[tokio::test]
    async fn test_empty_input_reports_nothing() {
        let pipeline = EnrichmentPipeline::new(Arc::new(SlowService));
        let recorder = Recorder::default();

        let results = pipeline.enrich(Vec::new(), &recorder).await;

        assert!(results.is_empty());
        assert!(recorder.calls.lock().unwrap().is_empty());
    }
}
