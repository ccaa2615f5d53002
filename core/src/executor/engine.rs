use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::error::{GeoError, ProviderError};
use crate::provider::Provider;
use crate::storage::{layout, Storage, StorageExt};
use crate::types::{ExecutionRun, GeneratedQuery, QueryResult};

use super::progress::ProgressMonitor;
use super::scheduler::run_bounded;
use super::traits::{emit, OutputRendererPlugin, RenderEvent, RetryStrategyPlugin};
use super::types::ExecutionOpts;

/// One (query, provider, iteration) unit of work. Never persisted.
struct QueryTask<'a> {
    query: &'a GeneratedQuery,
    provider: Arc<dyn Provider>,
    iteration: u32,
}

/// Bounded fan-out of `queries × providers × iterations` provider calls.
///
/// Every task yields exactly one `QueryResult`. Provider failures, timeouts
/// and exhausted retries are recorded on that result and never surface as
/// errors from [`ExecutionEngine::execute`].
pub struct ExecutionEngine {
    opts: ExecutionOpts,
    storage: Arc<dyn Storage>,
    renderer: Option<Arc<dyn OutputRendererPlugin>>,
    retry_strategy: Option<Arc<dyn RetryStrategyPlugin>>,
}

pub struct ExecutionEngineBuilder {
    opts: ExecutionOpts,
    storage: Arc<dyn Storage>,
    renderer: Option<Arc<dyn OutputRendererPlugin>>,
    retry_strategy: Option<Arc<dyn RetryStrategyPlugin>>,
}

impl ExecutionEngine {
    pub fn new(opts: ExecutionOpts, storage: Arc<dyn Storage>) -> Self {
        Self {
            opts,
            storage,
            renderer: None,
            retry_strategy: None,
        }
    }

    pub fn builder(opts: ExecutionOpts, storage: Arc<dyn Storage>) -> ExecutionEngineBuilder {
        ExecutionEngineBuilder::new(opts, storage)
    }

    pub fn opts(&self) -> &ExecutionOpts {
        &self.opts
    }

    /// Runs the full cross product, then persists `results/results.json` and
    /// one `results/by-provider/{name}.json` per provider.
    pub async fn execute(
        &self,
        run_id: &str,
        brand: &str,
        queries: &[GeneratedQuery],
        providers: &[Arc<dyn Provider>],
    ) -> Result<ExecutionRun, GeoError> {
        if queries.is_empty() {
            return Err(GeoError::pipeline("execution", "no queries to execute"));
        }
        if providers.is_empty() {
            return Err(GeoError::pipeline("execution", "no providers to execute against"));
        }

        let iterations = self.opts.iterations.max(1);
        let mut tasks = Vec::with_capacity(queries.len() * providers.len() * iterations as usize);
        for query in queries {
            for provider in providers {
                for iteration in 1..=iterations {
                    tasks.push(QueryTask {
                        query,
                        provider: provider.clone(),
                        iteration,
                    });
                }
            }
        }

        let total = tasks.len();
        let names: Vec<String> = providers.iter().map(|p| p.name().to_string()).collect();
        info!(
            target: "geoprobe.executor",
            stage = "execution.start",
            run_id,
            total,
            providers = %names.join(","),
            concurrency = self.opts.concurrency,
            timeout_ms = self.opts.timeout.as_millis() as u64
        );

        let progress = Mutex::new(ProgressMonitor::new(total, self.opts.show_progress));
        let done = AtomicUsize::new(0);
        let started = Instant::now();

        let results = run_bounded(tasks, self.opts.concurrency, |task| {
            let progress = &progress;
            let done = &done;
            async move {
                let result = self.run_task(task).await;
                let n = done.fetch_add(1, Ordering::SeqCst) + 1;
                self.on_task_complete(run_id, &result, n, total, progress);
                result
            }
        })
        .await?;

        let mut run = ExecutionRun::new(run_id, brand, names, total);
        run.results = results;
        run.finalize();

        info!(
            target: "geoprobe.executor",
            stage = "execution.end",
            run_id,
            completed = run.completed_queries,
            failed = run.failed_queries,
            status = ?run.status,
            elapsed_ms = started.elapsed().as_millis() as u64
        );
        if let Ok(monitor) = progress.lock() {
            monitor.finish(run.failed_queries == 0);
        }

        self.persist(&run).await?;
        Ok(run)
    }

    pub async fn persist(&self, run: &ExecutionRun) -> Result<(), GeoError> {
        self.storage.save(&run.run_id, layout::RESULTS, run).await?;
        for provider in &run.providers {
            let subset: Vec<&QueryResult> = run
                .results
                .iter()
                .filter(|r| &r.provider == provider)
                .collect();
            self.storage
                .save(&run.run_id, &layout::by_provider(provider), &subset)
                .await?;
        }
        Ok(())
    }

    async fn run_task(&self, task: QueryTask<'_>) -> QueryResult {
        let QueryTask {
            query,
            provider,
            iteration,
        } = task;
        let timeout_ms = self.opts.timeout.as_millis() as u64;
        let max_attempts = self
            .retry_strategy
            .as_ref()
            .map(|s| s.max_attempts().max(1))
            .unwrap_or(1);

        let started = Instant::now();
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let outcome = match tokio::time::timeout(self.opts.timeout, provider.query(&query.text)).await {
                Ok(res) => res,
                Err(_) => Err(ProviderError::timeout(provider.name(), timeout_ms)),
            };

            let err = match outcome {
                Ok(resp) => {
                    return QueryResult {
                        query_id: query.id.clone(),
                        query_text: query.text.clone(),
                        provider: provider.name().to_string(),
                        model: resp.model,
                        response: resp.text,
                        latency_ms: resp.latency_ms,
                        token_usage: resp.token_usage,
                        iteration,
                        timestamp: chrono::Utc::now().to_rfc3339(),
                        error: None,
                        attempts: attempt,
                    };
                }
                Err(err) => err,
            };

            if let Some(delay) = self.retry_delay(attempt, max_attempts, &err) {
                warn!(
                    target: "geoprobe.executor",
                    stage = "execution.retry",
                    provider = provider.name(),
                    query_id = %query.id,
                    iteration,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            debug!(
                target: "geoprobe.executor",
                stage = "execution.task_failed",
                provider = provider.name(),
                query_id = %query.id,
                iteration,
                code = err.code(),
                error = %err
            );
            return QueryResult {
                query_id: query.id.clone(),
                query_text: query.text.clone(),
                provider: provider.name().to_string(),
                model: provider.model().to_string(),
                response: String::new(),
                latency_ms: started.elapsed().as_millis() as u64,
                token_usage: None,
                iteration,
                timestamp: chrono::Utc::now().to_rfc3339(),
                error: Some(err.to_string()),
                attempts: attempt,
            };
        }
    }

    fn retry_delay(&self, attempt: u32, max_attempts: u32, err: &ProviderError) -> Option<Duration> {
        let strategy = self.retry_strategy.as_ref()?;
        if attempt >= max_attempts || !strategy.should_retry(attempt, err) {
            return None;
        }
        let delay = strategy.next_delay(attempt, err)?;
        match err {
            ProviderError::RateLimit {
                retry_after_ms: Some(ms),
                ..
            } => Some(delay.max(Duration::from_millis(*ms))),
            _ => Some(delay),
        }
    }

    fn on_task_complete(
        &self,
        run_id: &str,
        result: &QueryResult,
        done: usize,
        total: usize,
        progress: &Mutex<ProgressMonitor>,
    ) {
        if let Ok(mut monitor) = progress.lock() {
            monitor.complete_task(
                &format!("{} {}", result.provider, result.query_id),
                result.is_success(),
            );
        }
        if done % self.opts.log_every.max(1) == 0 || done == total {
            info!(
                target: "geoprobe.executor",
                stage = "execution.progress",
                run_id,
                done,
                total
            );
        }
        emit(
            &self.renderer,
            RenderEvent::TaskComplete {
                run_id: run_id.to_string(),
                provider: result.provider.clone(),
                query_id: result.query_id.clone(),
                iteration: result.iteration,
                success: result.is_success(),
                latency_ms: result.latency_ms,
                attempts: result.attempts,
                done,
                total,
            },
        );
    }
}

impl ExecutionEngineBuilder {
    pub fn new(opts: ExecutionOpts, storage: Arc<dyn Storage>) -> Self {
        Self {
            opts,
            storage,
            renderer: None,
            retry_strategy: None,
        }
    }

    pub fn renderer(mut self, renderer: Arc<dyn OutputRendererPlugin>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn retry_strategy(mut self, strategy: Arc<dyn RetryStrategyPlugin>) -> Self {
        self.retry_strategy = Some(strategy);
        self
    }

    pub fn maybe_renderer(mut self, renderer: Option<Arc<dyn OutputRendererPlugin>>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn maybe_retry_strategy(mut self, strategy: Option<Arc<dyn RetryStrategyPlugin>>) -> Self {
        self.retry_strategy = strategy;
        self
    }

    pub fn build(self) -> ExecutionEngine {
        ExecutionEngine {
            opts: self.opts,
            storage: self.storage,
            renderer: self.renderer,
            retry_strategy: self.retry_strategy,
        }
    }
}
