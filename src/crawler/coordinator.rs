//! Bounded fetch dispatcher
//!
//! The runner fans work items out to at most `threads` concurrent tasks.
//! Each task fetches its page (unless the body is already in hand), scans
//! it on a blocking thread, runs every candidate through completion and
//! resolution, and pushes survivors into the shared result stream.
//!
//! Every failure is local to its item: it is logged and the run carries on.

use crate::config::{Config, ExtractionPoints, PipelineOptions};
use crate::crawler::fetcher::{build_http_client, HttpFetcher, PageFetcher};
use crate::crawler::resolver::{HttpResolver, Resolver};
use crate::crawler::scanner::scan;
use crate::input::WorkItem;
use crate::output::{drain, ResultSink};
use crate::state::{ItemState, StateTracker};
use crate::url::{complete, Candidate};
use crate::GetJsError;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tracing::instrument::WithSubscriber;
use tracing::Dispatch;
use url::Url;

/// Candidates buffered between the scanner thread and the filter stages
const CANDIDATE_BUFFER: usize = 16;

/// Counters for a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Work items dispatched
    pub items: usize,
    /// Work items that ended in `Failed`
    pub failed: usize,
    /// Results pushed to the result stream
    pub results: usize,
}

impl RunSummary {
    fn record(&mut self, joined: Result<Result<usize, GetJsError>, JoinError>) {
        match joined {
            Ok(Ok(emitted)) => self.results += emitted,
            Ok(Err(_)) => self.failed += 1,
            Err(e) => {
                tracing::error!("Worker task failed: {}", e);
                self.failed += 1;
            }
        }
    }
}

/// Filter stages that apply for this run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Stages {
    complete: bool,
    resolve: bool,
}

impl Stages {
    /// Resolution only makes sense on completed URLs, so it is dropped
    /// (with a warning) when completion is off.
    fn from_options(options: &PipelineOptions) -> Self {
        if options.resolve && !options.complete {
            tracing::warn!("Resolve can only be used in combination with complete, skipping resolution");
        }

        Self {
            complete: options.complete,
            resolve: options.resolve && options.complete,
        }
    }
}

/// Runs the fetch, scan and filter pipeline over a set of work items
pub struct Runner<F = HttpFetcher, R = HttpResolver> {
    fetcher: Arc<F>,
    resolver: Arc<R>,
    points: Arc<ExtractionPoints>,
    options: PipelineOptions,
    dispatch: Dispatch,
}

impl Runner {
    /// Creates a runner that fetches and resolves over HTTP
    ///
    /// The HTTP client is built here, once, from the request configuration
    /// and shared by the page fetcher and the resolver.
    ///
    /// # Arguments
    ///
    /// * `config` - Validated configuration (request, pipeline and extraction points)
    ///
    /// # Returns
    ///
    /// * `Ok(Runner)` - Runner ready to process work items
    /// * `Err(GetJsError)` - Invalid method or header, or the HTTP client could not be built
    ///
    /// # Example
    ///
    /// ```no_run
    /// use getjs::config::Config;
    /// use getjs::crawler::Runner;
    /// use getjs::output::WriterSink;
    /// use getjs::WorkItem;
    ///
    /// # async fn example() -> getjs::Result<()> {
    /// let runner = Runner::new(&Config::default())?;
    /// let page = WorkItem::PageUrl("https://example.com/".parse().unwrap());
    /// runner.run_to_sinks(vec![page], vec![Box::new(WriterSink::stdout())]).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(config: &Config) -> Result<Self, GetJsError> {
        let request = config.request_config()?;
        let client = build_http_client(&request)?;

        Ok(Self::from_parts(
            HttpFetcher::new(client.clone(), &request),
            HttpResolver::new(client),
            config.extraction.clone(),
            config.pipeline.clone(),
        ))
    }
}

impl<F, R> Runner<F, R>
where
    F: PageFetcher,
    R: Resolver,
{
    /// Creates a runner from its collaborators
    pub fn from_parts(
        fetcher: F,
        resolver: R,
        points: ExtractionPoints,
        options: PipelineOptions,
    ) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            resolver: Arc::new(resolver),
            points: Arc::new(points),
            options,
            dispatch: Dispatch::none(),
        }
    }

    /// Replaces the page fetcher
    pub fn with_fetcher<F2: PageFetcher>(self, fetcher: F2) -> Runner<F2, R> {
        Runner {
            fetcher: Arc::new(fetcher),
            resolver: self.resolver,
            points: self.points,
            options: self.options,
            dispatch: self.dispatch,
        }
    }

    /// Replaces the resolver
    pub fn with_resolver<R2: Resolver>(self, resolver: R2) -> Runner<F, R2> {
        Runner {
            fetcher: self.fetcher,
            resolver: Arc::new(resolver),
            points: self.points,
            options: self.options,
            dispatch: self.dispatch,
        }
    }

    /// Sends the pipeline's diagnostics to `dispatch` (silent by default)
    pub fn with_diagnostics(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = dispatch;
        self
    }

    /// Processes every work item and pushes results into `results`
    ///
    /// At most `threads` items are in flight at once; the loop waits for a
    /// free slot before dispatching the next item. Returns once every item
    /// has reached a terminal state. Dropping the last sender clone at that
    /// point signals end-of-stream to the consumer.
    pub async fn run<I>(&self, items: I, results: mpsc::Sender<String>) -> RunSummary
    where
        I: IntoIterator<Item = WorkItem>,
    {
        self.dispatch_all(items, results)
            .with_subscriber(self.dispatch.clone())
            .await
    }

    /// Runs the pipeline and drains the result stream into `sinks`
    pub async fn run_to_sinks<I>(
        &self,
        items: I,
        sinks: Vec<Box<dyn ResultSink>>,
    ) -> Result<RunSummary, GetJsError>
    where
        I: IntoIterator<Item = WorkItem>,
    {
        let (sender, receiver) = mpsc::channel(self.options.threads.max(1));

        let dispatch = self.dispatch.clone();
        let consumer = tokio::task::spawn_blocking(move || {
            tracing::dispatcher::with_default(&dispatch, || drain(receiver, sinks))
        });

        let summary = self.run(items, sender).await;
        let written = consumer.await?;

        tracing::dispatcher::with_default(&self.dispatch, || {
            tracing::debug!("Wrote {} result(s) to the outputs", written)
        });

        Ok(summary)
    }

    async fn dispatch_all<I>(&self, items: I, results: mpsc::Sender<String>) -> RunSummary
    where
        I: IntoIterator<Item = WorkItem>,
    {
        let stages = Stages::from_options(&self.options);
        let pool = Arc::new(Semaphore::new(self.options.threads.max(1)));
        let mut tasks = JoinSet::new();
        let mut summary = RunSummary::default();

        for item in items {
            let permit = match pool.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };
            summary.items += 1;

            let worker = self.worker(stages);
            let results = results.clone();
            tasks.spawn(
                async move {
                    // Held until the task finishes, whichever way it exits
                    let _permit = permit;
                    worker.process(item, results).await
                }
                .with_subscriber(self.dispatch.clone()),
            );

            while let Some(joined) = tasks.try_join_next() {
                summary.record(joined);
            }
        }

        while let Some(joined) = tasks.join_next().await {
            summary.record(joined);
        }

        tracing::info!(
            "Processed {} input(s): {} failed, {} result(s)",
            summary.items,
            summary.failed,
            summary.results
        );

        summary
    }

    fn worker(&self, stages: Stages) -> Worker<F, R> {
        Worker {
            fetcher: Arc::clone(&self.fetcher),
            resolver: Arc::clone(&self.resolver),
            points: Arc::clone(&self.points),
            stages,
            dispatch: self.dispatch.clone(),
        }
    }
}

/// Everything one task needs to carry a work item to a terminal state
struct Worker<F, R> {
    fetcher: Arc<F>,
    resolver: Arc<R>,
    points: Arc<ExtractionPoints>,
    stages: Stages,
    dispatch: Dispatch,
}

impl<F, R> Worker<F, R>
where
    F: PageFetcher,
    R: Resolver,
{
    /// Returns the number of results emitted for the item
    async fn process(
        &self,
        item: WorkItem,
        results: mpsc::Sender<String>,
    ) -> Result<usize, GetJsError> {
        let label = item.label();
        let mut tracker = StateTracker::new(label.clone());

        let outcome = self.process_item(item, &results, &mut tracker).await;
        match &outcome {
            Ok(emitted) => {
                tracker.advance(ItemState::Done);
                tracing::debug!("Got {} source(s) from {}", emitted, label);
            }
            Err(e) => {
                tracker.advance(ItemState::Failed);
                tracing::warn!("Couldn't get sources from {}: {}", label, e);
            }
        }

        outcome
    }

    async fn process_item(
        &self,
        item: WorkItem,
        results: &mpsc::Sender<String>,
        tracker: &mut StateTracker,
    ) -> Result<usize, GetJsError> {
        let (body, base) = match item {
            WorkItem::PageUrl(url) => {
                tracker.advance(ItemState::Fetching);
                tracing::debug!("Getting sources from {}", url);
                let body = self.fetcher.fetch(&url).await?;
                (body, Some(url))
            }
            WorkItem::RawBody { body, base } => (body, base),
        };

        tracker.advance(ItemState::Scanning);
        let (sender, mut candidates) = mpsc::channel(CANDIDATE_BUFFER);
        let points = Arc::clone(&self.points);
        let dispatch = self.dispatch.clone();
        let scanner = tokio::task::spawn_blocking(move || {
            tracing::dispatcher::with_default(&dispatch, || {
                for candidate in scan(body.as_slice(), &points)? {
                    if sender.blocking_send(candidate).is_err() {
                        break;
                    }
                }
                Ok::<(), GetJsError>(())
            })
        });

        let mut emitted = 0;
        while let Some(candidate) = candidates.recv().await {
            tracker.advance(ItemState::Filtering);
            let Some(result) = self.filter(candidate, base.as_ref()).await else {
                continue;
            };

            tracker.advance(ItemState::Emitting);
            if results.send(result).await.is_err() {
                tracing::debug!("Result stream closed, stopping");
                break;
            }
            emitted += 1;
        }

        // Unblocks the scanner if it is still producing
        drop(candidates);
        scanner.await??;

        Ok(emitted)
    }

    /// Applies completion and resolution; `None` drops the candidate
    async fn filter(&self, candidate: Candidate, base: Option<&Url>) -> Option<String> {
        let candidate = match base {
            Some(base) if self.stages.complete => complete(candidate, base),
            _ => candidate,
        };

        if self.stages.resolve {
            let url = match candidate.to_url() {
                Ok(url) => url,
                Err(e) => {
                    tracing::debug!(
                        "{}",
                        GetJsError::Resolution {
                            url: candidate.to_string(),
                            reason: e.to_string(),
                        }
                    );
                    return None;
                }
            };

            if !self.resolver.resolves(&url).await {
                return None;
            }
        }

        Some(candidate.into_string())
    }
}
