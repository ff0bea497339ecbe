//! Batch orchestration: bounded-concurrency fetch pool, cooperative
//! cancellation, artifact finalization.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use futures::{stream, StreamExt};
use tracing::warn;

use crate::export;
use crate::fetch::fetch_company;
use crate::notify::{Notification, Notifier};
use crate::record::CompanyRecord;
use crate::transport::Transport;

/// How a batch run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionStatus {
    Completed,
    Interrupted,
    Failed,
}

/// Level-triggered cancellation handle. Set once by the interrupt
/// collaborator, read by the orchestrator before dispatching a fetch and
/// before accepting a result; never reset.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Everything one batch run needs, passed explicitly.
#[derive(Clone)]
pub struct BatchContext {
    pub transport: Transport,
    pub notifier: Notifier,
    pub base_url: String,
    pub parallel_jobs: usize,
    pub cancel: CancelToken,
}

/// Read the company list: one display name per line, trimmed. Blank lines and
/// `#` comments are skipped.
pub fn read_company_file(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read company list: {}", path.display()))?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// Fetch every company with at most `parallel_jobs` requests in flight.
///
/// Records accumulate in completion order, not input order. Once the
/// cancellation token reads set, no new fetch starts and no further result is
/// accepted; in-flight fetches are abandoned when the stream is dropped.
pub async fn run(
    companies: &[String],
    ctx: &BatchContext,
) -> (Vec<CompanyRecord>, CompletionStatus) {
    let mut results = Vec::with_capacity(companies.len());

    let mut records = stream::iter(companies.iter().cloned().map(|company| {
        let transport = ctx.transport.clone();
        let notifier = ctx.notifier.clone();
        let base_url = ctx.base_url.clone();
        let cancel = ctx.cancel.clone();
        async move {
            // Dispatch checkpoint: work not yet started stays unstarted.
            if cancel.is_cancelled() {
                return None;
            }
            Some(fetch_company(&transport, &notifier, &base_url, &company).await)
        }
    }))
    .buffer_unordered(ctx.parallel_jobs.max(1));

    while let Some(outcome) = records.next().await {
        // Collection checkpoint: nothing is accepted after cancellation.
        if ctx.cancel.is_cancelled() {
            break;
        }
        if let Some(record) = outcome {
            results.push(record);
        }
    }

    let status = if ctx.cancel.is_cancelled() {
        CompletionStatus::Interrupted
    } else {
        CompletionStatus::Completed
    };
    (results, status)
}

/// Run the batch and finalize the output artifact.
///
/// Per-company failures are already absorbed into their records; an error
/// here is an orchestration failure (artifact write), which saves a
/// best-effort partial file and notifies before surfacing.
pub async fn execute(
    companies: &[String],
    ctx: &BatchContext,
    output: &Path,
) -> Result<CompletionStatus> {
    println!("Starting data extraction...");
    ctx.notifier
        .send(&Notification::started(companies.len()))
        .await;
    let started = Instant::now();

    let (records, status) = run(companies, ctx).await;

    match finalize(&records, status, ctx, output, started).await {
        Ok(()) => Ok(status),
        Err(e) => {
            save_partial_on_failure(&records, ctx, output, &e).await;
            Err(e)
        }
    }
}

async fn finalize(
    records: &[CompanyRecord],
    status: CompletionStatus,
    ctx: &BatchContext,
    output: &Path,
    started: Instant,
) -> Result<()> {
    match status {
        CompletionStatus::Completed => {
            export::write_csv(records, output)?;

            let total = started.elapsed().as_secs_f64();
            let minutes = (total / 60.0) as u64;
            let seconds = total % 60.0;
            let failed = records.iter().filter(|r| r.is_failure()).count();
            println!(
                "Data extraction completed in {minutes} min {seconds:.2} sec \
                 ({} companies, {failed} failed)",
                records.len()
            );
            ctx.notifier
                .send(&Notification::completed(minutes, seconds))
                .await;
        }
        CompletionStatus::Interrupted | CompletionStatus::Failed => {
            println!("Data extraction was interrupted. Saving partial results...");
            let partial = export::partial_path(output);
            export::write_csv(records, &partial)?;
            println!("Partial results saved to {}", partial.display());
            ctx.notifier
                .send(&Notification::interrupted(&partial.display().to_string()))
                .await;
        }
    }
    Ok(())
}

async fn save_partial_on_failure(
    records: &[CompanyRecord],
    ctx: &BatchContext,
    output: &Path,
    error: &anyhow::Error,
) {
    let partial = export::partial_path(output);
    if let Err(e) = export::write_csv(records, &partial) {
        warn!(
            "could not save partial results to {}: {e:#}",
            partial.display()
        );
    }
    ctx.notifier
        .send(&Notification::crashed(&partial.display().to_string(), error))
        .await;
}
