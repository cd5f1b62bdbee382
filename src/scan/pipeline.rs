use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{Instrument, debug, debug_span, info, info_span, warn};

use super::errors::ScanResult;
use super::policy::{Evaluation, Policy, UnitStats};
use super::unit::Unit;

/// Totals for a finished scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Files read and classified
    pub units: usize,
    /// Files that could not be read and were dropped
    pub unreadable: usize,
    /// Leaf certificates evaluated
    pub certificates: usize,
    /// Certificate blocks that could not be decoded
    pub skipped_blocks: usize,
    /// Messages emitted
    pub flagged: usize,
    /// Verification failures that produced no message
    pub absorbed_failures: usize,
}

impl ScanSummary {
    fn record(&mut self, stats: UnitStats) {
        self.certificates += stats.certificates;
        self.skipped_blocks += stats.skipped_blocks;
        self.flagged += stats.flagged;
        self.absorbed_failures += stats.absorbed_failures;
    }

    /// Whether anything was dropped without a message
    pub fn has_silent_drops(&self) -> bool {
        self.unreadable > 0 || self.skipped_blocks > 0 || self.absorbed_failures > 0
    }

    /// Write the totals to the log, never to stdout
    pub fn log(&self) {
        if self.has_silent_drops() {
            warn!(
                units = self.units,
                unreadable = self.unreadable,
                skipped_blocks = self.skipped_blocks,
                absorbed_failures = self.absorbed_failures,
                "Scan finished with items that produced no output"
            );
        } else {
            info!(
                units = self.units,
                certificates = self.certificates,
                flagged = self.flagged,
                "Scan finished"
            );
        }
    }
}

/// A running scan: a stream of messages plus the summary that becomes
/// available once every task has finished
pub struct Scan {
    messages: mpsc::Receiver<String>,
    summary: JoinHandle<ScanResult<ScanSummary>>,
}

impl Scan {
    /// Next message in arrival order, or `None` once every task is done
    pub async fn next_message(&mut self) -> Option<String> {
        self.messages.recv().await
    }

    /// Wait for the scan to wind down and return its totals.
    ///
    /// Messages not yet received are discarded.
    pub async fn finish(mut self) -> ScanResult<ScanSummary> {
        self.messages.close();
        while self.messages.recv().await.is_some() {}
        self.summary.await?
    }

    /// Drain every message and return them with the summary
    pub async fn collect(mut self) -> ScanResult<(Vec<String>, ScanSummary)> {
        let mut messages = Vec::new();
        while let Some(message) = self.next_message().await {
            messages.push(message);
        }
        let summary = self.finish().await?;
        Ok((messages, summary))
    }
}

/// Fan-out/fan-in pipeline: one loader, one classification task per unit,
/// and a single message stream that closes after the last task finishes.
#[derive(Debug, Clone)]
pub struct Pipeline {
    policy: Arc<Policy>,
}

impl Pipeline {
    pub fn new(policy: Policy) -> Self {
        Self {
            policy: Arc::new(policy),
        }
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Start scanning `paths`. Must be called from within a Tokio runtime.
    pub fn run(&self, paths: Vec<PathBuf>) -> Scan {
        // Room for every input, so the loader never waits on the dispatcher
        let (unit_tx, unit_rx) = mpsc::channel(paths.len().max(1));
        // Smallest capacity tokio allows; a task waits until its message is taken
        let (message_tx, message_rx) = mpsc::channel(1);

        let span = info_span!("scan", files = paths.len());
        let loader = tokio::spawn(load_units(paths, unit_tx).instrument(span.clone()));
        let summary = tokio::spawn(
            dispatch(Arc::clone(&self.policy), unit_rx, message_tx, loader).instrument(span),
        );

        Scan {
            messages: message_rx,
            summary,
        }
    }
}

// Read each path in order; unreadable paths are counted and dropped
async fn load_units(paths: Vec<PathBuf>, units: mpsc::Sender<Unit>) -> usize {
    let mut unreadable = 0;

    for path in paths {
        match tokio::fs::read(&path).await {
            Ok(data) => {
                let unit = Unit::new(data, path.display().to_string());
                if units.send(unit).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                debug!("Skipping {}: {e}", path.display());
                unreadable += 1;
            }
        }
    }

    unreadable
}

async fn dispatch(
    policy: Arc<Policy>,
    mut units: mpsc::Receiver<Unit>,
    messages: mpsc::Sender<String>,
    loader: JoinHandle<usize>,
) -> ScanResult<ScanSummary> {
    let mut tasks = JoinSet::new();
    let mut summary = ScanSummary::default();

    while let Some(unit) = units.recv().await {
        summary.units += 1;
        let span = debug_span!("unit", name = unit.name());
        tasks.spawn(classify_unit(Arc::clone(&policy), unit, messages.clone()).instrument(span));
    }
    // Each task holds its own sender; the stream closes when the last one ends
    drop(messages);

    while let Some(stats) = tasks.join_next().await {
        summary.record(stats??);
    }
    summary.unreadable = loader.await?;

    Ok(summary)
}

async fn classify_unit(
    policy: Arc<Policy>,
    unit: Unit,
    messages: mpsc::Sender<String>,
) -> ScanResult<UnitStats> {
    let name = unit.name().to_string();
    // Decoding and chain verification are CPU-bound
    let Evaluation {
        messages: found,
        stats,
    } = tokio::task::spawn_blocking(move || policy.evaluate(&unit)).await?;

    for message in found {
        if messages.send(message).await.is_err() {
            debug!("Message receiver closed, dropping output for {name}");
            break;
        }
    }

    Ok(stats)
}
