use tokio::task::JoinSet;
use tower::{ServiceBuilder, ServiceExt};
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use super::instrumented::InstrumentedLayer;
use super::row_processor::{IndexedRow, ProcessedRow, RowOutcome, RowProcessor};
use crate::catalog::{AugmentedRow, CatalogRow};

/// Per-run counters, logged when a batch finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub with_blue: usize,
    pub without_blue: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchSummary {
    fn record(&mut self, outcome: &RowOutcome) {
        match outcome {
            RowOutcome::Skipped => self.skipped += 1,
            RowOutcome::Completed { shades: 0, .. } => self.without_blue += 1,
            RowOutcome::Completed { .. } => self.with_blue += 1,
            RowOutcome::Failed(_) => self.failed += 1,
        }
    }
}

/// Runs the row processor over a catalog with bounded concurrency.
///
/// Output order always matches input order and every input row produces
/// exactly one output row.
pub struct BatchOrchestrator {
    processor: RowProcessor,
    workers: usize,
}

impl BatchOrchestrator {
    pub fn new(processor: RowProcessor, workers: usize) -> Self {
        Self {
            processor,
            workers: workers.max(1),
        }
    }

    pub async fn run(&self, rows: Vec<CatalogRow>) -> Vec<AugmentedRow> {
        self.run_with_summary(rows).await.0
    }

    pub async fn run_with_summary(
        &self,
        rows: Vec<CatalogRow>,
    ) -> (Vec<AugmentedRow>, BatchSummary) {
        let span = info_span!("batch", run_id = %Uuid::new_v4(), rows = rows.len());
        self.dispatch(rows).instrument(span).await
    }

    async fn dispatch(&self, rows: Vec<CatalogRow>) -> (Vec<AugmentedRow>, BatchSummary) {
        let total = rows.len();
        info!("Processing {} rows with {} workers", total, self.workers);

        let service = ServiceBuilder::new()
            .concurrency_limit(self.workers)
            .layer(InstrumentedLayer::new("row"))
            .service(self.processor.clone());

        // Rows whose task dies keep this placeholder.
        let mut slots: Vec<AugmentedRow> = rows
            .iter()
            .cloned()
            .map(AugmentedRow::without_color)
            .collect();

        let mut tasks = JoinSet::new();
        for (index, row) in rows.into_iter().enumerate() {
            let service = service.clone();
            tasks.spawn(
                async move { service.oneshot(IndexedRow { index, row }).await }.in_current_span(),
            );
        }

        let mut summary = BatchSummary {
            total,
            ..BatchSummary::default()
        };
        let mut done = 0;

        while let Some(joined) = tasks.join_next().await {
            done += 1;
            match joined {
                Ok(Ok(processed)) => {
                    log_progress(done, total, &processed);
                    summary.record(&processed.outcome);
                    if let Some(slot) = slots.get_mut(processed.index) {
                        *slot = processed.row;
                    }
                }
                Ok(Err(e)) => {
                    summary.failed += 1;
                    error!("[{}/{}] Row service failed: {}", done, total, e);
                }
                Err(e) => {
                    summary.failed += 1;
                    error!("[{}/{}] Row task died: {}", done, total, e);
                }
            }
        }

        info!(
            with_blue = summary.with_blue,
            without_blue = summary.without_blue,
            skipped = summary.skipped,
            failed = summary.failed,
            "Finished {} rows",
            total
        );

        (slots, summary)
    }
}

fn log_progress(done: usize, total: usize, processed: &ProcessedRow) {
    let id = &processed.row.id;
    match &processed.outcome {
        RowOutcome::Skipped => info!("[{}/{}] Skipped ID {}: no URL", done, total, id),
        RowOutcome::Completed { shades, .. } => {
            info!("[{}/{}] ID {} done, found {} blue shades", done, total, id, shades)
        }
        RowOutcome::Failed(reason) => {
            info!("[{}/{}] ID {} failed: {}", done, total, id, reason)
        }
    }
}
