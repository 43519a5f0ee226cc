pub mod batch;
pub mod instrumented;
pub mod preprocessing;
pub mod row_processor;

pub use batch::{BatchOrchestrator, BatchSummary};
pub use instrumented::{Instrumented, InstrumentedLayer};
pub use row_processor::{IndexedRow, ProcessedRow, RowOutcome, RowProcessor};
