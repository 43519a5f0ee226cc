pub mod classifier;
pub mod diagnostics;
pub mod extractor;
pub mod histogram;
pub mod hsv;
pub mod quantize;

pub use classifier::{is_blue, BlueClassifier, ClassifierConfig};
pub use diagnostics::ImageDiagnostics;
pub use extractor::{extract, BlueExtractor, Extraction, ExtractorConfig, PopulationSource};
pub use histogram::ColorHistogram;
pub use hsv::Hsv;
pub use quantize::Bucket;
