use std::path::Path;

use config::{Environment, File, Source};
use serde::{Deserialize, Serialize};

use crate::color::{BlueClassifier, BlueExtractor, ClassifierConfig, ExtractorConfig};
use crate::error::ConfigError;

const ENV_PREFIX: &str = "MUSEUM_BLUES";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub classifier: ClassifierConfig,
    pub extractor: ExtractorConfig,
    pub fetch: FetchConfig,
    pub batch: BatchConfig,
}

/// Settings for the HTTP image fetcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    /// Skip TLS certificate validation. Several institutional image hosts
    /// serve self-signed or misconfigured certificates.
    pub accept_invalid_certs: bool,
    pub user_agent: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub workers: usize,
    /// Longest image side kept before extraction, larger images are downsampled.
    pub max_dimension: u32,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            classifier: ClassifierConfig::default(),
            extractor: ExtractorConfig::default(),
            fetch: FetchConfig::default(),
            batch: BatchConfig::default(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            accept_invalid_certs: true,
            user_agent: concat!("museum-blues/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            workers: 5,
            max_dimension: 800,
        }
    }
}

impl Configuration {
    /// Layers the defaults, an optional TOML file and `MUSEUM_BLUES_*`
    /// environment variables (`__` separates sections, e.g.
    /// `MUSEUM_BLUES_BATCH__WORKERS=8`).
    ///
    /// The result is not validated, callers apply their own overrides first
    /// and then call [`Configuration::validate`].
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::assemble(path.map(|path| File::from(path).required(true)))
    }

    fn assemble<S>(file: Option<S>) -> Result<Self, ConfigError>
    where
        S: Source + Send + Sync + 'static,
    {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Self::default())?);
        if let Some(file) = file {
            builder = builder.add_source(file);
        }

        let configuration = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(configuration)
    }

    pub fn extractor(&self) -> BlueExtractor {
        BlueExtractor::new(
            BlueClassifier::new(self.classifier.clone()),
            self.extractor.clone(),
        )
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let classifier = &self.classifier;
        if !(0.0..=360.0).contains(&classifier.hue_min)
            || !(0.0..=360.0).contains(&classifier.hue_max)
            || classifier.hue_min > classifier.hue_max
        {
            return Err(invalid(format!(
                "Hue window [{}, {}] must lie within [0, 360] and be ordered",
                classifier.hue_min, classifier.hue_max
            )));
        }

        if !(0.0..1.0).contains(&classifier.min_saturation) {
            return Err(invalid("Minimum saturation must be in [0, 1)"));
        }

        if !(0.0..1.0).contains(&classifier.min_value) {
            return Err(invalid("Minimum value must be in [0, 1)"));
        }

        if self.extractor.bucket_step == 0 {
            return Err(invalid("Bucket step must be greater than 0"));
        }

        if self.extractor.retain_thresholds.is_empty() {
            return Err(invalid("At least one retain threshold is required"));
        }

        if let Some(bad) = self
            .extractor
            .retain_thresholds
            .iter()
            .find(|threshold| !(**threshold > 0.0 && **threshold <= 1.0))
        {
            return Err(invalid(format!(
                "Retain threshold {bad} must be in (0, 1]"
            )));
        }

        if self.fetch.timeout_secs == 0 {
            return Err(invalid("Fetch timeout must be greater than 0"));
        }

        if self.batch.workers == 0 {
            return Err(invalid("Worker count must be greater than 0"));
        }

        if self.batch.max_dimension == 0 {
            return Err(invalid("Max dimension must be greater than 0"));
        }

        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn defaults_are_valid() {
        let configuration = Configuration::default();
        assert!(configuration.validate().is_ok());
        assert_eq!(configuration.extractor.bucket_step, 32);
        assert_eq!(configuration.extractor.retain_thresholds, vec![0.05, 0.03]);
        assert_eq!(configuration.batch.workers, 5);
        assert_eq!(configuration.batch.max_dimension, 800);
        assert_eq!(configuration.fetch.timeout_secs, 15);
        assert!(configuration.fetch.accept_invalid_certs);
    }

    #[test]
    fn toml_overrides_only_the_keys_it_names() {
        let toml = r#"
            [extractor]
            bucket_step = 16
            retain_thresholds = [0.1, 0.05, 0.01]

            [batch]
            workers = 2
        "#;

        let configuration =
            Configuration::assemble(Some(File::from_str(toml, FileFormat::Toml))).unwrap();

        assert_eq!(configuration.extractor.bucket_step, 16);
        assert_eq!(
            configuration.extractor.retain_thresholds,
            vec![0.1, 0.05, 0.01]
        );
        assert_eq!(configuration.batch.workers, 2);
        assert_eq!(configuration.batch.max_dimension, 800);
        assert_eq!(configuration.classifier, ClassifierConfig::default());
        assert_eq!(configuration.extractor().config().bucket_step, 16);
    }

    #[test]
    fn invalid_file_value_can_be_overridden_before_validation() {
        let toml = r#"
            [batch]
            workers = 0
        "#;

        let mut configuration =
            Configuration::assemble(Some(File::from_str(toml, FileFormat::Toml))).unwrap();
        assert!(matches!(
            configuration.validate(),
            Err(ConfigError::Invalid(_))
        ));

        configuration.batch.workers = 4;
        assert!(configuration.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut configuration = Configuration::default();
        configuration.extractor.bucket_step = 0;
        assert!(configuration.validate().is_err());

        let mut configuration = Configuration::default();
        configuration.extractor.retain_thresholds.clear();
        assert!(configuration.validate().is_err());

        let mut configuration = Configuration::default();
        configuration.extractor.retain_thresholds = vec![0.05, 1.5];
        assert!(configuration.validate().is_err());

        let mut configuration = Configuration::default();
        configuration.classifier.hue_min = 270.0;
        assert!(configuration.validate().is_err());

        let mut configuration = Configuration::default();
        configuration.batch.max_dimension = 0;
        assert!(configuration.validate().is_err());

        let mut configuration = Configuration::default();
        configuration.fetch.timeout_secs = 0;
        assert!(configuration.validate().is_err());
    }
}
