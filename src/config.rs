use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;

use crate::intro_date::NormalizeOptions;
use crate::report::{Dimension, Metric};

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub normalizer: NormalizerConfig,

    #[serde(default)]
    pub ab_test: AbTestConfig,
}

#[derive(Debug, Deserialize)]
pub struct NormalizerConfig {
    #[serde(default = "default_min_year")]
    pub min_year: i32,

    #[serde(default = "default_max_year")]
    pub max_year: i32,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            min_year: default_min_year(),
            max_year: default_max_year(),
        }
    }
}

impl NormalizerConfig {
    pub fn to_options(&self) -> NormalizeOptions {
        NormalizeOptions {
            min_year: self.min_year,
            max_year: self.max_year,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AbTestConfig {
    #[serde(default = "default_alpha")]
    pub alpha: f64,

    #[serde(default = "default_dimension")]
    pub dimension: String,

    #[serde(default = "default_metric")]
    pub metric: String,

    pub group_a: Option<String>,
    pub group_b: Option<String>,
}

impl Default for AbTestConfig {
    fn default() -> Self {
        Self {
            alpha: default_alpha(),
            dimension: default_dimension(),
            metric: default_metric(),
            group_a: None,
            group_b: None,
        }
    }
}

fn default_min_year() -> i32 {
    1000
}

fn default_max_year() -> i32 {
    9999
}

fn default_alpha() -> f64 {
    0.05
}

fn default_dimension() -> String {
    "province".to_string()
}

fn default_metric() -> String {
    "loss_ratio".to_string()
}

/// Load configuration from claimscope.toml and environment variables
pub fn load() -> Config {
    Figment::new()
        .merge(Toml::file("claimscope.toml"))
        // Use double-underscore nesting for snake_case keys
        .merge(Env::prefixed("CLAIMSCOPE_").split("__"))
        .extract()
        .expect("Failed to load configuration")
}

/// Validate configuration and return a user-friendly error
pub fn validate(config: &Config) -> Result<(), String> {
    let normalizer = &config.normalizer;

    if normalizer.min_year > normalizer.max_year {
        return Err("normalizer.min_year must not exceed normalizer.max_year".into());
    }

    let ab_test = &config.ab_test;

    if !(ab_test.alpha > 0.0 && ab_test.alpha < 1.0) {
        return Err("ab_test.alpha must be strictly between 0 and 1".into());
    }

    if ab_test.dimension.parse::<Dimension>().is_err() {
        return Err(format!(
            "ab_test.dimension is not a known grouping axis: {}",
            ab_test.dimension
        ));
    }

    if ab_test.metric.parse::<Metric>().is_err() {
        return Err(format!(
            "ab_test.metric is not a known metric: {}",
            ab_test.metric
        ));
    }

    if ab_test.group_a.is_some() != ab_test.group_b.is_some() {
        return Err("ab_test.group_a and ab_test.group_b must be set together".into());
    }

    Ok(())
}
