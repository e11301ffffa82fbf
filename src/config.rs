use crate::cli::Args;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Inclusive per-channel HSV band used for thresholding.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ColorRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl ColorRange {
    pub fn new(lower: [u8; 3], upper: [u8; 3]) -> Result<Self> {
        for i in 0..3 {
            if lower[i] > upper[i] {
                bail!(
                    "invalid color range: lower[{}]={} exceeds upper[{}]={}",
                    i,
                    lower[i],
                    i,
                    upper[i]
                );
            }
        }
        Ok(Self { lower, upper })
    }
}

fn default_publish_rate() -> f64 {
    100.0
}

fn default_box_color() -> [u8; 3] {
    [0, 255, 0]
}

/// Immutable process configuration, validated once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Ticks per second for the processing loop.
    #[serde(default = "default_publish_rate")]
    pub publish_rate: f64,
    pub lower_color_boundary: [u8; 3],
    pub upper_color_boundary: [u8; 3],
    /// BGR color for the annotation rectangles.
    #[serde(default = "default_box_color")]
    pub box_color: [u8; 3],
    #[serde(default)]
    pub visualization: bool,
}

impl FilterConfig {
    /// Load from a JSON file (same shape as the named-parameter set the
    /// process would otherwise receive on the command line).
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: FilterConfig = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Build from CLI arguments. The color boundaries are required; their
    /// absence is a fatal startup error.
    pub fn from_args(args: &Args) -> Result<Self> {
        if let Some(path) = &args.config {
            return Self::from_file(path);
        }

        let lower = args
            .lower_color_boundary
            .as_ref()
            .context("missing required parameter: lower_color_boundary")?;
        let upper = args
            .upper_color_boundary
            .as_ref()
            .context("missing required parameter: upper_color_boundary")?;

        let config = Self {
            publish_rate: args.publish_rate,
            lower_color_boundary: parse_triple(lower, "lower_color_boundary")?,
            upper_color_boundary: parse_triple(upper, "upper_color_boundary")?,
            box_color: parse_triple(&args.box_color, "box_color")?,
            visualization: args.visualization,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.publish_rate > 0.0) || !self.publish_rate.is_finite() {
            bail!("publish_rate must be positive, got {}", self.publish_rate);
        }
        // Constructing the range enforces lower[i] <= upper[i].
        self.color_range()?;
        Ok(())
    }

    pub fn color_range(&self) -> Result<ColorRange> {
        ColorRange::new(self.lower_color_boundary, self.upper_color_boundary)
    }

    pub fn tick_period(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / self.publish_rate)
    }
}

fn parse_triple(values: &[u8], name: &str) -> Result<[u8; 3]> {
    match values {
        [a, b, c] => Ok([*a, *b, *c]),
        other => bail!(
            "{} must have exactly 3 components, got {}",
            name,
            other.len()
        ),
    }
}
