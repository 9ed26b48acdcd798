//! Sizing and wiring options for multisets and registries.

use std::sync::Arc;

use serde::Deserialize;

use crate::error::{IndexError, Result};
use crate::metrics::{default_metrics, IndexMetrics};

/// Table sizing policy for a [`crate::ClassifierMultiset`].
///
/// Watermarks are ratios of occupied cells to bucket count, so the average
/// bucket chain stays bounded however many classifiers are in use.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct MultisetOptions {
    /// Bucket count of a new table and lower bound for shrinking. Rounded up to a power of two.
    pub initial_capacity: usize,
    /// Double the table once occupancy exceeds this ratio.
    pub grow_load: f64,
    /// Halve the table once occupancy drops below this ratio.
    pub shrink_load: f64,
}

impl Default for MultisetOptions {
    fn default() -> Self {
        Self {
            initial_capacity: 16,
            grow_load: 0.75,
            shrink_load: 0.25,
        }
    }
}

impl MultisetOptions {
    /// Sets the initial bucket count.
    pub fn initial_capacity(mut self, buckets: usize) -> Self {
        self.initial_capacity = buckets;
        self
    }

    /// Sets the growth watermark.
    pub fn grow_load(mut self, ratio: f64) -> Self {
        self.grow_load = ratio;
        self
    }

    /// Sets the shrink watermark.
    pub fn shrink_load(mut self, ratio: f64) -> Self {
        self.shrink_load = ratio;
        self
    }

    /// Checks that the watermarks leave room for hysteresis.
    ///
    /// Halving a table at `shrink_load` doubles its occupancy, which must
    /// stay under `grow_load` or the table would oscillate.
    pub fn validate(&self) -> Result<()> {
        if self.initial_capacity == 0 {
            return Err(IndexError::Invalid("initial_capacity must be positive"));
        }
        if !(self.grow_load > 0.0 && self.grow_load <= 1.0) {
            return Err(IndexError::Invalid("grow_load must be in (0, 1]"));
        }
        if !(self.shrink_load >= 0.0 && self.shrink_load * 2.0 < self.grow_load) {
            return Err(IndexError::Invalid(
                "shrink_load must be non-negative and below half of grow_load",
            ));
        }
        Ok(())
    }

    pub(crate) fn bucket_floor(&self) -> usize {
        self.initial_capacity.max(1).next_power_of_two()
    }
}

/// Configuration supplied when building an [`crate::IndexRegistry`].
#[derive(Clone)]
pub struct RegistryOptions {
    /// Collector for index hit/miss counters.
    pub metrics: Arc<dyn IndexMetrics>,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            metrics: default_metrics(),
        }
    }
}

impl RegistryOptions {
    /// Sets the metrics collector.
    pub fn metrics(mut self, metrics: Arc<dyn IndexMetrics>) -> Self {
        self.metrics = metrics;
        self
    }
}
