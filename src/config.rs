//! Engine configuration.
//!
//! A [`Config`] is handed to the store at construction time and never
//! changes afterwards: the R-tree fan-out bounds, the distance convention and
//! the k-nearest expansion policy are all fixed for the store's lifetime.
use crate::compute::validation::validate_fanout;
use crate::error::{GeoQueryError, Result};
use geo::{Distance, Euclidean, Haversine, Point};
use serde::{Deserialize, Serialize};

/// Distance convention used by every query of a store.
///
/// - **Euclidean**: planar distance in coordinate units
/// - **Haversine**: great-circle distance in metres on a spherical Earth,
///   coordinates interpreted as longitude/latitude degrees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    #[default]
    Euclidean,
    Haversine,
}

impl DistanceMetric {
    /// Distance between two points under this metric.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use geoquery::DistanceMetric;
    /// use geo::Point;
    ///
    /// let d = DistanceMetric::Euclidean.distance(Point::new(0.0, 0.0), Point::new(3.0, 4.0));
    /// assert_eq!(d, 5.0);
    ///
    /// let nyc = Point::new(-74.0060, 40.7128);
    /// let la = Point::new(-118.2437, 34.0522);
    /// let d = DistanceMetric::Haversine.distance(nyc, la);
    /// assert!(d > 3_900_000.0 && d < 4_000_000.0);
    /// ```
    pub fn distance(self, a: Point, b: Point) -> f64 {
        match self {
            DistanceMetric::Euclidean => Euclidean.distance(a, b),
            DistanceMetric::Haversine => Haversine.distance(a, b),
        }
    }

    pub fn is_spherical(self) -> bool {
        matches!(self, DistanceMetric::Haversine)
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Minimum entries per non-root R-tree node
    #[serde(default = "Config::default_min_entries")]
    pub min_entries: usize,

    /// Maximum entries per R-tree node; must be at least `2 * min_entries`
    #[serde(default = "Config::default_max_entries")]
    pub max_entries: usize,

    #[serde(default)]
    pub distance_metric: DistanceMetric,

    /// Search-rectangle doublings before k-nearest falls back to a full scan
    #[serde(default = "Config::default_knn_max_retries")]
    pub knn_max_retries: u32,

    /// First k-nearest search radius in metric units. Derived from the index
    /// extent when unset.
    #[serde(default)]
    pub knn_initial_radius: Option<f64>,

    /// Upper clamp applied to k in nearest queries
    #[serde(default)]
    pub max_nearest: Option<usize>,
}

impl Config {
    pub const DEFAULT_MIN_ENTRIES: usize = 2;
    pub const DEFAULT_MAX_ENTRIES: usize = 8;

    const fn default_min_entries() -> usize {
        Self::DEFAULT_MIN_ENTRIES
    }

    const fn default_max_entries() -> usize {
        Self::DEFAULT_MAX_ENTRIES
    }

    const fn default_knn_max_retries() -> u32 {
        16
    }

    pub fn with_fanout(mut self, min_entries: usize, max_entries: usize) -> Self {
        self.min_entries = min_entries;
        self.max_entries = max_entries;
        self
    }

    pub fn with_distance_metric(mut self, metric: DistanceMetric) -> Self {
        self.distance_metric = metric;
        self
    }

    pub fn with_knn_max_retries(mut self, retries: u32) -> Self {
        self.knn_max_retries = retries;
        self
    }

    pub fn with_knn_initial_radius(mut self, radius: f64) -> Self {
        self.knn_initial_radius = Some(radius);
        self
    }

    pub fn with_max_nearest(mut self, limit: usize) -> Self {
        self.max_nearest = Some(limit);
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_fanout(self.min_entries, self.max_entries)?;

        if self.knn_max_retries == 0 {
            return Err(GeoQueryError::InvalidConfig(
                "knn_max_retries must be greater than zero".to_string(),
            ));
        }

        if let Some(radius) = self.knn_initial_radius
            && !(radius.is_finite() && radius > 0.0)
        {
            return Err(GeoQueryError::InvalidConfig(format!(
                "knn_initial_radius must be a positive finite number, got: {}",
                radius
            )));
        }

        if self.max_nearest == Some(0) {
            return Err(GeoQueryError::InvalidConfig(
                "max_nearest must be greater than zero".to_string(),
            ));
        }

        if self.max_entries > 256 {
            log::warn!(
                "R-tree fan-out of {} is very large; node scans will dominate query cost",
                self.max_entries
            );
        }

        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config =
            serde_json::from_str(json).map_err(|e| GeoQueryError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(toml_str).map_err(|e| GeoQueryError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_entries: Self::default_min_entries(),
            max_entries: Self::default_max_entries(),
            distance_metric: DistanceMetric::default(),
            knn_max_retries: Self::default_knn_max_retries(),
            knn_initial_radius: None,
            max_nearest: None,
        }
    }
}
