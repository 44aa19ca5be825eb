//! Host configuration.
//!
//! [`SurfaceConfig`] holds the two fixed sizes of a hosted surface: the
//! displayed size and the backing-store resolution. [`HostConfig`] wraps it
//! together with the logging level and the event channel capacity.
//!
//! Both provide defaults via [`Default`] and a fluent builder that validates
//! on [`build`](SurfaceConfigBuilder::build).
//!
//! # Examples
//!
//! ## Use defaults
//! ```rust
//! use render_host::config::SurfaceConfig;
//! let cfg = SurfaceConfig::default();
//! assert_eq!(cfg.display.width, 500);
//! assert_eq!(cfg.backing.width, 1000);
//! ```
//!
//! ## Customize with the builder
//! ```rust
//! use render_host::config::SurfaceConfig;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = SurfaceConfig::builder()
//!     .display_size(320, 240)
//!     .backing_size(960, 720)
//!     .build()?;
//! assert_eq!(cfg.device_pixel_ratio(), 3.0);
//! # Ok(()) }
//! ```
//!
//! ## Load from JSON
//! ```rust
//! use render_host::config::{HostConfig, LogLevel};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = HostConfig::from_json_str(r#"{ "log_level": "debug" }"#)?;
//! assert_eq!(cfg.log_level, LogLevel::Debug);
//! assert_eq!(cfg.surface.backing.height, 1000);
//! # Ok(()) }
//! ```

use crate::errors::HostError;
use crate::surface::{device_pixel_ratio, LogicalSize, PixelSize};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Displayed size used when none is configured.
pub const DEFAULT_DISPLAY_SIZE: LogicalSize = LogicalSize::new(500, 500);
/// Backing-store resolution used when none is configured.
pub const DEFAULT_BACKING_SIZE: PixelSize = PixelSize::new(1000, 1000);
/// Number of lifecycle events buffered per subscriber.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Sizes of a hosted surface. Fixed for the lifetime of a mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    /// Room the surface occupies in layout
    pub display: LogicalSize,
    /// Pixel grid the engine renders into
    pub backing: PixelSize,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            display: DEFAULT_DISPLAY_SIZE,
            backing: DEFAULT_BACKING_SIZE,
        }
    }
}

impl SurfaceConfig {
    pub fn builder() -> SurfaceConfigBuilder {
        SurfaceConfigBuilder::default()
    }

    /// Device pixels per layout unit along the horizontal axis.
    pub fn device_pixel_ratio(&self) -> f32 {
        device_pixel_ratio(self.backing, self.display)
    }
}

/// Builder for [`SurfaceConfig`].
#[derive(Debug, Clone, Default)]
pub struct SurfaceConfigBuilder {
    inner: SurfaceConfig,
}

impl SurfaceConfigBuilder {
    #[inline]
    fn map(mut self, f: impl FnOnce(&mut SurfaceConfig)) -> Self {
        f(&mut self.inner);
        self
    }

    pub fn display_size(self, width: u32, height: u32) -> Self { self.map(|c| c.display = LogicalSize::new(width, height)) }
    pub fn backing_size(self, width: u32, height: u32) -> Self { self.map(|c| c.backing = PixelSize::new(width, height)) }

    /// Validate and build the final config.
    pub fn build(self) -> Result<SurfaceConfig, ConfigError> {
        validate_surface(&self.inner)?;
        Ok(self.inner)
    }
}

/// Log verbosity installed by the bootstrap diagnostics hook.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Main host configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Sizes for every surface the host provisions
    pub surface: SurfaceConfig,
    /// Level for the logger installed during bootstrap
    pub log_level: LogLevel,
    /// Capacity of the lifecycle event channel
    pub event_capacity: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            surface: SurfaceConfig::default(),
            log_level: LogLevel::default(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl HostConfig {
    pub fn builder() -> HostConfigBuilder {
        HostConfigBuilder::default()
    }

    /// Parse a JSON document. Missing fields fall back to their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, HostError> {
        let cfg: HostConfig = serde_json::from_str(json)?;
        validate_host(&cfg)?;
        Ok(cfg)
    }
}

/// Builder for [`HostConfig`], mirroring [`SurfaceConfigBuilder`].
#[derive(Debug, Clone, Default)]
pub struct HostConfigBuilder {
    inner: HostConfig,
}

impl HostConfigBuilder {
    #[inline]
    fn map(mut self, f: impl FnOnce(&mut HostConfig)) -> Self {
        f(&mut self.inner);
        self
    }

    pub fn surface(self, surface: SurfaceConfig) -> Self { self.map(|c| c.surface = surface) }
    pub fn display_size(self, width: u32, height: u32) -> Self { self.map(|c| c.surface.display = LogicalSize::new(width, height)) }
    pub fn backing_size(self, width: u32, height: u32) -> Self { self.map(|c| c.surface.backing = PixelSize::new(width, height)) }
    pub fn log_level(self, level: LogLevel) -> Self { self.map(|c| c.log_level = level) }
    pub fn event_capacity(self, capacity: usize) -> Self { self.map(|c| c.event_capacity = capacity) }

    pub fn build(self) -> Result<HostConfig, ConfigError> {
        validate_host(&self.inner)?;
        Ok(self.inner)
    }
}

// ---------- Validation ----------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    EmptyDisplay(LogicalSize),
    EmptyBacking(PixelSize),
    ZeroEventCapacity,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptyDisplay(size) =>
                write!(f, "display size {size} must be non-zero in both dimensions"),
            ConfigError::EmptyBacking(size) =>
                write!(f, "backing size {size} must be non-zero in both dimensions"),
            ConfigError::ZeroEventCapacity =>
                write!(f, "event_capacity must be at least 1"),
        }
    }
}

impl std::error::Error for ConfigError {}

fn validate_surface(c: &SurfaceConfig) -> Result<(), ConfigError> {
    if c.display.is_empty() {
        return Err(ConfigError::EmptyDisplay(c.display));
    }
    if c.backing.is_empty() {
        return Err(ConfigError::EmptyBacking(c.backing));
    }
    Ok(())
}

pub(crate) fn validate_host(c: &HostConfig) -> Result<(), ConfigError> {
    validate_surface(&c.surface)?;
    if c.event_capacity == 0 {
        return Err(ConfigError::ZeroEventCapacity);
    }
    Ok(())
}
