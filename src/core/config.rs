//! # Runtime configuration.
//!
//! Provides [`ServiceConfig`] (service-wide settings) and [`ActivityConfig`]
//! (activity manager settings, embedded in `ServiceConfig::activity`).
//!
//! Config is used in two ways:
//! 1. **Service creation**: `Service::builder(bus_id, transport).config(cfg)`
//! 2. **Standalone activity manager**: `ActivityManager::new(cfg.activity)`
//!
//! ## Sentinel values
//! - `bus_capacity = 0` → clamped to 1 by the event bus
//! - `idle_timeout = 0s` → the idle timer fires on the next scheduler turn

use std::time::Duration;

/// Security model of the bus attachment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SecurityModel {
    /// Legacy model: one private and one public handle.
    #[default]
    DualBus,
    /// Access-control-group model: a single unified handle.
    Acg,
}

/// Platform capability descriptor.
///
/// Selects, once, which placeholder activity variant the activity manager mints.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Platform {
    /// Real + dummy activities (`dummy_N` ids, `isDummyActivity` flag).
    #[default]
    Legacy,
    /// Real + internal activities (`internal_N` ids, `isInternalActivity` flag),
    /// plus a one-shot diagnostic timer on first internal creation.
    Unified,
}

impl Platform {
    /// Whether the platform mints native internal activities.
    #[inline]
    pub fn has_internal_activities(self) -> bool {
        matches!(self, Platform::Unified)
    }

    /// Prefix of locally minted activity ids.
    #[inline]
    pub fn local_id_prefix(self) -> &'static str {
        match self {
            Platform::Legacy => "dummy_",
            Platform::Unified => "internal_",
        }
    }
}

/// Activity manager settings.
#[derive(Clone, Debug)]
pub struct ActivityConfig {
    /// Idle time with no activity before the process exits.
    pub idle_timeout: Duration,

    /// When false, an idle timeout only logs a warning.
    pub exit_on_timeout: bool,

    /// When true, `create` never issues a real bus-backed activity.
    pub use_dummy_activity: bool,

    /// Placeholder activity variant.
    pub platform: Platform,

    /// Delay of the unified-platform diagnostic timer.
    pub diagnostic_delay: Duration,
}

impl Default for ActivityConfig {
    /// - `idle_timeout = 5s`
    /// - `exit_on_timeout = true`
    /// - `use_dummy_activity = false`
    /// - `platform = Platform::Legacy`
    /// - `diagnostic_delay = 60s`
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(5),
            exit_on_timeout: true,
            use_dummy_activity: false,
            platform: Platform::default(),
            diagnostic_delay: Duration::from_secs(60),
        }
    }
}

/// Service-wide settings.
///
/// All fields are public; the presets [`ServiceConfig::acg`] and
/// [`ServiceConfig::with_idle_timeout`] cover the common cases.
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    /// Handle model.
    pub security: SecurityModel,

    /// Skip the built-in `info` and `quit` methods.
    pub no_builtin_methods: bool,

    /// Capacity of the runtime event bus.
    pub bus_capacity: usize,

    /// Settings for the activity manager created by the builder.
    pub activity: ActivityConfig,
}

impl ServiceConfig {
    /// Unified-handle preset: ACG security with the unified platform variant.
    pub fn acg() -> Self {
        Self {
            security: SecurityModel::Acg,
            activity: ActivityConfig {
                platform: Platform::Unified,
                ..ActivityConfig::default()
            },
            ..Self::default()
        }
    }

    /// Returns the config with a different idle timeout.
    pub fn with_idle_timeout(mut self, idle: Duration) -> Self {
        self.activity.idle_timeout = idle;
        self
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// True when the single unified handle is in use.
    #[inline]
    pub fn uses_acg(&self) -> bool {
        matches!(self.security, SecurityModel::Acg)
    }
}

impl Default for ServiceConfig {
    /// - `security = SecurityModel::DualBus`
    /// - `no_builtin_methods = false`
    /// - `bus_capacity = 1024`
    /// - `activity = ActivityConfig::default()`
    fn default() -> Self {
        Self {
            security: SecurityModel::default(),
            no_builtin_methods: false,
            bus_capacity: 1024,
            activity: ActivityConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = ServiceConfig::default();
        assert_eq!(cfg.activity.idle_timeout, Duration::from_secs(5));
        assert!(cfg.activity.exit_on_timeout);
        assert!(!cfg.uses_acg());
        assert_eq!(cfg.activity.platform, Platform::Legacy);
    }

    #[test]
    fn acg_preset_selects_unified_platform() {
        let cfg = ServiceConfig::acg();
        assert!(cfg.uses_acg());
        assert!(cfg.activity.platform.has_internal_activities());
        assert_eq!(cfg.activity.platform.local_id_prefix(), "internal_");
    }

    #[test]
    fn bus_capacity_is_clamped() {
        let cfg = ServiceConfig {
            bus_capacity: 0,
            ..ServiceConfig::default()
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
