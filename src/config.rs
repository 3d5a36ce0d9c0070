//! Configuration resolution.
//!
//! A plain data struct with a `Default`, plus a resolver that layers
//! request overrides on top of environment variables on top of hardcoded
//! fallbacks. This crate's configuration surface is request params + env
//! vars only, so there is no file round-trip here — the precedence chain
//! itself is the "load" step.

use std::env;
use std::path::{Path, PathBuf};

use crate::error::CoreError;

/// Default observer location: Tokyo (35.681236, 139.767125).
pub const DEFAULT_LAT: f64 = 35.681236;
pub const DEFAULT_LON: f64 = 139.767125;

/// Fallback ephemeris filename when nothing else is configured.
pub const DEFAULT_EPHEMERIS_NAME: &str = "de440s.bsp";

/// Directory the default ephemeris name is resolved against.
pub const DEFAULT_EPHEMERIS_DIR: &str = "data";

/// Per-request overrides a caller may supply; every field is optional and
/// falls through the precedence chain below.
#[derive(Debug, Default, Clone)]
pub struct RequestOverrides {
    pub ephemeris_path: Option<String>,
    pub ephemeris_name: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// Where the resolved ephemeris ultimately comes from, and whether that
/// source was explicitly requested (by a caller or an env var) as opposed
/// to the crate's own hardcoded fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EphemerisSource {
    /// A literal file path. If `explicit`, the file must exist or
    /// acquisition fails with `EphemerisUnavailable`.
    Path { path: String, explicit: bool },
    /// A filename resolved against [`DEFAULT_EPHEMERIS_DIR`].
    Name { name: String, explicit: bool },
}

impl EphemerisSource {
    pub fn is_explicit(&self) -> bool {
        match self {
            EphemerisSource::Path { explicit, .. } | EphemerisSource::Name { explicit, .. } => {
                *explicit
            }
        }
    }

    /// The path to check/open on disk.
    pub fn resolved_path(&self) -> PathBuf {
        match self {
            EphemerisSource::Path { path, .. } => PathBuf::from(path),
            EphemerisSource::Name { name, .. } => Path::new(DEFAULT_EPHEMERIS_DIR).join(name),
        }
    }

    /// The bare filename surfaced in `meta.ephemeris`.
    pub fn display_name(&self) -> String {
        match self {
            EphemerisSource::Path { path, .. } => Path::new(path)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.clone()),
            EphemerisSource::Name { name, .. } => name.clone(),
        }
    }
}

/// Resolved configuration for a single request.
#[derive(Debug, Clone)]
pub struct Config {
    /// Fixed at `"Asia/Tokyo"`; reserved for future variability.
    pub tz: &'static str,
    /// Fixed at `"jst"`.
    pub day_basis: &'static str,
    pub ephemeris: EphemerisSource,
    pub lat: f64,
    pub lon: f64,
}

impl Default for Config {
    fn default() -> Self {
        Config::resolve(&RequestOverrides::default()).expect("default overrides always resolve")
    }
}

impl Config {
    /// Implements the precedence chain:
    /// explicit `ephemeris_path` -> env `TOKI_EPHEMERIS_PATH` ->
    /// explicit `ephemeris` name -> env `TOKI_EPHEMERIS` ->
    /// default `de440s.bsp` under `data/`.
    pub fn resolve(overrides: &RequestOverrides) -> Result<Self, CoreError> {
        let ephemeris = Self::resolve_ephemeris(overrides);

        let lat = overrides.lat.unwrap_or(DEFAULT_LAT);
        let lon = overrides.lon.unwrap_or(DEFAULT_LON);
        if !(-90.0..=90.0).contains(&lat) {
            return Err(CoreError::InvalidInput {
                reason: format!("lat {lat} out of range [-90, 90]"),
            });
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(CoreError::InvalidInput {
                reason: format!("lon {lon} out of range [-180, 180]"),
            });
        }

        Ok(Config {
            tz: "Asia/Tokyo",
            day_basis: "jst",
            ephemeris,
            lat,
            lon,
        })
    }

    fn resolve_ephemeris(overrides: &RequestOverrides) -> EphemerisSource {
        if let Some(path) = &overrides.ephemeris_path {
            return EphemerisSource::Path {
                path: path.clone(),
                explicit: true,
            };
        }
        if let Ok(path) = env::var("TOKI_EPHEMERIS_PATH") {
            return EphemerisSource::Path {
                path,
                explicit: true,
            };
        }
        if let Some(name) = &overrides.ephemeris_name {
            return EphemerisSource::Name {
                name: name.clone(),
                explicit: true,
            };
        }
        if let Ok(name) = env::var("TOKI_EPHEMERIS") {
            return EphemerisSource::Name {
                name,
                explicit: true,
            };
        }
        EphemerisSource::Name {
            name: DEFAULT_EPHEMERIS_NAME.to_string(),
            explicit: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_fallback_ephemeris() {
        let cfg = Config::default();
        assert_eq!(cfg.tz, "Asia/Tokyo");
        assert_eq!(cfg.day_basis, "jst");
        assert_eq!(cfg.ephemeris.display_name(), DEFAULT_EPHEMERIS_NAME);
        assert!(!cfg.ephemeris.is_explicit());
        assert_eq!(cfg.lat, DEFAULT_LAT);
        assert_eq!(cfg.lon, DEFAULT_LON);
    }

    #[test]
    fn explicit_request_path_wins_over_everything() {
        let overrides = RequestOverrides {
            ephemeris_path: Some("/tmp/custom.bsp".to_string()),
            ephemeris_name: Some("ignored.bsp".to_string()),
            ..Default::default()
        };
        let cfg = Config::resolve(&overrides).unwrap();
        assert_eq!(cfg.ephemeris.display_name(), "custom.bsp");
        assert!(cfg.ephemeris.is_explicit());
    }

    #[test]
    fn explicit_name_without_path_resolves_under_data_dir() {
        let overrides = RequestOverrides {
            ephemeris_name: Some("de440.bsp".to_string()),
            ..Default::default()
        };
        let cfg = Config::resolve(&overrides).unwrap();
        assert_eq!(
            cfg.ephemeris.resolved_path(),
            Path::new(DEFAULT_EPHEMERIS_DIR).join("de440.bsp")
        );
    }

    #[test]
    fn out_of_range_latitude_is_rejected() {
        let overrides = RequestOverrides {
            lat: Some(200.0),
            ..Default::default()
        };
        assert!(matches!(
            Config::resolve(&overrides),
            Err(CoreError::InvalidInput { .. })
        ));
    }
}
