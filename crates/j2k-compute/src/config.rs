//! Compute configuration and environment overrides.
//!
//! # Environment Variables
//!
//! - `J2K_BACKEND` - `cpu`, `gpu` or `auto`
//! - `J2K_GPU_THRESHOLD` - minimum samples before `auto` picks the GPU
//! - `J2K_DWT_LEVELS` - default decomposition depth
//! - `J2K_TILE_SIZE` - square tile size for the tiled dispatcher
//! - `J2K_TILE_OVERLAP` - tile overlap in samples
//! - `J2K_GPU_MEMORY_MB` - GPU memory budget (read by the wgpu provider)
//!
//! Values that fail to parse are ignored with a warning.

use std::env;
use std::str::FromStr;

use tracing::warn;

use crate::backend::Backend;

/// Default GPU workload threshold in samples.
pub const DEFAULT_GPU_THRESHOLD: usize = 65_536;
/// Default decomposition depth.
pub const DEFAULT_LEVELS: u32 = 5;
/// Default tile size.
pub const DEFAULT_TILE_SIZE: usize = 256;

/// Settings shared by every operation of a processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputeConfig {
    /// Requested backend.
    pub backend: Backend,
    /// Workload size at which `Auto` switches to the GPU.
    pub gpu_threshold: usize,
    /// Levels used when a multi-level call passes `None`.
    pub default_levels: u32,
    /// Tile width for the tiled dispatcher.
    pub tile_width: usize,
    /// Tile height for the tiled dispatcher.
    pub tile_height: usize,
    /// Overlap between neighbouring tiles.
    pub tile_overlap: usize,
}

impl Default for ComputeConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Auto,
            gpu_threshold: DEFAULT_GPU_THRESHOLD,
            default_levels: DEFAULT_LEVELS,
            tile_width: DEFAULT_TILE_SIZE,
            tile_height: DEFAULT_TILE_SIZE,
            tile_overlap: 0,
        }
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparseable environment override");
            None
        }
    }
}

impl ComputeConfig {
    /// Defaults with the process environment applied.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Defaults with overrides from `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(backend) = parse_var(&lookup, "J2K_BACKEND") {
            config.backend = backend;
        }
        if let Some(threshold) = parse_var(&lookup, "J2K_GPU_THRESHOLD") {
            config.gpu_threshold = threshold;
        }
        if let Some(levels) = parse_var(&lookup, "J2K_DWT_LEVELS") {
            config.default_levels = levels;
        }
        if let Some(size) = parse_var::<usize>(&lookup, "J2K_TILE_SIZE") {
            if size > 0 {
                config.tile_width = size;
                config.tile_height = size;
            } else {
                warn!("ignoring J2K_TILE_SIZE=0");
            }
        }
        if let Some(overlap) = parse_var(&lookup, "J2K_TILE_OVERLAP") {
            config.tile_overlap = overlap;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let c = ComputeConfig::default();
        assert_eq!(c.backend, Backend::Auto);
        assert_eq!(c.gpu_threshold, 65_536);
        assert_eq!(c.default_levels, 5);
        assert_eq!((c.tile_width, c.tile_height, c.tile_overlap), (256, 256, 0));
        assert_eq!(ComputeConfig::from_lookup(|_| None), c);
    }

    #[test]
    fn test_overrides() {
        let c = ComputeConfig::from_lookup(lookup(&[
            ("J2K_BACKEND", "cpu"),
            ("J2K_GPU_THRESHOLD", "1024"),
            ("J2K_DWT_LEVELS", "3"),
            ("J2K_TILE_SIZE", "128"),
            ("J2K_TILE_OVERLAP", "8"),
        ]));
        assert_eq!(c.backend, Backend::Cpu);
        assert_eq!(c.gpu_threshold, 1024);
        assert_eq!(c.default_levels, 3);
        assert_eq!((c.tile_width, c.tile_height, c.tile_overlap), (128, 128, 8));
    }

    #[test]
    fn test_bad_values_ignored() {
        let c = ComputeConfig::from_lookup(lookup(&[
            ("J2K_BACKEND", "quantum"),
            ("J2K_DWT_LEVELS", "-1"),
            ("J2K_TILE_SIZE", "0"),
        ]));
        assert_eq!(c, ComputeConfig::default());
    }
}
