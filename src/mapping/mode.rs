//! Mapping mode and its per-type resolution.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

use super::{lock, Mapped};
use crate::error::{Error, Result};

/// How a type's members are bound to columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MappingMode {
    /// Every member binds to the column with the same name, if one exists.
    #[default]
    Auto,
    /// Only members with an explicit column annotation bind.
    Manual,
}

impl fmt::Display for MappingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingMode::Auto => write!(f, "auto"),
            MappingMode::Manual => write!(f, "manual"),
        }
    }
}

impl FromStr for MappingMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(MappingMode::Auto),
            "manual" => Ok(MappingMode::Manual),
            other => Err(Error::InvalidConfig {
                message: format!("unknown mapping mode '{}' (expected auto or manual)", other),
            }),
        }
    }
}

/// Resolves and caches the mapping mode of each type.
///
/// A type's own `MAPPING_MODE` wins; otherwise the registry default at the
/// time of first resolution is recorded and kept for that type from then on.
#[derive(Debug)]
pub struct MappingModeRegistry {
    state: Mutex<ModeState>,
}

#[derive(Debug)]
struct ModeState {
    default_mode: MappingMode,
    resolved: HashMap<TypeId, MappingMode>,
}

impl MappingModeRegistry {
    /// Create a registry with the given default mode.
    pub fn new(default_mode: MappingMode) -> Self {
        Self {
            state: Mutex::new(ModeState {
                default_mode,
                resolved: HashMap::new(),
            }),
        }
    }

    /// Current default mode.
    pub fn default_mode(&self) -> MappingMode {
        lock(&self.state).default_mode
    }

    /// Change the default mode.
    ///
    /// Types that were already resolved keep their recorded mode.
    pub fn set_default_mode(&self, mode: MappingMode) {
        lock(&self.state).default_mode = mode;
    }

    /// Resolve the mapping mode of `T`, recording it on first use.
    pub fn resolve<T: Mapped>(&self) -> MappingMode {
        let mut state = lock(&self.state);
        let default_mode = state.default_mode;
        *state
            .resolved
            .entry(TypeId::of::<T>())
            .or_insert_with(|| T::MAPPING_MODE.unwrap_or(default_mode))
    }

    /// Whether `T` has already been resolved.
    pub fn is_resolved<T: 'static>(&self) -> bool {
        lock(&self.state).resolved.contains_key(&TypeId::of::<T>())
    }
}

impl Default for MappingModeRegistry {
    fn default() -> Self {
        Self::new(MappingMode::default())
    }
}
