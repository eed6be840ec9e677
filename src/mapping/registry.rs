//! Process-wide metadata cache.
//!
//! A `Mapper` owns the mapping-mode registry and one cache slot per mapped
//! type. Each slot has its own lock, so the first build of a type runs once
//! while concurrent callers for the same type wait on it; other types are
//! not blocked. A failed build leaves the slot empty and is retried on the
//! next request.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use tracing::debug;

use super::metadata::TypeMetadata;
use super::mode::{MappingMode, MappingModeRegistry};
use super::{lock, Mapped};
use crate::accessor::RowAccessor;
use crate::cursor::Cursor;
use crate::enumerator::{ByValue, InPlace, RowEnumerator};
use crate::error::{Error, Result};

/// Environment variable read by [`MapperConfig::from_env`].
pub const DEFAULT_MODE_ENV: &str = "ROWBIND_DEFAULT_MAPPING_MODE";

/// Mapper configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MapperConfig {
    /// Mode for types that do not declare one (default: `Auto`).
    pub default_mode: MappingMode,
}

impl MapperConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default mapping mode.
    ///
    /// # Example
    ///
    /// ```
    /// use rowbind::{MapperConfig, MappingMode};
    ///
    /// let config = MapperConfig::new().with_default_mode(MappingMode::Manual);
    /// assert_eq!(config.default_mode, MappingMode::Manual);
    /// ```
    pub fn with_default_mode(mut self, mode: MappingMode) -> Self {
        self.default_mode = mode;
        self
    }

    /// Read the configuration from the environment.
    ///
    /// An unset or empty `ROWBIND_DEFAULT_MAPPING_MODE` keeps the default.
    pub fn from_env() -> Result<Self> {
        Self::from_env_value(std::env::var(DEFAULT_MODE_ENV).ok().as_deref())
    }

    fn from_env_value(value: Option<&str>) -> Result<Self> {
        match value.map(str::trim) {
            None | Some("") => Ok(Self::default()),
            Some(mode) => Ok(Self::default().with_default_mode(mode.parse()?)),
        }
    }
}

/// Cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups served from the cache.
    pub hits: usize,
    /// Lookups that had to build.
    pub misses: usize,
    /// Successful builds.
    pub builds: usize,
}

type Slot<T> = Mutex<Option<Arc<TypeMetadata<T>>>>;

/// Owner of the per-type metadata cache.
pub struct Mapper {
    modes: MappingModeRegistry,
    slots: Mutex<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
    builds: AtomicUsize,
}

static GLOBAL: OnceLock<Mapper> = OnceLock::new();

impl Mapper {
    /// Create a mapper with its own cache.
    pub fn new(config: MapperConfig) -> Self {
        Self {
            modes: MappingModeRegistry::new(config.default_mode),
            slots: Mutex::new(HashMap::new()),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
            builds: AtomicUsize::new(0),
        }
    }

    /// The process-wide mapper, created with the default configuration on
    /// first use unless [`Mapper::init_global`] ran before.
    pub fn global() -> &'static Mapper {
        GLOBAL.get_or_init(|| Mapper::new(MapperConfig::default()))
    }

    /// Create the process-wide mapper from `config`.
    ///
    /// Fails with [`Error::AlreadyInitialized`] once the global mapper exists.
    pub fn init_global(config: MapperConfig) -> Result<&'static Mapper> {
        let mut installed = false;
        let mapper = GLOBAL.get_or_init(|| {
            installed = true;
            Mapper::new(config)
        });
        if installed {
            Ok(mapper)
        } else {
            Err(Error::AlreadyInitialized)
        }
    }

    /// Mapping-mode registry used by this mapper.
    pub fn modes(&self) -> &MappingModeRegistry {
        &self.modes
    }

    /// Cached metadata of `T`, building it against `cursor` on first use.
    pub fn metadata<T: Mapped, C: Cursor + ?Sized>(
        &self,
        cursor: &C,
    ) -> Result<Arc<TypeMetadata<T>>> {
        let slot = self.slot::<T>();
        let mut cached = lock(&slot);
        if let Some(metadata) = cached.as_ref() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Arc::clone(metadata));
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let mode = self.modes.resolve::<T>();
        let metadata = Arc::new(TypeMetadata::<T>::build(mode, cursor.columns())?);
        self.builds.fetch_add(1, Ordering::Relaxed);
        debug!(
            type_name = metadata.owner_type(),
            %mode,
            bound = metadata.len(),
            "Built type metadata"
        );

        *cached = Some(Arc::clone(&metadata));
        Ok(metadata)
    }

    /// Whether metadata for `T` has been built.
    pub fn is_cached<T: Mapped>(&self) -> bool {
        let slot = self.slot::<T>();
        let cached = lock(&slot).is_some();
        cached
    }

    /// Snapshot of the cache counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            builds: self.builds.load(Ordering::Relaxed),
        }
    }

    /// Row accessor for `T`.
    pub fn accessor<T: Mapped, C: Cursor + ?Sized>(&self, cursor: &C) -> Result<RowAccessor<T>> {
        Ok(RowAccessor::new(self.metadata::<T, C>(cursor)?))
    }

    /// Read the current row into a new `T`.
    pub fn read<T: Mapped + Default, C: Cursor + ?Sized>(&self, cursor: &C) -> Result<T> {
        self.accessor::<T, C>(cursor)?.read(cursor)
    }

    /// Read the current row into `instance`.
    pub fn read_into<T: Mapped, C: Cursor + ?Sized>(
        &self,
        cursor: &C,
        instance: &mut T,
    ) -> Result<()> {
        self.accessor::<T, C>(cursor)?.read_into(cursor, instance)
    }

    /// Write `instance` into the current row. The row must be in edit mode.
    pub fn write_from<T: Mapped, C: Cursor + ?Sized>(
        &self,
        cursor: &mut C,
        instance: &T,
    ) -> Result<()> {
        self.accessor::<T, C>(cursor)?.write_from(cursor, instance)
    }

    /// Enumerate every row of `cursor` as a fresh `T`.
    pub fn rows<'c, T: Mapped + Default, C: Cursor + ?Sized>(
        &self,
        cursor: &'c mut C,
    ) -> Result<RowEnumerator<'c, C, T, ByValue>> {
        let accessor = self.accessor::<T, C>(cursor)?;
        Ok(RowEnumerator::new(cursor, accessor, ByValue))
    }

    /// Enumerate every row of `cursor` into the same `instance`.
    ///
    /// Each step overwrites `instance`; see [`InPlace`].
    pub fn rows_into<'c, 'i, T: Mapped, C: Cursor + ?Sized>(
        &self,
        cursor: &'c mut C,
        instance: &'i mut T,
    ) -> Result<RowEnumerator<'c, C, T, InPlace<'i, T>>> {
        let accessor = self.accessor::<T, C>(cursor)?;
        Ok(RowEnumerator::new(cursor, accessor, InPlace::new(instance)))
    }

    fn slot<T: Mapped>(&self) -> Arc<Slot<T>> {
        let mut slots = lock(&self.slots);
        let slot = slots
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Arc::new(Slot::<T>::new(None)) as Arc<dyn Any + Send + Sync>);
        Arc::clone(slot)
            .downcast::<Slot<T>>()
            .expect("metadata slots are keyed by TypeId")
    }
}

impl Default for Mapper {
    fn default() -> Self {
        Self::new(MapperConfig::default())
    }
}

impl std::fmt::Debug for Mapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mapper")
            .field("modes", &self.modes)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}
