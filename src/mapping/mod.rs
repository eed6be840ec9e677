//! Type-to-column mapping: modes, member descriptors and the metadata cache.

mod member;
mod metadata;
mod mode;
mod registry;
mod resolver;

pub use member::MemberDescriptor;
pub use metadata::{Binding, TypeMetadata};
pub use mode::{MappingMode, MappingModeRegistry};
pub use registry::{CacheStats, Mapper, MapperConfig, DEFAULT_MODE_ENV};
pub use resolver::{resolve_column, ColumnAnnotation, Resolution};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// A type whose instances can be read from and written to cursor rows.
///
/// Implementations list their members once; the resulting
/// [`TypeMetadata`] is cached per type by a [`Mapper`].
///
/// ```
/// use rowbind::{Mapped, MappingMode, MemberDescriptor};
///
/// #[derive(Default)]
/// struct Country {
///     name: String,
///     area: f64,
/// }
///
/// impl Mapped for Country {
///     const MAPPING_MODE: Option<MappingMode> = Some(MappingMode::Manual);
///
///     fn members() -> Vec<MemberDescriptor<Self>> {
///         vec![
///             MemberDescriptor::field("name", |c: &Self| &c.name, |c: &mut Self| &mut c.name)
///                 .column("NAME"),
///             MemberDescriptor::field("area", |c: &Self| &c.area, |c: &mut Self| &mut c.area),
///         ]
///     }
/// }
/// ```
pub trait Mapped: Sized + 'static {
    /// Type-level mode override. `None` uses the mapper's default.
    const MAPPING_MODE: Option<MappingMode> = None;

    /// Declared members, in mapping order.
    fn members() -> Vec<MemberDescriptor<Self>>;
}

/// Lock a mutex, recovering the data if a previous holder panicked.
///
/// Guarded state here is only ever replaced wholesale, so a poisoned lock
/// still holds a consistent value.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
