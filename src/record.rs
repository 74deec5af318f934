//! Static column-to-field binding tables for structured records.
//!
//! A record type declares once which fields it has, what scalar type each field wants,
//! and how to assign it. The table is built lazily, kept for the life of the process,
//! and matched against result columns case-insensitively.

use std::collections::HashMap;
use std::fmt;

use crate::coerce::{ScalarType, ScalarValue};
use crate::error::SqlPagerError;

/// Assigns one coerced column value to a field.
pub type FieldSetter<T> = fn(&mut T, ScalarValue) -> Result<(), SqlPagerError>;

struct FieldBinding<T> {
    name: &'static str,
    target: ScalarType,
    setter: FieldSetter<T>,
}

/// Field table for record type `T`.
pub struct RecordBinding<T> {
    type_name: &'static str,
    fields: Vec<FieldBinding<T>>,
    by_folded_name: HashMap<String, usize>,
}

impl<T> fmt::Debug for RecordBinding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordBinding")
            .field("type_name", &self.type_name)
            .field("fields", &self.fields.iter().map(|b| b.name).collect::<Vec<_>>())
            .finish()
    }
}

impl<T> RecordBinding<T> {
    #[must_use]
    pub fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            fields: Vec::new(),
            by_folded_name: HashMap::new(),
        }
    }

    /// Declare a field. A later declaration with the same folded name wins.
    #[must_use]
    pub fn field(mut self, name: &'static str, target: ScalarType, setter: FieldSetter<T>) -> Self {
        let folded = name.to_lowercase();
        let binding = FieldBinding {
            name,
            target,
            setter,
        };
        if let Some(&idx) = self.by_folded_name.get(&folded) {
            self.fields[idx] = binding;
        } else {
            self.by_folded_name.insert(folded, self.fields.len());
            self.fields.push(binding);
        }
        self
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Target type of the field a column name maps to, if any.
    #[must_use]
    pub fn target_for(&self, column: &str) -> Option<ScalarType> {
        self.lookup(column).map(|b| b.target)
    }

    /// Assign `value` to the field matching `column`. Unknown columns are ignored and NULLs
    /// leave the field untouched.
    ///
    /// # Errors
    /// Returns `SqlPagerError::BindingError` when the setter rejects the value.
    pub fn assign(&self, record: &mut T, column: &str, value: ScalarValue) -> Result<(), SqlPagerError> {
        let Some(binding) = self.lookup(column) else {
            return Ok(());
        };
        if value.is_null() {
            return Ok(());
        }
        (binding.setter)(record, value).map_err(|err| {
            SqlPagerError::BindingError(format!(
                "{}.{} from column {column}: {err}",
                self.type_name, binding.name
            ))
        })
    }

    fn lookup(&self, column: &str) -> Option<&FieldBinding<T>> {
        self.by_folded_name
            .get(&column.to_lowercase())
            .map(|&idx| &self.fields[idx])
    }
}

/// A structured record that rows can be bound into.
pub trait FromRecord: Default + Sized + 'static {
    /// The shared binding table for this type.
    fn binding() -> &'static RecordBinding<Self>;
}

/// Implement [`FromRecord`] for a struct with a `Default` impl.
///
/// Each field is listed with the scalar type its column is coerced to; the field's Rust
/// type must implement [`crate::coerce::FromScalar`].
///
/// ```rust
/// use sql_pager::prelude::*;
/// use sql_pager::record_binding;
///
/// #[derive(Debug, Default)]
/// struct User {
///     id: i64,
///     name: String,
///     active: Option<bool>,
/// }
///
/// record_binding!(User { id: Long, name: Text, active: Boolean });
///
/// assert_eq!(User::binding().len(), 3);
/// ```
#[macro_export]
macro_rules! record_binding {
    ($ty:ident { $($field:ident : $target:ident),* $(,)? }) => {
        impl $crate::record::FromRecord for $ty {
            fn binding() -> &'static $crate::record::RecordBinding<Self> {
                static BINDING: ::std::sync::OnceLock<$crate::record::RecordBinding<$ty>> =
                    ::std::sync::OnceLock::new();
                BINDING.get_or_init(|| {
                    $crate::record::RecordBinding::new(stringify!($ty))
                        $(
                            .field(
                                stringify!($field),
                                $crate::coerce::ScalarType::$target,
                                |record: &mut $ty, value| {
                                    record.$field = $crate::coerce::FromScalar::from_scalar(value)?;
                                    Ok(())
                                },
                            )
                        )*
                })
            }
        }
    };
}
