//! Projection of cursor rows into scalars, arrays, maps, and records.

use std::fmt;

use serde::Serialize;

use crate::coerce::{ScalarType, ScalarValue, coerce};
use crate::driver::Cursor;
use crate::error::SqlPagerError;
use crate::lob;
use crate::record::{FromRecord, RecordBinding};
use crate::results::{CaseInsensitiveRow, KeyCase};
use crate::types::RowValues;

/// A requested result type: either one of the primitive-like scalars or a bound record.
pub enum Target<T: 'static> {
    Scalar(ScalarType),
    Record(&'static RecordBinding<T>),
}

/// The shape a query result is projected into. Decided once per call.
///
/// Non-list shapes use only the first row; `ListOf` repeats the inner shape for every row.
pub enum RowShape<T: 'static = ()> {
    /// First column of the row, coerced to the given type.
    Scalar(ScalarType),
    /// Every column value, in select-list order.
    Array,
    /// Column name to value, case-insensitive.
    Map,
    /// Columns bound into record fields by name.
    Record(&'static RecordBinding<T>),
    /// The inner shape applied to every row.
    ListOf(Box<RowShape<T>>),
}

impl<T> Clone for RowShape<T> {
    fn clone(&self) -> Self {
        match self {
            RowShape::Scalar(ty) => RowShape::Scalar(*ty),
            RowShape::Array => RowShape::Array,
            RowShape::Map => RowShape::Map,
            RowShape::Record(binding) => RowShape::Record(*binding),
            RowShape::ListOf(inner) => RowShape::ListOf(inner.clone()),
        }
    }
}

impl<T> fmt::Debug for RowShape<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowShape::Scalar(ty) => write!(f, "Scalar({ty})"),
            RowShape::Array => f.write_str("Array"),
            RowShape::Map => f.write_str("Map"),
            RowShape::Record(binding) => write!(f, "Record({})", binding.type_name()),
            RowShape::ListOf(inner) => write!(f, "ListOf({inner:?})"),
        }
    }
}

impl<T> RowShape<T> {
    #[must_use]
    pub fn scalar(ty: ScalarType) -> Self {
        RowShape::Scalar(ty)
    }

    #[must_use]
    pub fn array() -> Self {
        RowShape::Array
    }

    #[must_use]
    pub fn map() -> Self {
        RowShape::Map
    }

    /// Shape for a requested type; primitive-like types project as scalars.
    #[must_use]
    pub fn of(target: Target<T>) -> Self {
        match target {
            Target::Scalar(ty) => RowShape::Scalar(ty),
            Target::Record(binding) => RowShape::Record(binding),
        }
    }

    /// Repeat this shape for every row. Already-list shapes are returned as is.
    #[must_use]
    pub fn list(self) -> Self {
        match self {
            RowShape::ListOf(_) => self,
            single => RowShape::ListOf(Box::new(single)),
        }
    }

    #[must_use]
    pub fn is_list(&self) -> bool {
        matches!(self, RowShape::ListOf(_))
    }

    /// The result a handler gives when the cursor has no rows.
    #[must_use]
    pub fn empty_result(&self) -> Projected<T> {
        if self.is_list() {
            Projected::List(Vec::new())
        } else {
            Projected::Absent
        }
    }
}

impl<T: FromRecord> RowShape<T> {
    #[must_use]
    pub fn record() -> Self {
        RowShape::Record(T::binding())
    }
}

/// A projected query result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Projected<T = ()> {
    /// A single-row shape over an empty cursor.
    Absent,
    Scalar(ScalarValue),
    Array(Vec<RowValues>),
    Map(CaseInsensitiveRow),
    Record(T),
    List(Vec<Projected<T>>),
}

impl<T> Projected<T> {
    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Projected::Absent)
    }

    /// Items of a list result; a single value becomes a one-element list.
    #[must_use]
    pub fn into_list(self) -> Vec<Projected<T>> {
        match self {
            Projected::List(items) => items,
            Projected::Absent => Vec::new(),
            single => vec![single],
        }
    }

    #[must_use]
    pub fn into_scalar(self) -> Option<ScalarValue> {
        match self {
            Projected::Scalar(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_record(self) -> Option<T> {
        match self {
            Projected::Record(r) => Some(r),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_map(self) -> Option<CaseInsensitiveRow> {
        match self {
            Projected::Map(m) => Some(m),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_array(self) -> Option<Vec<RowValues>> {
        match self {
            Projected::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Records of a list result, skipping anything that is not a record.
    #[must_use]
    pub fn into_records(self) -> Vec<T> {
        self.into_list()
            .into_iter()
            .filter_map(Projected::into_record)
            .collect()
    }
}

/// Turns cursor rows into [`Projected`] values.
#[derive(Debug, Clone, Copy, Default)]
pub struct RowProjector {
    key_case: KeyCase,
}

impl RowProjector {
    #[must_use]
    pub fn new(key_case: KeyCase) -> Self {
        Self { key_case }
    }

    #[must_use]
    pub fn key_case(&self) -> KeyCase {
        self.key_case
    }

    /// Project the rows remaining in `cursor` into `shape`.
    ///
    /// # Errors
    /// Returns cursor failures, `CoercionError` for unparsable scalars, and
    /// `BindingError` when a record field rejects a value.
    pub fn project<T: Default>(
        &self,
        cursor: &mut dyn Cursor,
        shape: &RowShape<T>,
    ) -> Result<Projected<T>, SqlPagerError> {
        match shape {
            RowShape::ListOf(inner) => {
                let mut items = Vec::new();
                while cursor.next()? {
                    items.push(self.project_row(cursor, inner)?);
                }
                Ok(Projected::List(items))
            }
            single => {
                if cursor.next()? {
                    self.project_row(cursor, single)
                } else {
                    Ok(Projected::Absent)
                }
            }
        }
    }

    /// Project the cursor's current row.
    ///
    /// # Errors
    /// See [`RowProjector::project`].
    pub fn project_row<T: Default>(
        &self,
        cursor: &dyn Cursor,
        shape: &RowShape<T>,
    ) -> Result<Projected<T>, SqlPagerError> {
        match shape {
            RowShape::Scalar(ty) => Ok(Projected::Scalar(coerce(cursor.get(0)?, *ty)?)),
            RowShape::Array => {
                let width = cursor.column_names().len();
                let mut values = Vec::with_capacity(width);
                for idx in 0..width {
                    values.push(lob::normalize(cursor.get(idx)?));
                }
                Ok(Projected::Array(values))
            }
            RowShape::Map => {
                let names = cursor.column_names();
                let mut row = CaseInsensitiveRow::with_capacity(names.len());
                for (idx, name) in names.iter().enumerate() {
                    row.insert(self.key_case.apply(name), lob::normalize(cursor.get(idx)?));
                }
                Ok(Projected::Map(row))
            }
            RowShape::Record(binding) => {
                let names = cursor.column_names();
                let mut record = T::default();
                for (idx, name) in names.iter().enumerate() {
                    if let Some(target) = binding.target_for(name) {
                        let value = coerce(cursor.get(idx)?, target)?;
                        binding.assign(&mut record, name, value)?;
                    }
                }
                Ok(Projected::Record(record))
            }
            RowShape::ListOf(inner) => self.project_row(cursor, inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::BufferedCursor;
    use std::sync::Arc;

    #[derive(Debug, Default, PartialEq)]
    struct Person {
        id: i32,
        name: String,
    }

    crate::record_binding!(Person { id: Integer, name: Text });

    fn people() -> BufferedCursor {
        BufferedCursor::new(
            Arc::new(vec!["ID".to_string(), "Name".to_string(), "extra".to_string()]),
            vec![
                vec![RowValues::Text(" 1 ".into()), "ann".into(), RowValues::Null],
                vec![RowValues::Int(2), "bo".into(), RowValues::Int(9)],
            ],
        )
    }

    #[test]
    fn scalar_takes_first_column_of_first_row() {
        let out = RowProjector::default()
            .project(&mut people(), &RowShape::<()>::scalar(ScalarType::Long))
            .unwrap();
        assert_eq!(out, Projected::Scalar(ScalarValue::Long(1)));
    }

    #[test]
    fn list_of_scalars_collects_every_row() {
        let shape = RowShape::<()>::scalar(ScalarType::Integer).list();
        let out = RowProjector::default().project(&mut people(), &shape).unwrap();
        assert_eq!(
            out.into_list(),
            vec![
                Projected::Scalar(ScalarValue::Integer(1)),
                Projected::Scalar(ScalarValue::Integer(2))
            ]
        );
    }

    #[test]
    fn map_rows_apply_key_case() {
        let out = RowProjector::new(KeyCase::Lower)
            .project(&mut people(), &RowShape::<()>::map())
            .unwrap()
            .into_map()
            .unwrap();
        assert_eq!(out.keys().collect::<Vec<_>>(), vec!["id", "name", "extra"]);
        assert_eq!(out.get("NAME"), Some(&RowValues::Text("ann".into())));
    }

    #[test]
    fn records_bind_by_column_name() {
        let shape = RowShape::<Person>::record().list();
        let people = RowProjector::default()
            .project(&mut people(), &shape)
            .unwrap()
            .into_records();
        assert_eq!(
            people,
            vec![
                Person { id: 1, name: "ann".into() },
                Person { id: 2, name: "bo".into() }
            ]
        );
    }

    #[test]
    fn primitive_record_target_projects_as_scalar() {
        let shape = RowShape::<()>::of(Target::Scalar(ScalarType::Text));
        assert!(matches!(shape, RowShape::Scalar(ScalarType::Text)));
    }

    #[test]
    fn empty_cursor_gives_absent_or_empty_list() {
        let mut empty = BufferedCursor::new(Arc::new(vec!["id".into()]), Vec::new());
        let single = RowProjector::default()
            .project(&mut empty, &RowShape::<()>::array())
            .unwrap();
        assert!(single.is_absent());
        let shape = RowShape::<()>::array().list();
        assert_eq!(shape.empty_result(), Projected::List(Vec::new()));
    }

    #[test]
    fn list_is_idempotent() {
        let shape = RowShape::<()>::map().list().list();
        assert_eq!(format!("{shape:?}"), "ListOf(Map)");
    }
}
