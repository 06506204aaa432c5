//! Row materializer.
//!
//! Decodes result rows into caller-owned records through a column plan: for every
//! destination, in order, the field indexes its slice of the row is scanned into. The
//! single-table and join paths share this code; a single-table plan has one entry.

use crate::error::{OrmError, OrmResult};
use crate::record::{FieldSet, Record};
use crate::row::Row;
use crate::value::Value;

/// Per destination, the field indexes to fill, in select-list order.
pub(crate) type ColumnPlan = Vec<Vec<usize>>;

/// A growable destination sequence for `all`.
///
/// Slots that already exist are overwritten in place; slots past the end are created
/// with `Default`. Once decoding stops, the sequence is cut back to the rows decoded.
pub trait RowSink {
    fn slot(&mut self, pos: usize) -> &mut dyn FieldSet;

    fn truncate(&mut self, len: usize);
}

impl<R: Record> RowSink for Vec<R> {
    fn slot(&mut self, pos: usize) -> &mut dyn FieldSet {
        if pos >= self.len() {
            self.resize_with(pos + 1, R::default);
        }
        &mut self[pos]
    }

    fn truncate(&mut self, len: usize) {
        Vec::truncate(self, len);
    }
}

/// Destination records for a join `one`, one per participating table.
///
/// Implemented for tuples of mutable references: `(&mut user, &mut account)`.
pub trait JoinTargets {
    fn targets(&mut self) -> Vec<&mut dyn FieldSet>;
}

/// Destination sequences for a join `all`, one per participating table.
///
/// Implemented for tuples of mutable vector references: `(&mut users, &mut accounts)`.
pub trait JoinSinks {
    fn sinks(&mut self) -> Vec<&mut dyn RowSink>;
}

macro_rules! impl_join_tuples {
    ($($name:ident $idx:tt),+) => {
        impl<$($name: FieldSet),+> JoinTargets for ($(&mut $name,)+) {
            fn targets(&mut self) -> Vec<&mut dyn FieldSet> {
                vec![$(&mut *self.$idx as &mut dyn FieldSet),+]
            }
        }

        impl<$($name: Record),+> JoinSinks for ($(&mut Vec<$name>,)+) {
            fn sinks(&mut self) -> Vec<&mut dyn RowSink> {
                vec![$(&mut *self.$idx as &mut dyn RowSink),+]
            }
        }
    };
}

impl_join_tuples!(A 0);
impl_join_tuples!(A 0, B 1);
impl_join_tuples!(A 0, B 1, C 2);
impl_join_tuples!(A 0, B 1, C 2, D 3);
impl_join_tuples!(A 0, B 1, C 2, D 3, E 4);
impl_join_tuples!(A 0, B 1, C 2, D 3, E 4, F 5);

fn check_destinations(given: usize, plan: &[Vec<usize>]) -> OrmResult<()> {
    if given != plan.len() {
        return Err(OrmError::shape(format!(
            "expected {} destination records, got {}",
            plan.len(),
            given
        )));
    }
    Ok(())
}

/// Scan one row's values into `targets` following `plan`.
pub(crate) fn bind_row(
    targets: &mut [&mut dyn FieldSet],
    plan: &[Vec<usize>],
    values: Vec<Value>,
) -> OrmResult<()> {
    check_destinations(targets.len(), plan)?;
    let expected: usize = plan.iter().map(Vec::len).sum();
    if values.len() != expected {
        return Err(OrmError::shape(format!(
            "row has {} values but {} columns were selected",
            values.len(),
            expected
        )));
    }

    let mut values = values.into_iter();
    for (target, indexes) in targets.iter_mut().zip(plan) {
        for (&index, value) in indexes.iter().zip(values.by_ref()) {
            target.set_field(index, value)?;
        }
    }
    Ok(())
}

/// Decode every row into `sinks`, growing them in lockstep.
///
/// On failure the sinks keep exactly the rows decoded before the failing one.
pub(crate) fn decode_all(
    sinks: &mut [&mut dyn RowSink],
    plan: &[Vec<usize>],
    rows: Vec<Row>,
) -> OrmResult<()> {
    check_destinations(sinks.len(), plan)?;

    let mut decoded = 0;
    for row in rows {
        let mut targets: Vec<&mut dyn FieldSet> =
            sinks.iter_mut().map(|sink| sink.slot(decoded)).collect();
        let result = bind_row(&mut targets, plan, row.into_values());
        drop(targets);
        if let Err(err) = result {
            for sink in sinks.iter_mut() {
                sink.truncate(decoded);
            }
            return Err(err);
        }
        decoded += 1;
    }

    for sink in sinks.iter_mut() {
        sink.truncate(decoded);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FieldDef;
    use crate::value::FromValue;
    use std::sync::Arc;

    #[derive(Debug, Default, PartialEq)]
    struct Pair {
        id: i64,
        note: String,
        name: String,
    }

    impl FieldSet for Pair {
        fn get_field(&self, index: usize) -> OrmResult<Value> {
            match index {
                0 => Ok(Value::Int(self.id)),
                2 => Ok(Value::Text(self.name.clone())),
                _ => Err(OrmError::shape(format!("no field {index}"))),
            }
        }

        fn set_field(&mut self, index: usize, value: Value) -> OrmResult<()> {
            match index {
                0 => self.id = i64::from_value(value).map_err(|e| OrmError::decode("id", e))?,
                2 => {
                    self.name = String::from_value(value).map_err(|e| OrmError::decode("name", e))?
                }
                _ => return Err(OrmError::shape(format!("no field {index}"))),
            }
            Ok(())
        }
    }

    impl Record for Pair {
        fn fields() -> Vec<FieldDef> {
            vec![
                FieldDef::new(0, "id").db("id").sqlite("INTEGER"),
                FieldDef::new(1, "note"),
                FieldDef::new(2, "name").db("name").sqlite("TEXT"),
            ]
        }
    }

    fn rows(values: Vec<Vec<Value>>) -> Vec<Row> {
        let columns: Arc<[String]> = Arc::from(vec!["id".to_string(), "name".to_string()]);
        values
            .into_iter()
            .map(|v| Row::new(columns.clone(), v))
            .collect()
    }

    #[test]
    fn bind_row_splits_values_by_plan() {
        let mut a = Pair::default();
        let mut b = Pair::default();
        let plan = vec![vec![2], vec![0, 2]];
        let mut targets = (&mut a, &mut b);
        bind_row(
            &mut targets.targets(),
            &plan,
            vec![Value::Text("left".into()), Value::Int(9), Value::Text("right".into())],
        )
        .unwrap();
        assert_eq!(a.name, "left");
        assert_eq!(a.id, 0);
        assert_eq!((b.id, b.name.as_str()), (9, "right"));
    }

    #[test]
    fn bind_row_rejects_wrong_destination_count() {
        let mut a = Pair::default();
        let err = bind_row(&mut (&mut a,).targets(), &[vec![0], vec![2]], vec![]).unwrap_err();
        assert!(err.is_shape());
    }

    #[test]
    fn decode_all_reuses_and_grows() {
        let mut out = vec![Pair {
            id: 1,
            note: "kept".into(),
            name: "old".into(),
        }];
        let plan = vec![vec![0, 2]];
        let data = rows(vec![
            vec![Value::Int(10), Value::Text("a".into())],
            vec![Value::Int(11), Value::Text("b".into())],
        ]);
        decode_all(&mut [&mut out as &mut dyn RowSink], &plan, data).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].note, "kept");
        assert_eq!((out[0].id, out[1].id), (10, 11));
    }

    #[test]
    fn decode_all_truncates_to_decoded_rows() {
        let mut out: Vec<Pair> = (0..5).map(|_| Pair::default()).collect();
        let plan = vec![vec![0, 2]];
        let data = rows(vec![vec![Value::Int(1), Value::Text("a".into())]]);
        decode_all(&mut [&mut out as &mut dyn RowSink], &plan, data).unwrap();
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn decode_all_failure_keeps_prior_rows() {
        let mut left: Vec<Pair> = Vec::new();
        let mut right: Vec<Pair> = Vec::new();
        let plan = vec![vec![0], vec![2]];
        let data = rows(vec![
            vec![Value::Int(1), Value::Text("a".into())],
            vec![Value::Text("oops".into()), Value::Text("b".into())],
            vec![Value::Int(3), Value::Text("c".into())],
        ]);
        let mut sinks = (&mut left, &mut right);
        let err = decode_all(&mut sinks.sinks(), &plan, data).unwrap_err();
        assert!(matches!(err, OrmError::Decode { ref column, .. } if column == "id"));
        assert_eq!(left.len(), 1);
        assert_eq!(right.len(), 1);
        assert_eq!(right[0].name, "a");
    }
}
