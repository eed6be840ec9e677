//! Property tests for mapping and enumeration.

use proptest::prelude::*;
use rowbind::{
    Column, ColumnInfo, Cursor, DataType, Error, Mapped, Mapper, MappingMode, MemberDescriptor,
    MemoryCursor, TypeMetadata, Value,
};

#[derive(Debug, Default, Clone, PartialEq)]
struct Reading {
    id: i64,
    label: Option<String>,
    score: f64,
    active: bool,
}

const MEMBERS: [&str; 4] = ["Id", "Label", "Score", "Active"];

fn reading_members() -> Vec<MemberDescriptor<Reading>> {
    vec![
        MemberDescriptor::field("Id", |r: &Reading| &r.id, |r: &mut Reading| &mut r.id),
        MemberDescriptor::field("Label", |r: &Reading| &r.label, |r: &mut Reading| &mut r.label),
        MemberDescriptor::field("Score", |r: &Reading| &r.score, |r: &mut Reading| &mut r.score),
        MemberDescriptor::field(
            "Active",
            |r: &Reading| &r.active,
            |r: &mut Reading| &mut r.active,
        ),
    ]
}

impl Mapped for Reading {
    fn members() -> Vec<MemberDescriptor<Self>> {
        reading_members()
    }
}

fn reading_columns() -> Vec<Column> {
    vec![
        Column::new("ID", DataType::Integer).not_null(),
        Column::new("LABEL", DataType::Text),
        Column::new("SCORE", DataType::Float).not_null(),
        Column::new("ACTIVE", DataType::Boolean).not_null(),
    ]
}

fn all_columns() -> Vec<(&'static str, DataType)> {
    vec![
        ("id", DataType::Integer),
        ("LABEL", DataType::Text),
        ("Score", DataType::Float),
        ("aCTIVE", DataType::Boolean),
    ]
}

fn arb_row() -> impl Strategy<Value = Vec<Value>> {
    (
        any::<i64>(),
        proptest::option::of("[a-zA-Z0-9 ]{0,12}"),
        -1.0e9f64..1.0e9f64,
        any::<bool>(),
    )
        .prop_map(|(id, label, score, active)| {
            vec![
                Value::Integer(id),
                label.map(Value::Text).unwrap_or(Value::Null),
                Value::Float(score),
                Value::Boolean(active),
            ]
        })
}

// Members whose type differs from their column's type.
#[derive(Debug, Default)]
struct Converted {
    wide: f64,
    narrow: i16,
    ratio: f32,
}

impl Mapped for Converted {
    fn members() -> Vec<MemberDescriptor<Self>> {
        vec![
            MemberDescriptor::field("Wide", |c: &Self| &c.wide, |c: &mut Self| &mut c.wide),
            MemberDescriptor::field("Narrow", |c: &Self| &c.narrow, |c: &mut Self| &mut c.narrow),
            MemberDescriptor::field("Ratio", |c: &Self| &c.ratio, |c: &mut Self| &mut c.ratio),
        ]
    }
}

fn arb_float() -> impl Strategy<Value = f64> {
    prop_oneof![
        any::<f32>()
            .prop_filter("finite", |f| f.is_finite())
            .prop_map(f64::from),
        any::<f64>().prop_filter("finite", |f| f.is_finite()),
    ]
}

fn arb_converted_row() -> impl Strategy<Value = Vec<Value>> {
    (
        prop_oneof![any::<i64>(), -(1i64 << 53)..=(1i64 << 53)],
        prop_oneof![any::<i64>(), i64::from(i16::MIN)..=i64::from(i16::MAX)],
        arb_float(),
    )
        .prop_map(|(wide, narrow, ratio)| {
            vec![Value::Integer(wide), Value::Integer(narrow), Value::Float(ratio)]
        })
}

fn cursor_with(rows: Vec<Vec<Value>>) -> MemoryCursor {
    MemoryCursor::with_rows(reading_columns(), rows).unwrap()
}

proptest! {
    #[test]
    fn read_then_write_is_identity(row in arb_row()) {
        let mapper = Mapper::default();
        let mut cursor = cursor_with(vec![row.clone()]);

        let reading: Reading = mapper.read(&cursor).unwrap();
        cursor.begin_edit().unwrap();
        mapper.write_from(&mut cursor, &reading).unwrap();
        cursor.commit_edit().unwrap();

        prop_assert_eq!(cursor.current_row().unwrap().values(), row.as_slice());
    }

    #[test]
    fn converting_reads_fail_or_round_trip(row in arb_converted_row()) {
        let mapper = Mapper::default();
        let mut cursor = MemoryCursor::with_rows(
            vec![
                Column::new("WIDE", DataType::Integer).not_null(),
                Column::new("NARROW", DataType::Integer).not_null(),
                Column::new("RATIO", DataType::Float).not_null(),
            ],
            vec![row.clone()],
        )
        .unwrap();

        match mapper.read::<Converted, _>(&cursor) {
            Ok(converted) => {
                cursor.begin_edit().unwrap();
                mapper.write_from(&mut cursor, &converted).unwrap();
                cursor.commit_edit().unwrap();
                prop_assert_eq!(cursor.current_row().unwrap().values(), row.as_slice());
            }
            Err(err) => prop_assert!(err.is_type_mismatch(), "unexpected error: {}", err),
        }
    }

    #[test]
    fn enumeration_yields_every_row_in_order(rows in prop::collection::vec(arb_row(), 0..12)) {
        let mapper = Mapper::default();
        let mut cursor = cursor_with(rows.clone());

        let readings = mapper
            .rows::<Reading, _>(&mut cursor)
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        prop_assert_eq!(readings.len(), rows.len());
        for (reading, row) in readings.iter().zip(&rows) {
            prop_assert_eq!(&Value::Integer(reading.id), &row[0]);
            prop_assert_eq!(&Value::Float(reading.score), &row[2]);
        }
        prop_assert_eq!(cursor.open_traversals(), 0);
    }

    #[test]
    fn in_place_enumeration_ends_on_last_row(rows in prop::collection::vec(arb_row(), 1..12)) {
        let mapper = Mapper::default();
        let mut cursor = cursor_with(rows.clone());
        let mut reading = Reading::default();

        let mut seen = 0;
        let mut enumerator = mapper.rows_into(&mut cursor, &mut reading).unwrap();
        while let Some(current) = enumerator.next_row() {
            current.unwrap();
            seen += 1;
        }
        drop(enumerator);

        prop_assert_eq!(seen, rows.len());
        prop_assert_eq!(&Value::Integer(reading.id), &rows[rows.len() - 1][0]);
    }

    #[test]
    fn auto_binds_exactly_the_matching_columns(present in prop::collection::vec(any::<bool>(), 4)) {
        let columns: ColumnInfo = all_columns()
            .into_iter()
            .zip(&present)
            .filter(|(_, keep)| **keep)
            .map(|((name, data_type), _)| Column::new(name, data_type))
            .collect();

        let metadata = TypeMetadata::<Reading>::build(MappingMode::Auto, &columns).unwrap();

        prop_assert_eq!(metadata.len(), present.iter().filter(|p| **p).count());
        for (member, keep) in MEMBERS.iter().zip(&present) {
            let bound = metadata.column_for(member);
            prop_assert_eq!(bound.is_some(), *keep);
            if let Some(column) = bound {
                prop_assert!(column.eq_ignore_ascii_case(member));
            }
        }
    }

    #[test]
    fn manual_binds_only_annotated_members(annotated in prop::collection::vec(any::<bool>(), 4)) {
        let columns = ColumnInfo::new(reading_columns());
        let members = reading_members()
            .into_iter()
            .zip(&annotated)
            .map(|(member, explicit)| {
                if *explicit {
                    let column = member.name().to_uppercase();
                    member.column(column)
                } else {
                    member
                }
            })
            .collect();

        let result = TypeMetadata::from_members(MappingMode::Manual, members, &columns);

        if annotated.iter().any(|a| *a) {
            let metadata = result.unwrap();
            for (member, explicit) in MEMBERS.iter().zip(&annotated) {
                prop_assert_eq!(metadata.column_for(member).is_some(), *explicit);
            }
            prop_assert!(metadata.bindings().iter().all(|b| b.explicit));
        } else {
            let is_empty_manual = matches!(result, Err(Error::EmptyManualMapping { .. }));
            prop_assert!(is_empty_manual);
        }
    }
}
