//! Unit tests for typed values and object handles.

use std::cmp::Ordering;

use anyhow::{Result, ensure};
use rstest::rstest;
use serde_json::json;

use super::{Datum, Declared, FieldValue, Mappable, ObjectHandle, TypeRef};
use crate::{AccessError, FieldDeclaration, SemanticType, TypeDescriptor, impl_mappable};

#[derive(Clone, Debug, Default, PartialEq)]
struct Badge {
    label: Option<String>,
    level: Option<i64>,
    tags: Vec<String>,
}

impl_mappable!(Badge { label, level, tags });

impl Declared for Badge {
    fn declarations() -> TypeDescriptor {
        TypeDescriptor::new()
            .default_constructor::<Self>()
            .field(FieldDeclaration::new("label", SemanticType::String))
    }
}

#[rstest]
#[case(Datum::Int(1), Datum::Int(2), Some(Ordering::Less))]
#[case(Datum::from("b"), Datum::from("a"), Some(Ordering::Greater))]
#[case(Datum::Float(1.5), Datum::Float(1.5), Some(Ordering::Equal))]
#[case(Datum::Int(1), Datum::from("1"), None)]
fn compares_scalars_of_one_kind(
    #[case] left: Datum,
    #[case] right: Datum,
    #[case] expected: Option<Ordering>,
) {
    assert_eq!(left.scalar_cmp(&right), expected);
}

#[rstest]
fn conversions_pick_the_matching_variant() {
    assert_eq!(Datum::from(7_i32), Datum::Int(7));
    assert_eq!(Datum::from(vec!["a", "b"]), Datum::List(vec![
        Datum::from("a"),
        Datum::from("b"),
    ]));
    assert_eq!(Datum::from(json!({"k": 1})), Datum::Raw(json!({"k": 1})));
}

#[rstest]
fn macro_reads_and_writes_fields() -> Result<()> {
    let mut badge = Badge::default();
    ensure!(badge.read_field("label").is_none(), "unset option reads as None");
    badge.write_field("label", Datum::from("gold"))?;
    badge.write_field("level", Datum::Int(3))?;
    badge.write_field("tags", Datum::from(vec!["a"]))?;
    ensure!(badge.read_field("label") == Some(Datum::from("gold")), "label");
    ensure!(badge.read_field("level") == Some(Datum::Int(3)), "level");
    badge.write_field("level", Datum::Null)?;
    ensure!(badge.level.is_none(), "null clears an optional field");
    Ok(())
}

#[rstest]
fn macro_rejects_unknown_and_mistyped_values() {
    let mut badge = Badge::default();
    assert_eq!(
        badge.write_field("colour", Datum::Null),
        Err(AccessError::UnknownField("colour".to_owned()))
    );
    assert_eq!(
        badge.write_field("level", Datum::from("high")),
        Err(AccessError::TypeMismatch {
            expected: "int".to_owned(),
            found: "string".to_owned(),
        })
    );
}

#[rstest]
fn handles_compare_by_identity() {
    let first = ObjectHandle::new(Badge::default());
    let shared = first.clone();
    let other = ObjectHandle::new(Badge::default());
    assert_eq!(first, shared);
    assert_ne!(first, other);
    assert_eq!(first.type_ref(), TypeRef::of::<Badge>());
}

#[rstest]
fn handles_downcast_to_the_concrete_type() -> Result<()> {
    let handle = ObjectHandle::new(Badge::default());
    ensure!(handle.is::<Badge>(), "handle holds a Badge");
    ensure!(!handle.is::<String>(), "handle does not hold a String");
    handle.with_mut(|badge: &mut Badge| badge.level = Some(9));
    let level = handle.with_ref(|badge: &Badge| badge.level);
    ensure!(level == Some(Some(9)), "level was {level:?}");
    ensure!(
        handle.cloned::<Badge>().and_then(|badge| badge.level) == Some(9),
        "clone sees the mutation"
    );
    Ok(())
}

#[rstest]
fn nested_structs_round_trip_through_field_values() -> Result<()> {
    let badge = Badge {
        label: Some("gold".to_owned()),
        ..Badge::default()
    };
    let datum = badge.to_datum();
    let Some(Datum::Object(handle)) = &datum else {
        anyhow::bail!("expected an object datum, got {datum:?}");
    };
    ensure!(handle.is::<Badge>(), "nested value keeps its type");
    let back = Badge::from_datum(Datum::Object(handle.clone()))?;
    ensure!(back == badge, "round trip changed the value");
    Ok(())
}

#[rstest]
fn type_refs_use_short_names() {
    assert_eq!(TypeRef::of::<Badge>().name(), "Badge");
    assert!(TypeRef::of::<Badge>().is_declared());
    assert!(!TypeRef::undeclared::<String>().is_declared());
}
