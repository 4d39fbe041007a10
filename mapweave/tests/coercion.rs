//! Scalar coercion, unions, nullable fields, and flag lists.

mod common;

use anyhow::{Result, ensure};
use common::{
    catalog::Book,
    mapper,
    people::{Measurement, Permissions, Person},
};
use mapweave::{Datum, ErrorKind, MapError, Mapper, MappingOptions};
use rstest::rstest;
use serde_json::{Value, json};

#[rstest]
#[case::int(json!(42), Datum::Int(42))]
#[case::float(json!(13.37), Datum::Float(13.37))]
fn unions_take_the_first_matching_type(
    mapper: Mapper,
    #[case] raw: Value,
    #[case] expected: Datum,
) -> Result<()> {
    let measurement: Measurement =
        mapper.denormalize(&json!({"value": raw}), &MappingOptions::new())?;
    ensure!(
        measurement.value == Some(expected),
        "unexpected {measurement:?}"
    );
    Ok(())
}

#[rstest]
fn unions_report_every_candidate(mapper: Mapper) {
    let err = mapper
        .denormalize::<Measurement>(&json!({"value": "invalid"}), &MappingOptions::new())
        .expect_err("a word is neither int nor float");
    match err {
        MapError::NoMatchingType {
            field,
            attempted,
            source,
            ..
        } => {
            assert_eq!(field, "value");
            assert_eq!(attempted, vec!["int".to_owned(), "float".to_owned()]);
            assert_eq!(source.kind(), ErrorKind::Coercion);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[rstest]
fn nullable_fields_swallow_mismatches(mapper: Mapper) -> Result<()> {
    let person: Person = mapper.denormalize(
        &json!({"id": 1, "age": "unknown"}),
        &MappingOptions::new(),
    )?;
    ensure!(person.age.is_none(), "age stays unset");
    ensure!(person.id == Some(1), "other fields still map");
    Ok(())
}

#[rstest]
fn non_nullable_fields_reject_null(mapper: Mapper) {
    let err = mapper
        .denormalize::<Person>(&json!({"id": null}), &MappingOptions::new())
        .expect_err("id is not nullable");
    assert_eq!(err.kind(), ErrorKind::Coercion);
}

#[rstest]
fn strict_mode_rejects_numeric_strings(mapper: Mapper) {
    let err = mapper
        .denormalize::<Person>(&json!({"id": "42"}), &MappingOptions::new())
        .expect_err("strings are not ints by default");
    assert!(
        matches!(&err, MapError::Coercion { field, .. } if field == "id"),
        "unexpected error: {err:?}"
    );
}

#[rstest]
fn lenient_mode_parses_numeric_strings(mapper: Mapper) -> Result<()> {
    let options = MappingOptions::new().disable_type_enforcement(true);
    let person: Person = mapper.denormalize(
        &json!({"id": "42", "name": {"firstname": 7}}),
        &options,
    )?;
    ensure!(person.id == Some(42), "id parsed");
    ensure!(person.firstname.as_deref() == Some("7"), "number stringified");
    Ok(())
}

#[rstest]
#[case::accepted(true, true)]
#[case::rejected(false, false)]
fn integral_numbers_fill_float_fields_when_allowed(
    mapper: Mapper,
    #[case] json_numbers: bool,
    #[case] accepted: bool,
) {
    let options = MappingOptions::new().json_numbers(json_numbers);
    let input = json!({"title": "Dune", "score": 4});
    let result = mapper.denormalize_type(&input, &mapweave::TypeRef::of::<Book>(), &options);
    assert_eq!(result.is_ok(), accepted, "unexpected result {result:?}");
}

#[rstest]
fn flags_read_bare_and_negated_tokens(mapper: Mapper) -> Result<()> {
    let input = json!({"flags": ["read", "!write", "superuser"]});
    let permissions: Permissions = mapper.denormalize(&input, &MappingOptions::new())?;
    ensure!(
        permissions
            == Permissions {
                read: Some(true),
                write: Some(false),
                admin: Some(true),
            },
        "unexpected {permissions:?}"
    );
    Ok(())
}

#[rstest]
fn missing_flags_are_null(mapper: Mapper) -> Result<()> {
    let permissions: Permissions =
        mapper.denormalize(&json!({"flags": ["read"]}), &MappingOptions::new())?;
    ensure!(permissions.write.is_none(), "write absent");
    ensure!(permissions.admin.is_none(), "admin absent");
    Ok(())
}

#[rstest]
fn flags_normalize_to_tokens(mapper: Mapper) -> Result<()> {
    let permissions = Permissions {
        read: Some(true),
        write: Some(false),
        admin: None,
    };
    let raw = mapper.normalize_value(permissions, &MappingOptions::new())?;
    ensure!(
        raw == json!({"flags": ["read", "!write"]}),
        "unexpected output {raw}"
    );
    Ok(())
}
