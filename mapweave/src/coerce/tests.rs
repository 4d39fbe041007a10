//! Unit tests for value coercion.

use std::sync::Arc;

use anyhow::{Context, Result, ensure};
use chrono::{TimeZone, Utc};
use rstest::rstest;
use serde_json::{Value, json};

use super::{Leniency, Site, denormalize, flags, normalize_scalar};
use crate::{
    ErrorKind, MapError, TypeDescriptor,
    declaration::{DeclarationSource, FieldDeclaration, SemanticType, ValueMap},
    plan::{FieldPlan, MemoryPlanCache, MetadataResolver},
    value::{Datum, ObjectHandle, TypeRef},
};

struct Gauge;

struct Fixed(TypeDescriptor);

impl DeclarationSource for Fixed {
    fn describe(&self, _type_ref: &TypeRef) -> Option<TypeDescriptor> {
        Some(self.0.clone())
    }
}

const STRICT: Leniency = Leniency {
    enforce_types: true,
    json_numbers: true,
};

fn plan_for(declaration: FieldDeclaration) -> Result<FieldPlan> {
    let resolver = MetadataResolver::new(
        Arc::new(Fixed(TypeDescriptor::new().field(declaration))),
        Arc::new(MemoryPlanCache::new()),
    );
    let plan = resolver.resolve(&TypeRef::undeclared::<Gauge>())?;
    plan.fields()
        .first()
        .and_then(|member| member.select("default"))
        .cloned()
        .context("field plan missing")
}

fn no_nesting(_type_ref: TypeRef, _value: &Value) -> Result<ObjectHandle, MapError> {
    Err(MapError::NotInstantiable {
        type_name: "Gauge".to_owned(),
        message: "nesting is not used here".to_owned(),
    })
}

fn coerce(field: &FieldPlan, raw: &Value, leniency: Leniency) -> Result<Option<Datum>, MapError> {
    let site = Site {
        type_name: "Gauge",
        field,
        path: field.name().to_owned(),
    };
    denormalize(raw, &site, leniency, &no_nesting)
}

#[rstest]
#[case(json!(42), Datum::Int(42))]
#[case(json!(13.37), Datum::Float(13.37))]
fn unions_pick_the_first_matching_candidate(
    #[case] raw: Value,
    #[case] expected: Datum,
) -> Result<()> {
    let field = plan_for(FieldDeclaration::new("value", SemanticType::Int).or_type(SemanticType::Float))?;
    let mapped = coerce(&field, &raw, STRICT)?;
    ensure!(mapped == Some(expected.clone()), "{raw} mapped to {mapped:?}");
    Ok(())
}

#[rstest]
fn exhausted_unions_report_every_candidate() -> Result<()> {
    let field = plan_for(FieldDeclaration::new("value", SemanticType::Int).or_type(SemanticType::Float))?;
    match coerce(&field, &json!("nope"), STRICT) {
        Err(MapError::NoMatchingType { attempted, source, .. }) => {
            ensure!(attempted == ["int", "float"], "attempted {attempted:?}");
            ensure!(matches!(*source, MapError::Coercion { .. }), "source {source:?}");
        }
        other => anyhow::bail!("expected NoMatchingType, got {other:?}"),
    }
    Ok(())
}

#[rstest]
#[case(json!(true), true)]
#[case(json!(0), false)]
#[case(json!("YES"), true)]
#[case(json!("off"), false)]
fn default_boolean_tokens(#[case] raw: Value, #[case] expected: bool) -> Result<()> {
    let field = plan_for(FieldDeclaration::new("value", SemanticType::Bool))?;
    ensure!(coerce(&field, &raw, STRICT)? == Some(Datum::Bool(expected)));
    Ok(())
}

#[rstest]
#[case::truthy_token(json!("Y"), true)]
#[case::falsy_token(json!("N"), false)]
#[case::default_bool(json!(true), true)]
#[case::default_word(json!("off"), false)]
#[case::default_number(json!(1), true)]
fn explicit_tokens_fall_back_to_defaults(#[case] raw: Value, #[case] expected: bool) -> Result<()> {
    let field = plan_for(FieldDeclaration::new("value", SemanticType::Bool).tokens("Y", "N"))?;
    ensure!(coerce(&field, &raw, STRICT)? == Some(Datum::Bool(expected)));
    Ok(())
}

#[rstest]
fn unrecognised_tokens_fail_unless_nullable() -> Result<()> {
    let strict = plan_for(FieldDeclaration::new("value", SemanticType::Bool).tokens("Y", "N"))?;
    let err = coerce(&strict, &json!("maybe"), STRICT)
        .err()
        .ok_or_else(|| anyhow::anyhow!("'maybe' is neither a token nor a default"))?;
    ensure!(err.kind() == ErrorKind::Coercion, "unexpected error {err:?}");
    ensure!(err.to_string().contains(r#""Y""#), "tokens are named: {err}");

    let nullable = plan_for(
        FieldDeclaration::new("value", SemanticType::Bool)
            .tokens("Y", "N")
            .nullable(),
    )?;
    ensure!(coerce(&nullable, &json!("maybe"), STRICT)?.is_none());
    Ok(())
}

#[rstest]
fn integral_numbers_fill_float_fields() -> Result<()> {
    let field = plan_for(FieldDeclaration::new("value", SemanticType::Float))?;
    ensure!(coerce(&field, &json!(3), STRICT)? == Some(Datum::Float(3.0)));
    let no_json = Leniency {
        enforce_types: true,
        json_numbers: false,
    };
    ensure!(coerce(&field, &json!(3), no_json).is_err());
    Ok(())
}

#[rstest]
fn numeric_strings_need_disabled_enforcement() -> Result<()> {
    let field = plan_for(FieldDeclaration::new("value", SemanticType::Int))?;
    ensure!(coerce(&field, &json!("42"), STRICT).is_err());
    let lenient = Leniency {
        enforce_types: false,
        json_numbers: true,
    };
    ensure!(coerce(&field, &json!("42"), lenient)? == Some(Datum::Int(42)));
    Ok(())
}

#[rstest]
fn nulls_respect_nullability() -> Result<()> {
    let required = plan_for(FieldDeclaration::new("value", SemanticType::String))?;
    ensure!(matches!(
        coerce(&required, &Value::Null, STRICT),
        Err(MapError::Coercion { .. })
    ));
    let optional = plan_for(FieldDeclaration::new("value", SemanticType::String).nullable())?;
    ensure!(coerce(&optional, &Value::Null, STRICT)? == Some(Datum::Null));
    Ok(())
}

#[rstest]
fn dates_round_trip_through_their_format() -> Result<()> {
    let field = plan_for(FieldDeclaration::new("value", SemanticType::DateTime).date_format("%d/%m/%Y"))?;
    let mapped = coerce(&field, &json!("06/05/2024"), STRICT)?;
    let expected = Utc
        .with_ymd_and_hms(2024, 5, 6, 0, 0, 0)
        .single()
        .context("valid date")?
        .fixed_offset();
    ensure!(mapped == Some(Datum::DateTime(expected)), "mapped {mapped:?}");
    let raw = normalize_scalar(&Datum::DateTime(expected), "Gauge", &field, "value")?;
    ensure!(raw == json!("06/05/2024"), "normalized to {raw}");
    Ok(())
}

#[rstest]
fn default_date_format_keeps_offsets() -> Result<()> {
    let field = plan_for(FieldDeclaration::new("value", SemanticType::DateTime))?;
    let raw = json!("2024-05-06T14:30:00+02:00");
    let mapped = coerce(&field, &raw, STRICT)?.context("date expected")?;
    ensure!(normalize_scalar(&mapped, "Gauge", &field, "value")? == raw);
    Ok(())
}

#[rstest]
fn value_maps_translate_and_miss_quietly() -> Result<()> {
    let table = ValueMap::new().entry("M", "male").entry("F", "female");
    let field = plan_for(FieldDeclaration::new("value", SemanticType::String).value_map(table.clone()))?;
    ensure!(coerce(&field, &json!("F"), STRICT)? == Some(Datum::from("female")));
    ensure!(coerce(&field, &json!("X"), STRICT)?.is_none());
    ensure!(normalize_scalar(&Datum::from("male"), "Gauge", &field, "value")? == json!("M"));

    let with_fallback = plan_for(
        FieldDeclaration::new("value", SemanticType::String).value_map(table.fallback("unknown")),
    )?;
    ensure!(coerce(&with_fallback, &json!("X"), STRICT)? == Some(Datum::from("unknown")));
    Ok(())
}

#[rstest]
fn extractors_feed_scalar_fields() -> Result<()> {
    let field = plan_for(FieldDeclaration::new("value", SemanticType::Int).extractor(r"^(\d+)px$"))?;
    ensure!(coerce(&field, &json!("12px"), STRICT)? == Some(Datum::Int(12)));
    match coerce(&field, &json!("12em"), STRICT) {
        Err(MapError::ExtractorMismatch { pattern, input, .. }) => {
            ensure!(pattern == r"^(\d+)px$" && input == "12em");
        }
        other => anyhow::bail!("expected ExtractorMismatch, got {other:?}"),
    }
    Ok(())
}

#[rstest]
fn lists_are_sorted_when_ordered() -> Result<()> {
    let field = plan_for(
        FieldDeclaration::new("value", SemanticType::list_of(SemanticType::Int)).default_order("desc"),
    )?;
    let mapped = coerce(&field, &json!([2, 9, 4]), STRICT)?;
    ensure!(mapped == Some(Datum::from(vec![9_i64, 4, 2])), "mapped {mapped:?}");
    Ok(())
}

#[rstest]
fn bare_lists_need_an_element_hint() -> Result<()> {
    let outcome = plan_for(FieldDeclaration::new("value", SemanticType::untyped_list()));
    let err = outcome.err().context("plan should fail")?;
    ensure!(
        matches!(
            err.downcast_ref::<MapError>(),
            Some(MapError::AmbiguousArrayElementType { .. })
        ),
        "unexpected error {err}"
    );
    Ok(())
}

#[rstest]
#[case(json!(["admin"]), Some(true))]
#[case(json!(["!admin"]), Some(false))]
#[case(json!(["staff"]), None)]
#[case(json!("admin"), None)]
fn flag_tokens(#[case] list: Value, #[case] expected: Option<bool>) {
    assert_eq!(flags::read(Some(&list), "admin"), expected);
}

#[rstest]
fn flag_writes_mark_negation() {
    assert_eq!(flags::write("admin", true), json!("admin"));
    assert_eq!(flags::write("admin", false), json!("!admin"));
}
