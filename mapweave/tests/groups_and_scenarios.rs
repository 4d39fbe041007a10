//! Group filtering, presets, aliases, and scenario selection.

mod common;

use anyhow::{Result, ensure};
use common::{mapper, people::Person};
use mapweave::{Mapper, MappingOptions};
use rstest::rstest;
use serde_json::{Value, json};

fn full_input() -> Value {
    json!({
        "id": 42,
        "name": {"firstname": "Ada", "lastname": "Lovelace"},
        "age": 36
    })
}

fn ada() -> Person {
    Person {
        id: Some(42),
        firstname: Some("Ada".to_owned()),
        lastname: Some("Lovelace".to_owned()),
        age: Some(36),
    }
}

#[rstest]
fn a_group_limits_denormalization_to_its_members(mapper: Mapper) -> Result<()> {
    let options = MappingOptions::new().groups(["id"]);
    let person: Person = mapper.denormalize(&full_input(), &options)?;
    ensure!(
        person
            == Person {
                id: Some(42),
                ..Person::default()
            },
        "untagged and other groups are skipped: {person:?}"
    );
    Ok(())
}

#[rstest]
fn a_preset_expands_to_its_groups(mapper: Mapper) -> Result<()> {
    let options = MappingOptions::new().groups(["summary"]);
    let person: Person = mapper.denormalize(&full_input(), &options)?;
    ensure!(
        person
            == Person {
                age: None,
                ..ada()
            },
        "summary covers id and name: {person:?}"
    );
    Ok(())
}

#[rstest]
#[case::unfiltered(MappingOptions::new(), full_input())]
#[case::id_only(MappingOptions::new().groups(["id"]), json!({"id": 42}))]
#[case::name_only(
    MappingOptions::new().groups(["name"]),
    json!({"name": {"firstname": "Ada", "lastname": "Lovelace"}})
)]
#[case::unknown_group(MappingOptions::new().groups(["audit"]), json!({}))]
fn groups_filter_normalization(
    mapper: Mapper,
    #[case] options: MappingOptions,
    #[case] expected: Value,
) -> Result<()> {
    let raw = mapper.normalize_value(ada(), &options)?;
    ensure!(raw == expected, "unexpected output {raw}");
    Ok(())
}

#[rstest]
fn an_active_alias_group_redirects_the_accessor(mapper: Mapper) -> Result<()> {
    let options = MappingOptions::new().groups(["name", "legacy"]);
    let input = json!({
        "name": {"firstname": "Ada", "lastname": "ignored"},
        "surname": "Byron"
    });
    let person: Person = mapper.denormalize(&input, &options)?;
    ensure!(person.lastname.as_deref() == Some("Byron"), "alias wins");

    let raw = mapper.normalize_value(person, &options)?;
    ensure!(
        raw == json!({"name": {"firstname": "Ada"}, "surname": "Byron"}),
        "unexpected output {raw}"
    );
    Ok(())
}

#[rstest]
fn a_scenario_selects_its_own_accessor(mapper: Mapper) -> Result<()> {
    let options = MappingOptions::new().scenario("one");
    let input = json!({
        "id": 42,
        "firstname": "Ada",
        "name": {"firstname": "ignored", "lastname": "Lovelace"},
        "age": 36
    });
    let person: Person = mapper.denormalize(&input, &options)?;
    ensure!(person == ada(), "unexpected {person:?}");

    let raw = mapper.normalize_value(person, &options)?;
    ensure!(
        raw == json!({
            "id": 42,
            "firstname": "Ada",
            "name": {"lastname": "Lovelace"},
            "age": 36
        }),
        "unexpected output {raw}"
    );
    Ok(())
}

#[rstest]
fn an_undeclared_scenario_falls_back_to_the_default(mapper: Mapper) -> Result<()> {
    let options = MappingOptions::new().scenario("two");
    let person: Person = mapper.denormalize(&full_input(), &options)?;
    ensure!(person == ada(), "unexpected {person:?}");
    ensure!(
        mapper.normalize_value(person, &options)? == full_input(),
        "default accessors are used for output"
    );
    Ok(())
}

#[rstest]
fn groups_and_scenarios_combine(mapper: Mapper) -> Result<()> {
    let options = MappingOptions::new().scenario("one").groups(["name"]);
    let input = json!({"id": 42, "firstname": "Ada", "name": {"lastname": "Lovelace"}});
    let person: Person = mapper.denormalize(&input, &options)?;
    ensure!(
        person
            == Person {
                firstname: Some("Ada".to_owned()),
                lastname: Some("Lovelace".to_owned()),
                ..Person::default()
            },
        "unexpected {person:?}"
    );
    Ok(())
}
