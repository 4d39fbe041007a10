//! Circular references, string-backed objects, and unusable accessors.

mod common;

use anyhow::{Result, ensure};
use common::{
    graph::{Clash, Dimensions, Node, Orphan, Screen, node_cycle},
    mapper,
};
use mapweave::{ErrorKind, MapError, Mapper, MappingOptions, TypeRef};
use rstest::rstest;
use serde_json::json;

#[rstest]
fn a_cycle_fails_without_a_handler(mapper: Mapper) {
    let (first, _second) = node_cycle();
    let err = mapper
        .normalize(&first, &MappingOptions::new())
        .expect_err("the nodes reference each other");
    match err {
        MapError::CircularReference { type_name, limit } => {
            assert_eq!(type_name, TypeRef::of::<Node>().name());
            assert_eq!(limit, 1);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[rstest]
fn a_handler_replaces_the_repeated_object(mapper: Mapper) -> Result<()> {
    let (first, _second) = node_cycle();
    let options = MappingOptions::new().circular_reference_handler(|handle| {
        let name = handle.with_ref::<Node, _>(|node| node.name.clone()).flatten();
        Ok(json!({"ref": name}))
    });
    let raw = mapper.normalize(&first, &options)?;
    ensure!(
        raw == json!({"name": "a", "next": {"name": "b", "next": {"ref": "a"}}}),
        "unexpected output {raw}"
    );
    Ok(())
}

#[rstest]
fn a_higher_limit_allows_repeated_visits(mapper: Mapper) -> Result<()> {
    let (first, _second) = node_cycle();
    let options = MappingOptions::new()
        .circular_reference_limit(2)
        .circular_reference_handler(|_| Ok(json!("…")));
    let raw = mapper.normalize(&first, &options)?;
    ensure!(
        raw == json!({
            "name": "a",
            "next": {
                "name": "b",
                "next": {"name": "a", "next": {"name": "b", "next": "…"}}
            }
        }),
        "unexpected output {raw}"
    );
    Ok(())
}

#[rstest]
fn a_zero_limit_still_allows_the_first_visit(mapper: Mapper) -> Result<()> {
    let options = MappingOptions::new().circular_reference_limit(0);
    let single = Node {
        name: Some("solo".to_owned()),
        next: None,
    };
    let raw = mapper.normalize_value(single, &options)?;
    ensure!(raw == json!({"name": "solo"}), "unexpected output {raw}");

    let (first, _second) = node_cycle();
    let err = mapper
        .normalize(&first, &options)
        .expect_err("the nodes reference each other");
    assert!(
        matches!(err, MapError::CircularReference { limit: 1, .. }),
        "unexpected error: {err:?}"
    );
    Ok(())
}

#[rstest]
fn handler_errors_propagate(mapper: Mapper) {
    let (first, _second) = node_cycle();
    let options = MappingOptions::new().circular_reference_handler(|handle| {
        Err(MapError::CircularReference {
            type_name: handle.type_ref().name().to_owned(),
            limit: 0,
        })
    });
    let err = mapper
        .normalize(&first, &options)
        .expect_err("the handler refuses");
    assert_eq!(err.kind(), ErrorKind::CircularReference);
}

#[rstest]
fn an_object_extractor_reads_captures_as_fields(mapper: Mapper) -> Result<()> {
    let input = json!({"resolution": "1920x1080", "refresh": "60Hz"});
    let screen: Screen = mapper.denormalize(&input, &MappingOptions::new())?;
    ensure!(
        screen
            == Screen {
                resolution: Some(Dimensions {
                    width: Some(1920),
                    height: Some(1080),
                }),
                refresh: Some(60),
            },
        "unexpected {screen:?}"
    );
    Ok(())
}

#[rstest]
fn an_extractor_type_still_accepts_objects(mapper: Mapper) -> Result<()> {
    let input = json!({"resolution": {"width": 800, "height": 600}});
    let screen: Screen = mapper.denormalize(&input, &MappingOptions::new())?;
    ensure!(
        screen.resolution
            == Some(Dimensions {
                width: Some(800),
                height: Some(600),
            }),
        "unexpected {screen:?}"
    );
    Ok(())
}

#[rstest]
fn a_top_level_string_uses_the_type_extractor(mapper: Mapper) -> Result<()> {
    let size: Dimensions = mapper.denormalize(&json!("3x4"), &MappingOptions::new())?;
    ensure!(
        size == Dimensions {
            width: Some(3),
            height: Some(4),
        },
        "unexpected {size:?}"
    );
    Ok(())
}

#[rstest]
#[case::object(json!({"resolution": "wide"}), "Dimensions")]
#[case::field(json!({"refresh": "fast"}), "Screen.refresh")]
fn unmatched_extractors_name_their_target(
    mapper: Mapper,
    #[case] input: serde_json::Value,
    #[case] expected_target: &str,
) {
    let err = mapper
        .denormalize::<Screen>(&input, &MappingOptions::new())
        .expect_err("the pattern does not match");
    assert!(
        matches!(&err, MapError::ExtractorMismatch { target, .. } if target == expected_target),
        "unexpected error: {err:?}"
    );
}

#[rstest]
fn a_stringify_producer_replaces_the_object(mapper: Mapper) -> Result<()> {
    let options = MappingOptions::new();
    let screen = Screen {
        resolution: Some(Dimensions {
            width: Some(1920),
            height: Some(1080),
        }),
        refresh: Some(60),
    };
    let raw = mapper.normalize_value(screen, &options)?;
    ensure!(
        raw == json!({"resolution": "1920x1080", "refresh": 60}),
        "unexpected output {raw}"
    );

    let size = Dimensions {
        width: Some(3),
        height: Some(4),
    };
    ensure!(
        mapper.normalize_value(size, &options)? == json!("3x4"),
        "top-level objects are stringified too"
    );
    Ok(())
}

#[rstest]
fn ascending_above_the_input_is_a_definition_error(mapper: Mapper) {
    let err = mapper
        .denormalize::<Orphan>(&json!({"parent": "x"}), &MappingOptions::new())
        .expect_err("a top-level object has no parent");
    assert!(err.is_definition_error(), "unexpected error: {err:?}");
}

#[rstest]
fn ascending_above_the_output_is_a_definition_error(mapper: Mapper) {
    let orphan = Orphan {
        parent: Some("x".to_owned()),
    };
    let err = mapper
        .normalize_value(orphan, &MappingOptions::new())
        .expect_err("a top-level object has no parent");
    assert!(err.is_definition_error(), "unexpected error: {err:?}");
}

#[rstest]
fn writing_through_a_scalar_is_a_definition_error(mapper: Mapper) {
    let clash = Clash {
        a: Some("x".to_owned()),
        b: Some("y".to_owned()),
    };
    let err = mapper
        .normalize_value(clash, &MappingOptions::new())
        .expect_err("'a' already holds a string");
    assert_eq!(err.kind(), ErrorKind::Definition);
}
