//! Self-referencing nodes, string-backed objects, and broken accessors.

use mapweave::{
    Declared, FieldDeclaration, ObjectHandle, ProducerDeclaration, SemanticType, TypeDescriptor,
    impl_mappable,
};

#[derive(Clone, Debug, Default)]
pub struct Node {
    pub name: Option<String>,
    pub next: Option<ObjectHandle>,
}

impl_mappable!(Node { name, next });

impl Declared for Node {
    fn declarations() -> TypeDescriptor {
        TypeDescriptor::new()
            .default_constructor::<Self>()
            .field(FieldDeclaration::new("name", SemanticType::String))
            .field(FieldDeclaration::new("next", SemanticType::object::<Self>()).nullable())
    }
}

/// Two nodes pointing at each other.
#[must_use]
pub fn node_cycle() -> (ObjectHandle, ObjectHandle) {
    let first = ObjectHandle::new(Node {
        name: Some("a".to_owned()),
        next: None,
    });
    let second = ObjectHandle::new(Node {
        name: Some("b".to_owned()),
        next: Some(first.clone()),
    });
    first.with_mut::<Node, _>(|node| node.next = Some(second.clone()));
    (first, second)
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dimensions {
    pub width: Option<i64>,
    pub height: Option<i64>,
}

impl_mappable!(Dimensions { width, height });

impl Declared for Dimensions {
    fn declarations() -> TypeDescriptor {
        TypeDescriptor::new()
            .default_constructor::<Self>()
            .extractor(r"^(?P<width>\d+)x(?P<height>\d+)$")
            .field(FieldDeclaration::new("width", SemanticType::Int))
            .field(FieldDeclaration::new("height", SemanticType::Int))
            .producer(
                ProducerDeclaration::new("render", |size: &Self| {
                    format!(
                        "{}x{}",
                        size.width.unwrap_or_default(),
                        size.height.unwrap_or_default()
                    )
                })
                .stringify(),
            )
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Screen {
    pub resolution: Option<Dimensions>,
    pub refresh: Option<i64>,
}

impl_mappable!(Screen { resolution, refresh });

impl Declared for Screen {
    fn declarations() -> TypeDescriptor {
        TypeDescriptor::new()
            .default_constructor::<Self>()
            .field(FieldDeclaration::new("resolution", SemanticType::object::<Dimensions>()))
            .field(FieldDeclaration::new("refresh", SemanticType::Int).extractor(r"^(\d+)Hz$"))
    }
}

/// Reads its parent's name, which only exists when nested.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Orphan {
    pub parent: Option<String>,
}

impl_mappable!(Orphan { parent });

impl Declared for Orphan {
    fn declarations() -> TypeDescriptor {
        TypeDescriptor::new()
            .default_constructor::<Self>()
            .field(FieldDeclaration::new("parent", SemanticType::String).path("../name"))
    }
}

/// Writes `b` below the scalar written for `a`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Clash {
    pub a: Option<String>,
    pub b: Option<String>,
}

impl_mappable!(Clash { a, b });

impl Declared for Clash {
    fn declarations() -> TypeDescriptor {
        TypeDescriptor::new()
            .default_constructor::<Self>()
            .field(FieldDeclaration::new("a", SemanticType::String))
            .field(FieldDeclaration::new("b", SemanticType::String).path("a.b"))
    }
}
