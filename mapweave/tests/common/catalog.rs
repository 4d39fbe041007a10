//! A small object graph with relative and root-relative accessors.

use chrono::{DateTime, FixedOffset};
use mapweave::{Declared, FieldDeclaration, SemanticType, TypeDescriptor, impl_mappable};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Library {
    pub name: Option<String>,
    pub founded: Option<DateTime<FixedOffset>>,
    pub books: Vec<Book>,
    pub ratings: Vec<i64>,
}

impl_mappable!(Library {
    name,
    founded,
    books,
    ratings
});

impl Declared for Library {
    fn declarations() -> TypeDescriptor {
        TypeDescriptor::new()
            .default_constructor::<Self>()
            .field(FieldDeclaration::new("name", SemanticType::String))
            .field(FieldDeclaration::new("founded", SemanticType::DateTime))
            .field(FieldDeclaration::new(
                "books",
                SemanticType::list_of(SemanticType::object::<Book>()),
            ))
            .field(FieldDeclaration::new("ratings", SemanticType::untyped_list()).default_order("desc"))
            .element_hint("ratings", SemanticType::Int)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Book {
    pub title: Option<String>,
    pub score: Option<f64>,
    pub library_name: Option<String>,
    pub locale: Option<String>,
}

impl_mappable!(Book {
    title,
    score,
    library_name,
    locale
});

impl Declared for Book {
    fn declarations() -> TypeDescriptor {
        TypeDescriptor::new()
            .default_constructor::<Self>()
            .field(FieldDeclaration::new("title", SemanticType::String))
            .field(FieldDeclaration::new("score", SemanticType::Float))
            .field(FieldDeclaration::new("library_name", SemanticType::String).path("../name"))
            .field(
                FieldDeclaration::new("locale", SemanticType::String)
                    .path("settings.locale")
                    .root(),
            )
    }
}
