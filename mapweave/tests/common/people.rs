//! Flat records exercising groups, scenarios, flags, unions, and
//! alternative accessors.

use mapweave::{Datum, Declared, FieldDeclaration, SemanticType, TypeDescriptor, impl_mappable};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Person {
    pub id: Option<i64>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub age: Option<i64>,
}

impl_mappable!(Person {
    id,
    firstname,
    lastname,
    age
});

impl Declared for Person {
    fn declarations() -> TypeDescriptor {
        TypeDescriptor::new()
            .default_constructor::<Self>()
            .field(FieldDeclaration::new("id", SemanticType::Int).groups(["id"]))
            .field(
                FieldDeclaration::new("firstname", SemanticType::String)
                    .path("name.firstname")
                    .groups(["name"]),
            )
            .field(
                FieldDeclaration::new("firstname", SemanticType::String)
                    .path("firstname")
                    .scenario("one")
                    .groups(["name"]),
            )
            .field(
                FieldDeclaration::new("lastname", SemanticType::String)
                    .path("name.lastname")
                    .alias("legacy", "surname")
                    .groups(["name"]),
            )
            .field(FieldDeclaration::new("age", SemanticType::Int).nullable())
            .preset("summary", ["id", "name"])
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Permissions {
    pub read: Option<bool>,
    pub write: Option<bool>,
    pub admin: Option<bool>,
}

impl_mappable!(Permissions { read, write, admin });

impl Declared for Permissions {
    fn declarations() -> TypeDescriptor {
        TypeDescriptor::new()
            .default_constructor::<Self>()
            .field(FieldDeclaration::flag("read").flag_group("flags").nullable())
            .field(FieldDeclaration::flag("write").flag_group("flags").nullable())
            .field(
                FieldDeclaration::flag("admin")
                    .flag_group("flags")
                    .flag_token("superuser")
                    .nullable(),
            )
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Measurement {
    pub value: Option<Datum>,
}

impl_mappable!(Measurement { value });

impl Declared for Measurement {
    fn declarations() -> TypeDescriptor {
        TypeDescriptor::new().default_constructor::<Self>().field(
            FieldDeclaration::new("value", SemanticType::Int).or_type(SemanticType::Float),
        )
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Account {
    pub id: Option<i64>,
    pub admin: Option<bool>,
    pub editor: Option<bool>,
}

impl_mappable!(Account { id, admin, editor });

impl Declared for Account {
    fn declarations() -> TypeDescriptor {
        TypeDescriptor::new()
            .default_constructor::<Self>()
            .field(FieldDeclaration::new("id", SemanticType::Int).path("legacy_id|id"))
            .field(FieldDeclaration::new("admin", SemanticType::Bool).path("roles@admin"))
            .field(FieldDeclaration::new("editor", SemanticType::Bool).path("roles@editor"))
    }
}
