//! A polymorphic hierarchy selected by a discriminator field.

use mapweave::{
    Declared, Discriminator, FieldDeclaration, ObjectHandle, SemanticType, TypeDescriptor,
    impl_mappable,
};

/// Polymorphic base; instances are always a [`Car`] or a [`Bike`].
pub struct Vehicle;

impl Declared for Vehicle {
    fn declarations() -> TypeDescriptor {
        TypeDescriptor::new().discriminator(
            Discriminator::new("type")
                .subtype::<Car>("car")
                .subtype::<Bike>("bike"),
        )
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Car {
    pub brand: Option<String>,
    pub wheels: Option<i64>,
}

impl_mappable!(Car { brand, wheels });

impl Declared for Car {
    fn declarations() -> TypeDescriptor {
        TypeDescriptor::new()
            .default_constructor::<Self>()
            .field(FieldDeclaration::new("brand", SemanticType::String))
            .field(FieldDeclaration::new("wheels", SemanticType::Int))
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Bike {
    pub gears: Option<i64>,
}

impl_mappable!(Bike { gears });

impl Declared for Bike {
    fn declarations() -> TypeDescriptor {
        TypeDescriptor::new()
            .default_constructor::<Self>()
            .field(FieldDeclaration::new("gears", SemanticType::Int))
    }
}

#[derive(Clone, Debug, Default)]
pub struct Garage {
    pub vehicle: Option<ObjectHandle>,
    pub vehicles: Vec<ObjectHandle>,
}

impl_mappable!(Garage { vehicle, vehicles });

impl Declared for Garage {
    fn declarations() -> TypeDescriptor {
        TypeDescriptor::new()
            .default_constructor::<Self>()
            .field(FieldDeclaration::new("vehicle", SemanticType::object::<Vehicle>()).nullable())
            .field(FieldDeclaration::new(
                "vehicles",
                SemanticType::list_of(SemanticType::object::<Vehicle>()),
            ))
    }
}
