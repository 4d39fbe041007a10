//! Constructors and classification for `MapError`.

use figment::Error as FigmentError;

use super::{ErrorKind, MapError};

impl MapError {
    /// Construct a configuration error from a [`figment::Error`].
    #[must_use]
    pub fn config(source: FigmentError) -> Self {
        Self::Config(Box::new(source))
    }

    /// Construct a [`MapError::Definition`].
    #[must_use]
    pub fn definition(
        type_name: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Definition {
            type_name: type_name.into(),
            field: field.into(),
            message: message.into(),
        }
    }

    /// Classify the error according to the mapping error taxonomy.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingMappingDeclaration { .. }
            | Self::AmbiguousArrayElementType { .. }
            | Self::InvalidMethodSignature { .. }
            | Self::DuplicateDeclarationConflict { .. }
            | Self::Definition { .. } => ErrorKind::Definition,
            Self::Coercion { .. } | Self::NoMatchingType { .. } | Self::Access { .. } => {
                ErrorKind::Coercion
            }
            Self::NotInstantiable { .. }
            | Self::FactoryFailed { .. }
            | Self::FactoriesExhausted { .. }
            | Self::MissingArgument { .. }
            | Self::InvalidArgument { .. }
            | Self::Discriminator { .. } => ErrorKind::Instantiation,
            Self::Injection { .. } => ErrorKind::Injection,
            Self::ExtractorMismatch { .. } => ErrorKind::Extractor,
            Self::CircularReference { .. } => ErrorKind::CircularReference,
            Self::Config(_) => ErrorKind::Configuration,
        }
    }

    /// Returns `true` for errors caused by the mapping declarations rather
    /// than the input data.
    #[must_use]
    pub fn is_definition_error(&self) -> bool {
        matches!(self.kind(), ErrorKind::Definition | ErrorKind::Injection)
    }
}

impl From<FigmentError> for MapError {
    fn from(e: FigmentError) -> Self {
        Self::config(e)
    }
}
