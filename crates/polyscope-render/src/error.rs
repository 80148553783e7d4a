//! Rendering error types.

use polyscope_core::PolyscopeError;
use thiserror::Error;

/// Errors raised while registering shader rules or composing program variants.
///
/// These are detected when the rule table is built, never at draw time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShaderRuleError {
    /// A base template with this name is already registered.
    #[error("shader template '{0}' is already registered")]
    DuplicateTemplate(String),

    /// A rule with this name is already registered.
    #[error("shader rule '{0}' is already registered")]
    DuplicateRule(String),

    /// A program variant with this label is already registered.
    #[error("program variant '{0}' is already registered")]
    DuplicateVariant(String),

    /// No template with this name exists.
    #[error("unknown shader template '{0}'")]
    UnknownTemplate(String),

    /// No rule with this name exists.
    #[error("unknown shader rule '{0}'")]
    UnknownRule(String),

    /// A rule provides source for a tag that no template offers.
    #[error("rule '{rule}' targets tag '{tag}' which no template offers")]
    UnknownTag { rule: String, tag: String },

    /// A rule tries to fill a tag the composer generates itself.
    #[error("rule '{rule}' targets generated tag '{tag}'")]
    ReservedTag { rule: String, tag: String },

    /// A rule references an `a_`, `u_`, or `t_` symbol nobody declares.
    #[error("rule '{rule}' references undeclared symbol '{symbol}'")]
    UndeclaredSymbol { rule: String, symbol: String },

    /// Two declarations in one variant share a name.
    #[error("variant '{variant}' declares '{symbol}' more than once")]
    DeclarationCollision { variant: String, symbol: String },

    /// A rule in a variant targets a tag the variant's base does not offer.
    #[error("variant '{variant}': rule '{rule}' targets tag '{tag}' not offered by its base")]
    TagNotOffered {
        variant: String,
        rule: String,
        tag: String,
    },
}

/// Errors that can occur during rendering operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    /// Rule table or variant composition failed.
    #[error(transparent)]
    ShaderRule(#[from] ShaderRuleError),

    /// No variant with this label has been registered.
    #[error("unknown program variant '{0}'")]
    UnknownProgram(String),

    /// The backend could not build a program.
    #[error("program build failed: {0}")]
    ProgramBuildFailed(String),

    /// An attribute was set that the program does not declare.
    #[error("program '{program}' has no attribute '{name}'")]
    UnknownAttribute { program: String, name: String },

    /// A uniform was set that the program does not declare.
    #[error("program '{program}' has no uniform '{name}'")]
    UnknownUniform { program: String, name: String },

    /// A texture was bound that the program does not declare.
    #[error("program '{program}' has no texture '{name}'")]
    UnknownTexture { program: String, name: String },

    /// Attribute or uniform data does not match its declared type.
    #[error("program '{program}': '{name}' expects {expected}, got {actual}")]
    TypeMismatch {
        program: String,
        name: String,
        expected: String,
        actual: String,
    },

    /// A declared input was never provided before drawing.
    #[error("program '{program}' drawn without '{name}'")]
    MissingInput { program: String, name: String },

    /// Per-instance attributes disagree on their element count.
    #[error("program '{program}': attribute '{name}' has {actual} elements, expected {expected}")]
    AttributeLengthMismatch {
        program: String,
        name: String,
        expected: usize,
        actual: usize,
    },

    /// The named color map is not registered.
    #[error("unknown color map '{0}'")]
    UnknownColorMap(String),

    /// The named material does not exist.
    #[error("unknown material '{0}'")]
    UnknownMaterial(String),
}

/// A specialized Result type for rendering operations.
pub type RenderResult<T> = std::result::Result<T, RenderError>;

impl From<RenderError> for PolyscopeError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::UnknownColorMap(name) => PolyscopeError::UnknownColorMap(name),
            RenderError::UnknownMaterial(name) => PolyscopeError::UnknownMaterial(name),
            other => PolyscopeError::RenderError(other.to_string()),
        }
    }
}
