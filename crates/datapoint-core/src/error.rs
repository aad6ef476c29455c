//! Error types for the DataPoint core library
//!
//! Every failure raised while building or resolving reducers is an [`Error`].
//! Errors coming out of user closures travel as `anyhow::Error` and are folded
//! back into this enum by [`Error::from_user`].
//!
//! Copyright (c) 2025 DataPoint Team
//! Licensed under the Apache-2.0 license

use crate::path::PathError;
use datapoint_schemas::Violation;
use serde_json::{json, Value};
use thiserror::Error;

/// Main error type for DataPoint operations
#[derive(Error, Debug)]
pub enum Error {
    /// A source could not be classified as any reducer kind
    #[error("Invalid reducer type. Could not find a matching reducer type while parsing the value:\n {source_repr}\nTry using an Array, String, Object, Function or a reducer helper.")]
    InvalidReducerKind { source_repr: String },

    /// Entity references that do not name a registered entity
    #[error("Invalid entity references!\n{}", dangling_lines(.ids))]
    UnknownEntityReference { ids: Vec<String> },

    /// Control entity without a `default` case
    #[error("It seems {entity_id} is missing its default case, Control entities must have their default case handled.")]
    MissingDefaultCase { entity_id: String },

    /// Malformed entity specification
    #[error("Entity '{entity_id}' is invalid: {message}")]
    InvalidEntity { entity_id: String, message: String },

    #[error("Entity with id '{id}' already exists")]
    DuplicateEntity { id: String },

    #[error("Entity type '{name}' already exists")]
    DuplicateEntityType { name: String },

    #[error("Entity id '{id}' is not defined")]
    EntityNotDefined { id: String },

    /// Schema document rejected at registration
    #[error("Entity '{entity_id}' has an invalid schema: {message}")]
    InvalidSchema { entity_id: String, message: String },

    /// Value rejected by a schema entity
    #[error("Errors Found:\n - {}", violation_lines(.violations))]
    SchemaViolation { violations: Vec<Violation> },

    /// Failed input/output type check
    #[error("Entity type check failed! Expected '{expected}' but received '{found}'")]
    TypeCheck { expected: String, found: String },

    #[error(transparent)]
    Path(#[from] PathError),

    /// Failure raised by a user-supplied function reducer
    #[error("{message}")]
    Function {
        message: String,
        #[source]
        source: anyhow::Error,
    },

    /// Failure raised by a middleware hook
    #[error("Middleware '{hook}' failed: {message}")]
    Middleware {
        hook: String,
        message: String,
        #[source]
        source: anyhow::Error,
    },

    /// Transport failure for a request entity
    #[error("{message}")]
    Request {
        message: String,
        status_code: Option<u16>,
    },

    /// A combinator received a value of the wrong shape
    #[error("{message}")]
    Reducer { message: String },

    /// Error annotated with the entity that raised it
    #[error("{source}")]
    Entity {
        entity_id: String,
        source: Box<Error>,
    },

    /// JSON parsing and serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// Generic internal error with context
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

fn dangling_lines(ids: &[String]) -> String {
    ids.iter()
        .map(|id| format!("The \"{}\" entity is not defined!", id))
        .collect::<Vec<_>>()
        .join("\n")
}

fn violation_lines(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n - ")
}

impl Error {
    /// Fold an error returned by user code back into the taxonomy
    pub fn from_user(err: anyhow::Error) -> Self {
        match err.downcast::<Error>() {
            Ok(inner) => inner,
            Err(err) => Error::Function {
                message: err.to_string(),
                source: err,
            },
        }
    }

    pub fn reducer(message: impl Into<String>) -> Self {
        Error::Reducer {
            message: message.into(),
        }
    }

    pub fn invalid_entity(entity_id: impl Into<String>, message: impl Into<String>) -> Self {
        Error::InvalidEntity {
            entity_id: entity_id.into(),
            message: message.into(),
        }
    }

    /// Attach the id of the entity that raised this error
    ///
    /// An error that already carries an entity id keeps it.
    pub fn annotate(self, entity_id: &str) -> Self {
        match self {
            Error::Entity { .. } => self,
            other => Error::Entity {
                entity_id: entity_id.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// Id of the entity that raised the error, if it was annotated
    pub fn entity_id(&self) -> Option<&str> {
        match self {
            Error::Entity { entity_id, .. } => Some(entity_id),
            _ => None,
        }
    }

    /// The error without its entity annotation
    pub fn root(&self) -> &Error {
        match self {
            Error::Entity { source, .. } => source.root(),
            other => other,
        }
    }

    /// Stable name of the error kind
    pub fn name(&self) -> &'static str {
        match self.root() {
            Error::InvalidReducerKind { .. } => "InvalidReducerKind",
            Error::UnknownEntityReference { .. } => "UnknownEntityReference",
            Error::MissingDefaultCase { .. } => "MissingDefaultCase",
            Error::InvalidEntity { .. } => "InvalidEntity",
            Error::DuplicateEntity { .. } => "DuplicateEntity",
            Error::DuplicateEntityType { .. } => "DuplicateEntityType",
            Error::EntityNotDefined { .. } => "EntityNotDefined",
            Error::InvalidSchema { .. } => "InvalidSchema",
            Error::SchemaViolation { .. } => "SchemaViolation",
            Error::TypeCheck { .. } => "TypeCheck",
            Error::Path(_) => "PathError",
            Error::Function { .. } => "FunctionError",
            Error::Middleware { .. } => "MiddlewareError",
            Error::Request { .. } => "RequestError",
            Error::Reducer { .. } => "ReducerError",
            Error::Json { .. } => "JsonError",
            Error::Configuration { .. } => "ConfigurationError",
            Error::Internal { .. } | Error::Entity { .. } => "InternalError",
        }
    }

    /// Render the error as the input value of an entity `error` pipeline
    pub fn to_value(&self) -> Value {
        let mut value = json!({
            "name": self.name(),
            "message": self.to_string(),
        });

        if let Some(entity_id) = self.entity_id() {
            value["entityId"] = json!(entity_id);
        }

        match self.root() {
            Error::SchemaViolation { violations } => {
                value["errors"] = json!(violations);
            }
            Error::Request {
                status_code: Some(status),
                ..
            } => {
                value["statusCode"] = json!(status);
            }
            _ => {}
        }

        value
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::from_user(err)
    }
}
