// builder_result.rs — The tagged result returned from every mutating
// ProgramBuilder/RuntimeBuilder operation (spec §4.1).
//
// `BuilderResult` is a carrier, not a control-flow mechanism: callers
// branch on `is_ok()` and consume the other fields rather than `?`-
// propagating. This mirrors spec §4.1's explicit framing and keeps the
// type usable directly from a GUI layer that wants a value, not a panic.

use std::fmt;

use crate::diag::{codes, DiagCode, DiagLevel, Diagnostic};
use crate::id::EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Success,
    DuplicateName,
    NotFound,
    DependencyExists,
    InvalidParameter,
    InvalidReference,
}

impl ErrorCode {
    /// The stable diagnostic code this `ErrorCode` surfaces as when
    /// aggregated into `build()`'s diagnostic list.
    pub fn diag_code(self) -> DiagCode {
        match self {
            ErrorCode::Success => codes::B0001, // never actually emitted
            ErrorCode::DuplicateName => codes::B0001,
            ErrorCode::NotFound => codes::B0002,
            ErrorCode::DependencyExists => codes::B0003,
            ErrorCode::InvalidParameter => codes::B0004,
            ErrorCode::InvalidReference => codes::B0005,
        }
    }
}

/// Result of a mutating builder operation, generic over the component type
/// returned on success.
#[derive(Debug, Clone)]
pub enum BuilderResult<T> {
    Ok {
        id: EntityId,
        component: T,
    },
    Err {
        code: ErrorCode,
        message: String,
        dependencies: Option<Vec<String>>,
    },
}

impl<T> BuilderResult<T> {
    pub fn ok(id: EntityId, component: T) -> Self {
        BuilderResult::Ok { id, component }
    }

    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        BuilderResult::Err {
            code,
            message: message.into(),
            dependencies: None,
        }
    }

    pub fn error_with_deps(code: ErrorCode, message: impl Into<String>, deps: Vec<String>) -> Self {
        BuilderResult::Err {
            code,
            message: message.into(),
            dependencies: Some(deps),
        }
    }

    pub fn duplicate(component_type: &str, name: &str, existing_id: EntityId) -> Self {
        Self::error(
            ErrorCode::DuplicateName,
            format!("{component_type} '{name}' already exists with id {existing_id}"),
        )
    }

    pub fn not_found(id: EntityId) -> Self {
        Self::error(
            ErrorCode::NotFound,
            format!("component with id '{id}' not found"),
        )
    }

    pub fn has_dependencies(id: EntityId, component_type: &str, deps: Vec<String>) -> Self {
        let dep_str = deps.join(", ");
        Self::error_with_deps(
            ErrorCode::DependencyExists,
            format!("cannot remove {component_type} '{id}': used by {dep_str}"),
            deps,
        )
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, BuilderResult::Ok { .. })
    }

    pub fn id(&self) -> Option<EntityId> {
        match self {
            BuilderResult::Ok { id, .. } => Some(*id),
            BuilderResult::Err { .. } => None,
        }
    }

    /// Render this result as a `Diagnostic`, for aggregation into `build()`'s
    /// error list. Returns `None` for `Ok` results.
    pub fn to_diagnostic(&self) -> Option<Diagnostic> {
        match self {
            BuilderResult::Ok { .. } => None,
            BuilderResult::Err {
                code,
                message,
                dependencies,
            } => {
                let mut d = Diagnostic::new(DiagLevel::Error, message.clone()).with_code(code.diag_code());
                if let Some(deps) = dependencies {
                    d = d.with_field("extra", deps.join(", "));
                }
                Some(d)
            }
        }
    }
}

impl<T> fmt::Display for BuilderResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuilderResult::Ok { id, .. } => write!(f, "BuilderResult(success=true, id={id})"),
            BuilderResult::Err { message, .. } => {
                write!(f, "BuilderResult(success=false, error={message})")
            }
        }
    }
}
