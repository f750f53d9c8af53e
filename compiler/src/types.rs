// types.rs — Scalar and tensor type descriptors (spec §3.1)
//
// Preconditions: none (data-only module, plus pure helper functions).
// Postconditions: none.
// Failure modes: none.
// Side effects: none.

use std::fmt;

// ── ScalarKind ──────────────────────────────────────────────────────────────

/// A scalar element kind, drawn from the fixed set spec §3.1 enumerates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float16,
    Float32,
    Float64,
    Bfloat16,
}

impl ScalarKind {
    /// Parse the authoring-format spelling used in GUI/Complete XML `<dtype>`.
    pub fn parse(s: &str) -> Option<Self> {
        use ScalarKind::*;
        Some(match s {
            "int8" => Int8,
            "int16" => Int16,
            "int32" => Int32,
            "int64" => Int64,
            "uint8" => Uint8,
            "uint16" => Uint16,
            "uint32" => Uint32,
            "uint64" => Uint64,
            "float16" => Float16,
            "float32" => Float32,
            "float64" => Float64,
            "bfloat16" => Bfloat16,
            _ => return None,
        })
    }

    /// The `numpy`/`ml_dtypes` token the code generator emits (e.g. `np.int32`).
    pub fn numpy_token(self) -> &'static str {
        use ScalarKind::*;
        match self {
            Int8 => "np.int8",
            Int16 => "np.int16",
            Int32 => "np.int32",
            Int64 => "np.int64",
            Uint8 => "np.uint8",
            Uint16 => "np.uint16",
            Uint32 => "np.uint32",
            Uint64 => "np.uint64",
            Float16 => "np.float16",
            Float32 => "np.float32",
            Float64 => "np.float64",
            Bfloat16 => "bfloat16",
        }
    }

    /// The authoring-format spelling this was parsed from.
    pub fn source_token(self) -> &'static str {
        use ScalarKind::*;
        match self {
            Int8 => "int8",
            Int16 => "int16",
            Int32 => "int32",
            Int64 => "int64",
            Uint8 => "uint8",
            Uint16 => "uint16",
            Uint32 => "uint32",
            Uint64 => "uint64",
            Float16 => "float16",
            Float32 => "float32",
            Float64 => "float64",
            Bfloat16 => "bfloat16",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source_token())
    }
}

// ── DimExpr ─────────────────────────────────────────────────────────────────

/// A single tensor dimension: either a concrete non-negative integer, or a
/// free-form textual expression (`"N"`, `"N / 16"`, `"n_cores * m * k"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DimExpr {
    Literal(u64),
    Symbolic(String),
}

impl DimExpr {
    pub fn is_symbolic(&self) -> bool {
        matches!(self, DimExpr::Symbolic(_))
    }

    /// The textual form used when serializing to GUI/Complete XML.
    pub fn source_text(&self) -> String {
        match self {
            DimExpr::Literal(n) => n.to_string(),
            DimExpr::Symbolic(s) => s.clone(),
        }
    }

    /// Parse a shape-dimension token: an integer literal if it parses as one,
    /// otherwise a symbolic expression carried through verbatim.
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();
        match trimmed.parse::<u64>() {
            Ok(n) => DimExpr::Literal(n),
            Err(_) => DimExpr::Symbolic(trimmed.to_string()),
        }
    }
}

impl fmt::Display for DimExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source_text())
    }
}

// ── TensorType ──────────────────────────────────────────────────────────────

/// An ordered sequence of dimension expressions plus an element kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorType {
    pub dims: Vec<DimExpr>,
    pub scalar: ScalarKind,
    pub layout: Option<String>,
}

impl TensorType {
    pub fn new(dims: Vec<DimExpr>, scalar: ScalarKind) -> Self {
        Self {
            dims,
            scalar,
            layout: None,
        }
    }

    pub fn with_layout(mut self, layout: impl Into<String>) -> Self {
        self.layout = Some(layout.into());
        self
    }

    /// A type is symbolic if any dimension is a textual expression.
    pub fn is_symbolic(&self) -> bool {
        self.dims.iter().any(DimExpr::is_symbolic)
    }
}

impl fmt::Display for TensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dims: Vec<String> = self.dims.iter().map(|d| d.source_text()).collect();
        write!(f, "ndarray[{}, {}]", dims.join(", "), self.scalar)
    }
}

// ── TypeRef ─────────────────────────────────────────────────────────────────

/// Either an embedded tensor type, a bare scalar kind, or a name that
/// resolves against the program's type symbol table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Tensor(TensorType),
    Scalar(ScalarKind),
    Named(String),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named(name.into())
    }

    /// The name used to resolve this reference, if it is a named reference.
    pub fn name(&self) -> Option<&str> {
        match self {
            TypeRef::Named(n) => Some(n),
            _ => None,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Tensor(t) => write!(f, "{t}"),
            TypeRef::Scalar(s) => write!(f, "{s}"),
            TypeRef::Named(n) => write!(f, "{n}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dim_expr_parses_literal_vs_symbolic() {
        assert_eq!(DimExpr::parse("128"), DimExpr::Literal(128));
        assert_eq!(DimExpr::parse("N"), DimExpr::Symbolic("N".to_string()));
        assert_eq!(
            DimExpr::parse("N / 16"),
            DimExpr::Symbolic("N / 16".to_string())
        );
    }

    #[test]
    fn tensor_type_symbolic_iff_any_dim_symbolic() {
        let concrete = TensorType::new(vec![DimExpr::Literal(4), DimExpr::Literal(8)], ScalarKind::Int32);
        assert!(!concrete.is_symbolic());

        let symbolic = TensorType::new(
            vec![DimExpr::Literal(4), DimExpr::Symbolic("N".into())],
            ScalarKind::Int32,
        );
        assert!(symbolic.is_symbolic());
    }

    #[test]
    fn scalar_kind_round_trips_through_source_token() {
        for kind in [
            ScalarKind::Int8,
            ScalarKind::Bfloat16,
            ScalarKind::Float64,
            ScalarKind::Uint32,
        ] {
            assert_eq!(ScalarKind::parse(kind.source_token()), Some(kind));
        }
    }
}
