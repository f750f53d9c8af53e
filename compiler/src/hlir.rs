// hlir.rs — High-Level IR core model (spec §3.2)
//
// Typed, cross-referenced entity structs plus the `Program` container that
// owns them. This is the canonical in-memory representation: both the
// builder API and the GUI-XML loader converge here.
//
// Preconditions: entities are constructed via `builder::ProgramBuilder`,
//   which enforces registration/naming invariants as they are added.
// Postconditions: `Program::validate` re-checks every cross-entity
//   invariant exhaustively, for programs assembled by any path (builder,
//   GUI-XML loader, hand-built for tests).
// Failure modes: `validate` returns `Diagnostic`s, never panics.
// Side effects: none.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::diag::{codes, DiagLevel, Diagnostic};
use crate::types::{DimExpr, TypeRef};

// ── Ordered name map ─────────────────────────────────────────────────────────

/// A name-keyed map that preserves insertion order, since several spec
/// invariants (worker start order, fill/drain order, symbol emission order)
/// depend on it and a plain `HashMap` cannot provide that.
#[derive(Debug, Clone)]
pub struct NameMap<T> {
    order: Vec<String>,
    items: HashMap<String, T>,
}

impl<T> Default for NameMap<T> {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            items: HashMap::new(),
        }
    }
}

impl<T> NameMap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace. Replacing preserves the original position.
    pub fn insert(&mut self, name: impl Into<String>, value: T) {
        let name = name.into();
        if !self.items.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.items.insert(name, value);
    }

    pub fn remove(&mut self, name: &str) -> Option<T> {
        if let Some(pos) = self.order.iter().position(|n| n == name) {
            self.order.remove(pos);
        }
        self.items.remove(name)
    }

    /// Rename an existing entry, preserving its position.
    pub fn rename(&mut self, old: &str, new: impl Into<String>) {
        let new = new.into();
        if let Some(pos) = self.order.iter().position(|n| n == old) {
            self.order[pos] = new.clone();
        }
        if let Some(v) = self.items.remove(old) {
            self.items.insert(new, v);
        }
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.items.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut T> {
        self.items.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.items.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.order.iter().map(move |n| (n.as_str(), &self.items[n]))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }
}

// ── Symbol ───────────────────────────────────────────────────────────────────

/// The value carried by a `Symbol`. Split/Join/Forward operations are
/// represented as symbols wrapping the operation (spec §3.2).
#[derive(Debug, Clone)]
pub enum SymbolValue {
    Int(i64),
    Float(f64),
    Str(String),
    TensorType(crate::types::TensorType),
    Split(SplitOperation),
    Join(JoinOperation),
    Forward(ForwardOperation),
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub value: SymbolValue,
    pub type_hint: Option<TypeRef>,
    pub is_constant: bool,
}

// ── Tile ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileKind {
    Shim,
    Mem,
    Compute,
}

impl TileKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "shim" => Some(TileKind::Shim),
            "mem" => Some(TileKind::Mem),
            "compute" => Some(TileKind::Compute),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TileKind::Shim => "shim",
            TileKind::Mem => "mem",
            TileKind::Compute => "compute",
        }
    }
}

impl fmt::Display for TileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Tile {
    pub name: String,
    pub kind: TileKind,
    pub x: i64,
    pub y: i64,
    pub metadata: BTreeMap<String, String>,
}

// ── ObjectFifo ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ObjectFifo {
    pub name: String,
    pub obj_type: TypeRef,
    pub depth: u32,
    pub producer: Option<String>,
    pub consumers: Vec<String>,
    pub metadata: BTreeMap<String, String>,
}

// ── Split / Join / Forward ───────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SplitOperation {
    pub name: String,
    pub source: String,
    pub num_outputs: usize,
    pub output_types: Vec<TypeRef>,
    pub output_names: Vec<String>,
    pub offsets: Vec<DimExpr>,
    pub placement: Option<String>,
}

#[derive(Debug, Clone)]
pub struct JoinOperation {
    pub name: String,
    pub dest: String,
    pub num_inputs: usize,
    pub input_types: Vec<TypeRef>,
    pub input_names: Vec<String>,
    pub offsets: Vec<DimExpr>,
    pub placement: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ForwardOperation {
    pub name: String,
    pub source: String,
    pub placement: Option<String>,
}

// ── ExternalKernel ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ExternalKernel {
    pub name: String,
    pub symbol: String,
    pub source_file: String,
    pub arg_types: Vec<TypeRef>,
    pub include_dirs: Vec<String>,
}

// ── CoreFunction ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum CoreStmt {
    Acquire { param: String, var: String },
    Release { param: String },
    KernelCall { kernel: String, args: Vec<String> },
    For { var: String, range: String, body: Vec<CoreStmt> },
    Assign { target: String, value: String },
}

#[derive(Debug, Clone)]
pub struct CoreFunction {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<CoreStmt>,
    pub loop_count: Option<String>,
}

// ── Worker ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FifoMode {
    Producer,
    Consumer,
}

#[derive(Debug, Clone)]
pub struct FifoBinding {
    pub fifo_ref: String,
    pub mode: FifoMode,
    pub index: Option<u32>,
}

#[derive(Debug, Clone)]
pub enum WorkerArg {
    Fifo(FifoBinding),
    Symbol(String),
}

#[derive(Debug, Clone)]
pub struct Worker {
    pub name: String,
    pub core_fn: String,
    pub fn_args: Vec<WorkerArg>,
    pub placement: String,
}

// ── Runtime ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct TensorAccessPattern {
    pub tensor_dims: Vec<DimExpr>,
    pub offset: Vec<DimExpr>,
    pub sizes: Vec<DimExpr>,
    pub strides: Vec<DimExpr>,
}

#[derive(Debug, Clone)]
pub struct RuntimeFill {
    pub placement: String,
    pub fifo_ref: String,
    pub host_param: String,
    pub tap: Option<TensorAccessPattern>,
}

#[derive(Debug, Clone)]
pub struct RuntimeDrain {
    pub placement: String,
    pub fifo_ref: String,
    pub host_param: String,
    pub tap: Option<TensorAccessPattern>,
    pub wait: bool,
}

#[derive(Debug, Clone)]
pub enum SequenceOp {
    Fill(RuntimeFill),
    Drain(RuntimeDrain),
}

#[derive(Debug, Clone)]
pub struct TensorTiler2DSpec {
    pub name: String,
    pub tensor_dims: Vec<DimExpr>,
    pub tile_dims: Vec<DimExpr>,
    pub tile_counts: Vec<DimExpr>,
    pub pattern_repeat: Option<DimExpr>,
    pub prune_step: bool,
    pub index: u32,
}

#[derive(Debug, Clone)]
pub struct RuntimeSequence {
    pub name: String,
    pub input_types: Vec<TypeRef>,
    pub output_types: Vec<TypeRef>,
    pub param_names: Vec<String>,
    pub start_workers: Vec<String>,
    pub ops: Vec<SequenceOp>,
}

// ── Program ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct Program {
    pub name: String,
    pub symbols: NameMap<Symbol>,
    pub tiles: NameMap<Tile>,
    pub fifos: NameMap<ObjectFifo>,
    pub external_kernels: NameMap<ExternalKernel>,
    pub core_functions: NameMap<CoreFunction>,
    pub workers: NameMap<Worker>,
    pub tensor_tilers: NameMap<TensorTiler2DSpec>,
    pub runtime: Option<RuntimeSequence>,
    pub metadata: BTreeMap<String, String>,
}

impl Program {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Resolve a FIFO-like reference: a declared FIFO, or a symbol wrapping
    /// a Split/Join/Forward operation, by name (spec §3.2 cross-entity rule).
    pub fn resolve_fifo_like(&self, name: &str) -> bool {
        if self.fifos.contains(name) {
            return true;
        }
        matches!(
            self.symbols.get(name).map(|s| &s.value),
            Some(SymbolValue::Split(_)) | Some(SymbolValue::Join(_)) | Some(SymbolValue::Forward(_))
        )
    }

    /// Exhaustively re-check every cross-entity invariant in spec §3.2/§8.
    pub fn validate(&self) -> Vec<Diagnostic> {
        let mut diags = Vec::new();

        // Every FIFO reference inside a Worker must resolve.
        for (wname, w) in self.workers.iter() {
            if !self.tiles.contains(&w.placement) {
                diags.push(
                    Diagnostic::new(
                        DiagLevel::Error,
                        format!("worker '{wname}' placement references unknown tile '{}'", w.placement),
                    )
                    .with_code(codes::IR002)
                    .with_field("name", wname.to_string()),
                );
            }
            if !self.core_functions.contains(&w.core_fn) {
                diags.push(
                    Diagnostic::new(
                        DiagLevel::Error,
                        format!("worker '{wname}' core_fn references unknown core function '{}'", w.core_fn),
                    )
                    .with_code(codes::IR002)
                    .with_field("name", wname.to_string()),
                );
            }
            for arg in &w.fn_args {
                if let WorkerArg::Fifo(binding) = arg {
                    if !self.resolve_fifo_like(&binding.fifo_ref) {
                        diags.push(
                            Diagnostic::new(
                                DiagLevel::Error,
                                format!(
                                    "worker '{wname}' fn_args references unknown FIFO '{}'",
                                    binding.fifo_ref
                                ),
                            )
                            .with_code(codes::IR002)
                            .with_field("name", wname.to_string()),
                        );
                    }
                }
            }
        }

        // Split/Join list-length agreement.
        for (sname, s) in self.symbols.iter() {
            match &s.value {
                SymbolValue::Split(op) => {
                    if op.output_names.len() != op.num_outputs
                        || op.output_types.len() != op.num_outputs
                        || op.offsets.len() != op.num_outputs
                    {
                        diags.push(
                            Diagnostic::new(
                                DiagLevel::Error,
                                format!(
                                    "split '{sname}' list-length mismatch: num_outputs={}, names={}, types={}, offsets={}",
                                    op.num_outputs,
                                    op.output_names.len(),
                                    op.output_types.len(),
                                    op.offsets.len()
                                ),
                            )
                            .with_code(codes::IR001)
                            .with_field("symbol", sname.to_string()),
                        );
                    }
                    if !self.resolve_fifo_like(&op.source) {
                        diags.push(
                            Diagnostic::new(
                                DiagLevel::Error,
                                format!("split '{sname}' source references unknown FIFO '{}'", op.source),
                            )
                            .with_code(codes::IR002)
                            .with_field("symbol", sname.to_string()),
                        );
                    }
                }
                SymbolValue::Join(op) => {
                    if op.input_names.len() != op.num_inputs
                        || op.input_types.len() != op.num_inputs
                        || op.offsets.len() != op.num_inputs
                    {
                        diags.push(
                            Diagnostic::new(
                                DiagLevel::Error,
                                format!(
                                    "join '{sname}' list-length mismatch: num_inputs={}, names={}, types={}, offsets={}",
                                    op.num_inputs,
                                    op.input_names.len(),
                                    op.input_types.len(),
                                    op.offsets.len()
                                ),
                            )
                            .with_code(codes::IR001)
                            .with_field("symbol", sname.to_string()),
                        );
                    }
                    if !self.resolve_fifo_like(&op.dest) {
                        diags.push(
                            Diagnostic::new(
                                DiagLevel::Error,
                                format!("join '{sname}' dest references unknown FIFO '{}'", op.dest),
                            )
                            .with_code(codes::IR002)
                            .with_field("symbol", sname.to_string()),
                        );
                    }
                }
                SymbolValue::Forward(op) => {
                    if !self.resolve_fifo_like(&op.source) {
                        diags.push(
                            Diagnostic::new(
                                DiagLevel::Error,
                                format!("forward '{sname}' source references unknown FIFO '{}'", op.source),
                            )
                            .with_code(codes::IR002)
                            .with_field("symbol", sname.to_string()),
                        );
                    }
                }
                _ => {}
            }
        }

        // FIFO producer/consumer tile references.
        for (fname, fifo) in self.fifos.iter() {
            if let Some(producer) = &fifo.producer {
                if !self.tiles.contains(producer) {
                    diags.push(
                        Diagnostic::new(
                            DiagLevel::Error,
                            format!("fifo '{fname}' producer references unknown tile '{producer}'"),
                        )
                        .with_code(codes::IR002)
                        .with_field("name", fname.to_string()),
                    );
                }
            }
            for consumer in &fifo.consumers {
                if !self.tiles.contains(consumer) {
                    diags.push(
                        Diagnostic::new(
                            DiagLevel::Error,
                            format!("fifo '{fname}' consumer references unknown tile '{consumer}'"),
                        )
                        .with_code(codes::IR002)
                        .with_field("name", fname.to_string()),
                    );
                }
            }
        }

        // Core function parameter coverage: any parameter referenced by
        // Acquire/Release must exist in `params`.
        for (cname, cf) in self.core_functions.iter() {
            check_stmts(&cf.body, &cf.params, cname, &mut diags);
        }

        // RuntimeSequence: worker/FIFO/tile references.
        if let Some(rt) = &self.runtime {
            for wname in &rt.start_workers {
                if !self.workers.contains(wname) {
                    diags.push(
                        Diagnostic::new(
                            DiagLevel::Error,
                            format!("runtime sequence starts unknown worker '{wname}'"),
                        )
                        .with_code(codes::IR002)
                        .with_field("name", wname.to_string()),
                    );
                }
            }
            for op in &rt.ops {
                let (placement, fifo_ref) = match op {
                    SequenceOp::Fill(f) => (&f.placement, &f.fifo_ref),
                    SequenceOp::Drain(d) => (&d.placement, &d.fifo_ref),
                };
                if !self.tiles.contains(placement) {
                    diags.push(
                        Diagnostic::new(
                            DiagLevel::Error,
                            format!("runtime op placement references unknown tile '{placement}'"),
                        )
                        .with_code(codes::IR002),
                    );
                }
                if !self.resolve_fifo_like(fifo_ref) {
                    diags.push(
                        Diagnostic::new(
                            DiagLevel::Error,
                            format!("runtime op references unknown FIFO '{fifo_ref}'"),
                        )
                        .with_code(codes::IR002),
                    );
                }
            }
        }

        diags
    }
}

fn check_stmts(stmts: &[CoreStmt], params: &[String], fn_name: &str, diags: &mut Vec<Diagnostic>) {
    for stmt in stmts {
        match stmt {
            CoreStmt::Acquire { param, .. } | CoreStmt::Release { param } => {
                if !params.iter().any(|p| p == param) {
                    diags.push(
                        Diagnostic::new(
                            DiagLevel::Error,
                            format!(
                                "core function '{fn_name}' acquire/release references undeclared parameter '{param}'"
                            ),
                        )
                        .with_code(codes::IR001)
                        .with_field("name", fn_name.to_string()),
                    );
                }
            }
            CoreStmt::For { body, .. } => check_stmts(body, params, fn_name, diags),
            CoreStmt::KernelCall { .. } | CoreStmt::Assign { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScalarKind;

    fn sample_program() -> Program {
        let mut p = Program::new("passthrough");
        p.tiles.insert(
            "shim0",
            Tile {
                name: "shim0".into(),
                kind: TileKind::Shim,
                x: 0,
                y: 0,
                metadata: BTreeMap::new(),
            },
        );
        p.fifos.insert(
            "of_in",
            ObjectFifo {
                name: "of_in".into(),
                obj_type: TypeRef::Scalar(ScalarKind::Int32),
                depth: 2,
                producer: Some("shim0".into()),
                consumers: vec![],
                metadata: BTreeMap::new(),
            },
        );
        p
    }

    #[test]
    fn valid_program_has_no_diagnostics() {
        let p = sample_program();
        assert!(p.validate().is_empty());
    }

    #[test]
    fn dangling_fifo_producer_is_flagged() {
        let mut p = sample_program();
        p.fifos.get_mut("of_in").unwrap().producer = Some("missing_tile".into());
        let diags = p.validate();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, Some(codes::IR002));
    }

    #[test]
    fn split_list_length_mismatch_is_flagged() {
        let mut p = sample_program();
        p.symbols.insert(
            "split0",
            Symbol {
                name: "split0".into(),
                value: SymbolValue::Split(SplitOperation {
                    name: "split0".into(),
                    source: "of_in".into(),
                    num_outputs: 2,
                    output_types: vec![TypeRef::Scalar(ScalarKind::Int32)],
                    output_names: vec!["a".into(), "b".into()],
                    offsets: vec![DimExpr::Literal(0), DimExpr::Literal(1)],
                    placement: None,
                }),
                type_hint: None,
                is_constant: false,
            },
        );
        let diags = p.validate();
        assert!(diags.iter().any(|d| d.code == Some(codes::IR001)));
    }

    #[test]
    fn name_map_preserves_insertion_order_across_rename() {
        let mut m: NameMap<i32> = NameMap::new();
        m.insert("a", 1);
        m.insert("b", 2);
        m.insert("c", 3);
        m.rename("b", "bb");
        let names: Vec<&str> = m.names().collect();
        assert_eq!(names, vec!["a", "bb", "c"]);
    }
}
