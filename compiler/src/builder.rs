// builder.rs — Fluent program construction API (spec §4.2, §4.3)
//
// `ProgramBuilder` wraps a `Program` plus an `IdRegistry`, giving every
// added component a stable id. Adding a name that already exists (without
// a `provided_id`) reports `ErrorCode::DuplicateName` rather than
// silently shadowing it; adding with a `provided_id` that already exists
// updates the component in place instead of allocating a new id (the
// three-branch rule from the original `_register_component`: update,
// adopt-as-new, or reject-as-duplicate).
//
// Preconditions: none beyond what each method documents.
// Postconditions: every successful `add_*`/`update_*` call leaves
//   `self.program` and `self.registry` consistent with each other.
// Failure modes: all reported through `BuilderResult`, never a panic.
// Side effects: none beyond mutating `self`.

use std::collections::BTreeMap;

use crate::builder_result::{BuilderResult, ErrorCode};
use crate::diag::Diagnostic;
use crate::hlir::{
    CoreFunction, ExternalKernel, FifoBinding, FifoMode, ForwardOperation, JoinOperation, ObjectFifo,
    Program, RuntimeDrain, RuntimeFill, RuntimeSequence, SequenceOp, SplitOperation, Symbol, SymbolValue,
    TensorAccessPattern, Tile, TileKind, Worker, WorkerArg,
};
use crate::id::EntityId;
use crate::registry::{IdRegistry, Namespace};
use crate::types::TypeRef;

/// Fluent builder for constructing an AIECAD `Program`.
pub struct ProgramBuilder {
    program: Program,
    registry: IdRegistry,
    slot_counters: BTreeMap<Namespace, usize>,
}

impl ProgramBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            program: Program::new(name),
            registry: IdRegistry::new(),
            slot_counters: BTreeMap::new(),
        }
    }

    fn next_slot(&mut self, ns: Namespace) -> usize {
        let counter = self.slot_counters.entry(ns).or_insert(0);
        let slot = *counter;
        *counter += 1;
        slot
    }

    /// Implements the provided_id three-branch rule: update in place if the
    /// id exists, adopt the id as new if it doesn't, allocate fresh if no
    /// id was supplied, or report a duplicate-name error.
    fn register(
        &mut self,
        ns: Namespace,
        name: &str,
        provided_id: Option<EntityId>,
        type_label: &str,
    ) -> Result<EntityId, BuilderResult<()>> {
        if let Some(id) = provided_id {
            let slot = self.next_slot(ns);
            self.registry.register_with_provided_id(id, ns, name, slot);
            return Ok(id);
        }
        if let Some(existing) = self.registry.lookup_by_name(ns, name) {
            return Err(BuilderResult::duplicate(type_label, name, existing));
        }
        let slot = self.next_slot(ns);
        Ok(self.registry.register_new(ns, name, slot))
    }

    pub fn add_symbol(
        &mut self,
        name: impl Into<String>,
        value: SymbolValue,
        type_hint: Option<TypeRef>,
        is_constant: bool,
        provided_id: Option<EntityId>,
    ) -> BuilderResult<Symbol> {
        let name = name.into();
        let id = match self.register(Namespace::Symbol, &name, provided_id, "symbol") {
            Ok(id) => id,
            Err(e) => return e.map_component(),
        };
        let symbol = Symbol {
            name: name.clone(),
            value,
            type_hint,
            is_constant,
        };
        self.program.symbols.insert(name, symbol.clone());
        BuilderResult::ok(id, symbol)
    }

    pub fn add_constant(
        &mut self,
        name: impl Into<String>,
        value: SymbolValue,
        type_hint: Option<TypeRef>,
        provided_id: Option<EntityId>,
    ) -> BuilderResult<Symbol> {
        self.add_symbol(name, value, type_hint, true, provided_id)
    }

    pub fn add_tile(
        &mut self,
        name: impl Into<String>,
        kind: TileKind,
        x: i64,
        y: i64,
        metadata: BTreeMap<String, String>,
        provided_id: Option<EntityId>,
    ) -> BuilderResult<Tile> {
        let name = name.into();
        let id = match self.register(Namespace::Tile, &name, provided_id, "tile") {
            Ok(id) => id,
            Err(e) => return e.map_component(),
        };
        let tile = Tile {
            name: name.clone(),
            kind,
            x,
            y,
            metadata,
        };
        self.program.tiles.insert(name, tile.clone());
        BuilderResult::ok(id, tile)
    }

    pub fn add_fifo(
        &mut self,
        name: impl Into<String>,
        obj_type: TypeRef,
        depth: u32,
        producer: Option<String>,
        consumers: Vec<String>,
        metadata: BTreeMap<String, String>,
        provided_id: Option<EntityId>,
    ) -> BuilderResult<ObjectFifo> {
        let name = name.into();
        let id = match self.register(Namespace::ObjectFifo, &name, provided_id, "fifo") {
            Ok(id) => id,
            Err(e) => return e.map_component(),
        };
        let fifo = ObjectFifo {
            name: name.clone(),
            obj_type,
            depth,
            producer,
            consumers,
            metadata,
        };
        self.program.fifos.insert(name, fifo.clone());
        BuilderResult::ok(id, fifo)
    }

    pub fn add_fifo_split(
        &mut self,
        name: impl Into<String>,
        source: impl Into<String>,
        num_outputs: usize,
        output_types: Vec<TypeRef>,
        output_names: Vec<String>,
        offsets: Vec<crate::types::DimExpr>,
        placement: Option<String>,
        provided_id: Option<EntityId>,
    ) -> BuilderResult<SplitOperation> {
        let name = name.into();
        let id = match self.register(Namespace::Symbol, &name, provided_id, "fifo_split") {
            Ok(id) => id,
            Err(e) => return e.map_component(),
        };
        let op = SplitOperation {
            name: name.clone(),
            source: source.into(),
            num_outputs,
            output_types,
            output_names,
            offsets,
            placement,
        };
        self.program.symbols.insert(
            name.clone(),
            Symbol {
                name,
                value: SymbolValue::Split(op.clone()),
                type_hint: None,
                is_constant: false,
            },
        );
        BuilderResult::ok(id, op)
    }

    pub fn add_fifo_join(
        &mut self,
        name: impl Into<String>,
        dest: impl Into<String>,
        num_inputs: usize,
        input_types: Vec<TypeRef>,
        input_names: Vec<String>,
        offsets: Vec<crate::types::DimExpr>,
        placement: Option<String>,
        provided_id: Option<EntityId>,
    ) -> BuilderResult<JoinOperation> {
        let name = name.into();
        let id = match self.register(Namespace::Symbol, &name, provided_id, "fifo_join") {
            Ok(id) => id,
            Err(e) => return e.map_component(),
        };
        let op = JoinOperation {
            name: name.clone(),
            dest: dest.into(),
            num_inputs,
            input_types,
            input_names,
            offsets,
            placement,
        };
        self.program.symbols.insert(
            name.clone(),
            Symbol {
                name,
                value: SymbolValue::Join(op.clone()),
                type_hint: None,
                is_constant: false,
            },
        );
        BuilderResult::ok(id, op)
    }

    pub fn add_fifo_forward(
        &mut self,
        name: impl Into<String>,
        source: impl Into<String>,
        placement: Option<String>,
        provided_id: Option<EntityId>,
    ) -> BuilderResult<ForwardOperation> {
        let name = name.into();
        let id = match self.register(Namespace::Symbol, &name, provided_id, "fifo_forward") {
            Ok(id) => id,
            Err(e) => return e.map_component(),
        };
        let op = ForwardOperation {
            name: name.clone(),
            source: source.into(),
            placement,
        };
        self.program.symbols.insert(
            name.clone(),
            Symbol {
                name,
                value: SymbolValue::Forward(op.clone()),
                type_hint: None,
                is_constant: false,
            },
        );
        BuilderResult::ok(id, op)
    }

    pub fn add_external_kernel(
        &mut self,
        name: impl Into<String>,
        symbol: impl Into<String>,
        source_file: impl Into<String>,
        arg_types: Vec<TypeRef>,
        include_dirs: Vec<String>,
        provided_id: Option<EntityId>,
    ) -> BuilderResult<ExternalKernel> {
        let name = name.into();
        let id = match self.register(Namespace::ExternalKernel, &name, provided_id, "external_kernel") {
            Ok(id) => id,
            Err(e) => return e.map_component(),
        };
        let kernel = ExternalKernel {
            name: name.clone(),
            symbol: symbol.into(),
            source_file: source_file.into(),
            arg_types,
            include_dirs,
        };
        self.program.external_kernels.insert(name, kernel.clone());
        BuilderResult::ok(id, kernel)
    }

    pub fn add_core_function(
        &mut self,
        name: impl Into<String>,
        params: Vec<String>,
        body: Vec<crate::hlir::CoreStmt>,
        loop_count: Option<String>,
        provided_id: Option<EntityId>,
    ) -> BuilderResult<CoreFunction> {
        let name = name.into();
        let id = match self.register(Namespace::CoreFunction, &name, provided_id, "core_function") {
            Ok(id) => id,
            Err(e) => return e.map_component(),
        };
        let func = CoreFunction {
            name: name.clone(),
            params,
            body,
            loop_count,
        };
        self.program.core_functions.insert(name, func.clone());
        BuilderResult::ok(id, func)
    }

    pub fn add_worker(
        &mut self,
        name: impl Into<String>,
        core_fn: impl Into<String>,
        fn_args: Vec<WorkerArg>,
        placement: impl Into<String>,
        provided_id: Option<EntityId>,
    ) -> BuilderResult<Worker> {
        let name = name.into();
        let id = match self.register(Namespace::Worker, &name, provided_id, "worker") {
            Ok(id) => id,
            Err(e) => return e.map_component(),
        };
        let worker = Worker {
            name: name.clone(),
            core_fn: core_fn.into(),
            fn_args,
            placement: placement.into(),
        };
        self.program.workers.insert(name, worker.clone());
        BuilderResult::ok(id, worker)
    }

    /// What would block removal of `id`: the set of human-readable
    /// dependents, empty if removal is safe.
    fn dependents_of(&self, ns: Namespace, name: &str) -> Vec<String> {
        let mut deps = Vec::new();
        match ns {
            Namespace::Symbol => {
                for (fname, fifo) in self.program.fifos.iter() {
                    if fifo.obj_type.name() == Some(name) {
                        deps.push(format!("FIFO '{fname}'"));
                    }
                }
                for (kname, kernel) in self.program.external_kernels.iter() {
                    if kernel.arg_types.iter().any(|t| t.name() == Some(name)) {
                        deps.push(format!("ExternalKernel '{kname}'"));
                    }
                }
            }
            Namespace::Tile => {
                for (wname, w) in self.program.workers.iter() {
                    if w.placement == name {
                        deps.push(format!("Worker '{wname}'"));
                    }
                }
            }
            Namespace::ObjectFifo => {
                for (wname, w) in self.program.workers.iter() {
                    for arg in &w.fn_args {
                        if let WorkerArg::Fifo(b) = arg {
                            if b.fifo_ref == name {
                                deps.push(format!("Worker '{wname}'"));
                                break;
                            }
                        }
                    }
                }
            }
            Namespace::CoreFunction => {
                for (wname, w) in self.program.workers.iter() {
                    if w.core_fn == name {
                        deps.push(format!("Worker '{wname}'"));
                    }
                }
            }
            Namespace::Worker => {
                if let Some(rt) = &self.program.runtime {
                    if rt.start_workers.iter().any(|w| w == name) {
                        deps.push(format!("Runtime '{}'", rt.name));
                    }
                }
            }
            Namespace::ExternalKernel => {
                // A CoreFunction's first parameter is always its kernel
                // binding (gui_serializer.py assigns role
                // "external_function" to parameter index 0), so a Worker
                // depends on an ExternalKernel through the first entry of
                // its fn_args.
                for (wname, w) in self.program.workers.iter() {
                    if let Some(WorkerArg::Symbol(s)) = w.fn_args.first() {
                        if s == name {
                            deps.push(format!("Worker '{wname}'"));
                        }
                    }
                }
            }
            _ => {}
        }
        deps
    }

    /// Remove a component by name, failing with `DependencyExists` if
    /// anything still references it.
    pub fn remove(&mut self, ns: Namespace, name: &str) -> BuilderResult<()> {
        let Some(id) = self.registry.lookup_by_name(ns, name) else {
            return BuilderResult::error(ErrorCode::NotFound, format!("{ns} '{name}' not found"));
        };
        let deps = self.dependents_of(ns, name);
        if !deps.is_empty() {
            return BuilderResult::has_dependencies(id, &ns.to_string(), deps);
        }
        self.registry.remove(id);
        match ns {
            Namespace::Symbol => {
                self.program.symbols.remove(name);
            }
            Namespace::Tile => {
                self.program.tiles.remove(name);
            }
            Namespace::ObjectFifo => {
                self.program.fifos.remove(name);
            }
            Namespace::ExternalKernel => {
                self.program.external_kernels.remove(name);
            }
            Namespace::CoreFunction => {
                self.program.core_functions.remove(name);
            }
            Namespace::Worker => {
                self.program.workers.remove(name);
            }
            Namespace::TensorTiler => {
                self.program.tensor_tilers.remove(name);
            }
            Namespace::RuntimeSequence => {
                self.program.runtime = None;
            }
        }
        BuilderResult::ok(id, ())
    }

    pub fn create_runtime(self, name: impl Into<String>) -> RuntimeBuilder {
        RuntimeBuilder {
            prog: self,
            runtime: RuntimeSequence {
                name: name.into(),
                input_types: Vec::new(),
                output_types: Vec::new(),
                param_names: Vec::new(),
                start_workers: Vec::new(),
                ops: Vec::new(),
            },
        }
    }

    pub fn set_runtime(&mut self, runtime: RuntimeSequence) {
        self.program.runtime = Some(runtime);
    }

    /// Validate and return the finished program, or the aggregated
    /// validation diagnostics if it is inconsistent.
    pub fn build(self) -> Result<Program, Vec<Diagnostic>> {
        let diags = self.program.validate();
        if diags.is_empty() {
            Ok(self.program)
        } else {
            Err(diags)
        }
    }

    /// The in-progress program, without running validation.
    pub fn program(&self) -> &Program {
        &self.program
    }
}

/// Fluent builder for a program's single `RuntimeSequence`.
pub struct RuntimeBuilder {
    prog: ProgramBuilder,
    runtime: RuntimeSequence,
}

impl RuntimeBuilder {
    pub fn add_input_type(mut self, ty: TypeRef) -> Self {
        self.runtime.input_types.push(ty);
        self
    }

    pub fn add_output_type(mut self, ty: TypeRef) -> Self {
        self.runtime.output_types.push(ty);
        self
    }

    pub fn add_params(mut self, names: Vec<String>) -> Self {
        self.runtime.param_names = names;
        self
    }

    pub fn add_worker(mut self, worker: impl Into<String>) -> Self {
        self.runtime.start_workers.push(worker.into());
        self
    }

    pub fn add_fill(mut self, placement: impl Into<String>, fifo_ref: impl Into<String>, host_param: impl Into<String>, tap: Option<TensorAccessPattern>) -> Self {
        self.runtime.ops.push(SequenceOp::Fill(RuntimeFill {
            placement: placement.into(),
            fifo_ref: fifo_ref.into(),
            host_param: host_param.into(),
            tap,
        }));
        self
    }

    pub fn add_drain(
        mut self,
        placement: impl Into<String>,
        fifo_ref: impl Into<String>,
        host_param: impl Into<String>,
        wait: bool,
        tap: Option<TensorAccessPattern>,
    ) -> Self {
        self.runtime.ops.push(SequenceOp::Drain(RuntimeDrain {
            placement: placement.into(),
            fifo_ref: fifo_ref.into(),
            host_param: host_param.into(),
            tap,
            wait,
        }));
        self
    }

    /// Attach the runtime sequence to the parent program and return it.
    pub fn build(mut self) -> ProgramBuilder {
        self.prog.set_runtime(self.runtime);
        self.prog
    }
}

/// Convenience constructor so callers don't need to reach into `hlir`
/// directly for the common case of binding a FIFO argument.
pub fn fifo_arg(fifo_ref: impl Into<String>, mode: FifoMode, index: Option<u32>) -> WorkerArg {
    WorkerArg::Fifo(FifoBinding {
        fifo_ref: fifo_ref.into(),
        mode,
        index,
    })
}

impl<T> BuilderResult<T> {
    /// Drop the success payload type, keeping only the error variant —
    /// used when a registration failure needs to be returned as a
    /// different `T` than the one that would have been constructed.
    fn map_component<U>(self) -> BuilderResult<U> {
        match self {
            BuilderResult::Ok { .. } => unreachable!("map_component called on Ok"),
            BuilderResult::Err {
                code,
                message,
                dependencies,
            } => BuilderResult::Err {
                code,
                message,
                dependencies,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScalarKind;

    #[test]
    fn add_tile_then_duplicate_name_is_rejected() {
        let mut b = ProgramBuilder::new("p");
        let r1 = b.add_tile("shim0", TileKind::Shim, 0, 0, BTreeMap::new(), None);
        assert!(r1.is_ok());
        let r2 = b.add_tile("shim0", TileKind::Shim, 1, 1, BTreeMap::new(), None);
        match r2 {
            BuilderResult::Err { code, .. } => assert_eq!(code, ErrorCode::DuplicateName),
            _ => panic!("expected duplicate error"),
        }
    }

    #[test]
    fn provided_id_updates_in_place() {
        let mut b = ProgramBuilder::new("p");
        let r1 = b.add_tile("shim0", TileKind::Shim, 0, 0, BTreeMap::new(), None);
        let id = r1.id().unwrap();
        let r2 = b.add_tile("shim0", TileKind::Shim, 5, 5, BTreeMap::new(), Some(id));
        assert!(r2.is_ok());
        assert_eq!(r2.id(), Some(id));
        assert_eq!(b.program().tiles.get("shim0").unwrap().x, 5);
        assert_eq!(b.program().tiles.len(), 1);
    }

    #[test]
    fn remove_tile_blocked_by_worker_dependency() {
        let mut b = ProgramBuilder::new("p");
        b.add_tile("compute0", TileKind::Compute, 0, 2, BTreeMap::new(), None);
        b.add_core_function("fn0", vec!["k".into()], vec![], None, None);
        b.add_worker("w0", "fn0", vec![], "compute0", None);
        let r = b.remove(Namespace::Tile, "compute0");
        match r {
            BuilderResult::Err { code, dependencies, .. } => {
                assert_eq!(code, ErrorCode::DependencyExists);
                assert_eq!(dependencies, Some(vec!["Worker 'w0'".to_string()]));
            }
            _ => panic!("expected dependency error"),
        }
    }

    #[test]
    fn remove_external_kernel_blocked_by_worker_invoking_it() {
        let mut b = ProgramBuilder::new("p");
        b.add_tile("compute0", TileKind::Compute, 0, 2, BTreeMap::new(), None);
        b.add_external_kernel("relu", "relu_kernel", "relu.o", vec![], vec![], None);
        b.add_core_function("fn0", vec!["k".into()], vec![], None, None);
        b.add_worker("w0", "fn0", vec![WorkerArg::Symbol("relu".into())], "compute0", None);
        let r = b.remove(Namespace::ExternalKernel, "relu");
        match r {
            BuilderResult::Err { code, dependencies, .. } => {
                assert_eq!(code, ErrorCode::DependencyExists);
                assert_eq!(dependencies, Some(vec!["Worker 'w0'".to_string()]));
            }
            _ => panic!("expected dependency error"),
        }
        assert!(b.program().external_kernels.contains("relu"));
    }

    #[test]
    fn remove_unreferenced_tile_succeeds() {
        let mut b = ProgramBuilder::new("p");
        b.add_tile("shim0", TileKind::Shim, 0, 0, BTreeMap::new(), None);
        let r = b.remove(Namespace::Tile, "shim0");
        assert!(r.is_ok());
        assert!(b.program().tiles.is_empty());
    }

    #[test]
    fn full_program_builds_and_validates() {
        let mut b = ProgramBuilder::new("passthrough");
        b.add_tile("shim0", TileKind::Shim, 0, 0, BTreeMap::new(), None);
        b.add_tile("compute0", TileKind::Compute, 0, 2, BTreeMap::new(), None);
        b.add_fifo(
            "of_in",
            TypeRef::Scalar(ScalarKind::Int32),
            2,
            Some("shim0".into()),
            vec!["compute0".into()],
            BTreeMap::new(),
            None,
        );
        b.add_core_function("fn0", vec!["fifo_a".into()], vec![], None, None);
        b.add_worker("w0", "fn0", vec![], "compute0", None);
        let rt = b
            .create_runtime("rt")
            .add_worker("w0")
            .build();
        let program = rt.build().expect("program should validate");
        assert_eq!(program.name, "passthrough");
    }
}
