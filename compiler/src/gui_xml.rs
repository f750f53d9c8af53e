// gui_xml.rs — GUI XML serializer and loader (spec §4.4, §6.3)
//
// Deterministically maps an HLIR `Program` to the authoring-format XML
// tree and back. The mapping is intentionally lossy-for-readability:
// shape expressions and offsets travel as their textual form, and
// entity references travel as names rather than ids.
//
// The writer builds an `xml_tree::Element` (the house string-builder
// idiom, see `xml_tree.rs`); the reader parses with `roxmltree`, which
// is read-only and a natural fit since this module never mutates XML
// in place.
//
// Preconditions: `serialize` requires no prior validation of `program`
//   (it serializes whatever is there); `load` requires well-formed XML.
// Postconditions: `load(serialize(p).render())` reconstructs a program
//   with the same entities (by name) as `p`, modulo symbol values that
//   don't round-trip through text (floats keep full precision; nothing
//   else is lossy in the subset this crate serializes).
// Failure modes: `load` returns `Diagnostic`s with XML-class codes
//   rather than panicking on malformed input.
// Side effects: none (callers perform their own file I/O).

use std::collections::BTreeMap;

use roxmltree::Document;

use crate::diag::{codes, DiagLevel, Diagnostic};
use crate::hlir::{
    CoreFunction, ExternalKernel, FifoBinding, FifoMode, ObjectFifo, Program, Tile, TileKind, Worker,
    WorkerArg,
};
use crate::types::{DimExpr, ScalarKind, TensorType, TypeRef};
use crate::xml_tree::Element;

// ── Writer ───────────────────────────────────────────────────────────────────

pub fn serialize(program: &Program) -> Element {
    let mut module = Element::new("Module").attr("name", &program.name);
    module.push(serialize_symbols(program));
    module.push(serialize_dataflow(program));
    module
}

fn serialize_symbols(program: &Program) -> Element {
    let mut symbols = Element::new("Symbols");
    for (name, sym) in program.symbols.iter() {
        match &sym.value {
            crate::hlir::SymbolValue::TensorType(t) => {
                symbols.push(serialize_type_abstraction(name, t));
            }
            crate::hlir::SymbolValue::Int(n) => {
                symbols.push(
                    Element::new("Const")
                        .attr("name", name)
                        .attr("type", "int")
                        .text(n.to_string()),
                );
            }
            crate::hlir::SymbolValue::Float(f) => {
                symbols.push(
                    Element::new("Const")
                        .attr("name", name)
                        .attr("type", "float")
                        .text(f.to_string()),
                );
            }
            crate::hlir::SymbolValue::Str(s) => {
                symbols.push(
                    Element::new("Const")
                        .attr("name", name)
                        .attr("type", "str")
                        .text(s.clone()),
                );
            }
            // Split/Join/Forward symbols are emitted from the DataFlow
            // section instead (spec §4.4's dataflow ordering), not here.
            crate::hlir::SymbolValue::Split(_)
            | crate::hlir::SymbolValue::Join(_)
            | crate::hlir::SymbolValue::Forward(_) => {}
        }
    }
    symbols
}

fn serialize_type_abstraction(name: &str, t: &TensorType) -> Element {
    let shape_text = t
        .dims
        .iter()
        .map(DimExpr::source_text)
        .collect::<Vec<_>>()
        .join(", ");
    Element::new("TypeAbstraction").attr("name", name).child(
        Element::new("ndarray")
            .child(Element::new("shape").text(shape_text))
            .child(Element::new("dtype").text(t.scalar.source_token())),
    )
}

fn serialize_tile_attrs(el: Element, attr_prefix: &str, name: &str, tiles: &crate::hlir::NameMap<Tile>) -> Element {
    if let Some(tile) = tiles.get(name) {
        el.attr(attr_prefix.to_string(), name)
            .attr(format!("{attr_prefix}_kind"), tile.kind.as_str())
            .attr(format!("{attr_prefix}_x"), tile.x.to_string())
            .attr(format!("{attr_prefix}_y"), tile.y.to_string())
    } else {
        el.attr(attr_prefix, name)
    }
}

fn serialize_dataflow(program: &Program) -> Element {
    let mut df = Element::new("DataFlow");

    // Tiles travel as their own section: spec's abridged §6.3 schema
    // names no top-level Tile element, but every placement reference
    // needs a source of truth for kind/x/y, so this crate carries one
    // (recorded as a design decision rather than invented silently).
    let mut tiles_el = Element::new("Tiles");
    for (name, tile) in program.tiles.iter() {
        tiles_el.push(
            Element::new("Tile")
                .attr("name", name)
                .attr("kind", tile.kind.as_str())
                .attr("x", tile.x.to_string())
                .attr("y", tile.y.to_string()),
        );
    }
    df.push(tiles_el);

    for (name, kernel) in program.external_kernels.iter() {
        df.push(serialize_external_kernel(name, kernel));
    }
    for (name, func) in program.core_functions.iter() {
        df.push(serialize_core_function(name, func));
    }
    for (name, fifo) in program.fifos.iter() {
        df.push(serialize_fifo(name, fifo));
    }
    for (name, sym) in program.symbols.iter() {
        match &sym.value {
            crate::hlir::SymbolValue::Split(op) => {
                let mut el = Element::new("ObjectFifoSplit")
                    .attr("name", name)
                    .attr("source", &op.source)
                    .attr("num_outputs", op.num_outputs.to_string())
                    .attr("output_names", op.output_names.join(","))
                    .attr("offsets", op.offsets.iter().map(DimExpr::source_text).collect::<Vec<_>>().join(","));
                if let Some(p) = &op.placement {
                    el = serialize_tile_attrs(el, "placement", p, &program.tiles);
                }
                df.push(el);
            }
            crate::hlir::SymbolValue::Join(op) => {
                let mut el = Element::new("ObjectFifoJoin")
                    .attr("name", name)
                    .attr("dest", &op.dest)
                    .attr("num_inputs", op.num_inputs.to_string())
                    .attr("input_names", op.input_names.join(","))
                    .attr("offsets", op.offsets.iter().map(DimExpr::source_text).collect::<Vec<_>>().join(","));
                if let Some(p) = &op.placement {
                    el = serialize_tile_attrs(el, "placement", p, &program.tiles);
                }
                df.push(el);
            }
            crate::hlir::SymbolValue::Forward(op) => {
                let mut el = Element::new("ObjectFifoForward")
                    .attr("name", name)
                    .attr("source", &op.source);
                if let Some(p) = &op.placement {
                    el = serialize_tile_attrs(el, "placement", p, &program.tiles);
                }
                df.push(el);
            }
            _ => {}
        }
    }
    for (name, worker) in program.workers.iter() {
        df.push(serialize_worker(name, worker, &program.tiles));
    }
    if let Some(rt) = &program.runtime {
        df.push(serialize_runtime(rt));
    }
    df
}

fn serialize_external_kernel(name: &str, kernel: &ExternalKernel) -> Element {
    let mut attrs = Element::new("ExternalFunction")
        .attr("name", name)
        .attr("symbol", &kernel.symbol)
        .attr("source_file", &kernel.source_file)
        .attr(
            "arg_types",
            kernel.arg_types.iter().map(ToString::to_string).collect::<Vec<_>>().join(","),
        );
    if !kernel.include_dirs.is_empty() {
        attrs = attrs.attr("include_dirs", kernel.include_dirs.join(","));
    }
    attrs
}

fn serialize_core_function(name: &str, func: &CoreFunction) -> Element {
    let mut el = Element::new("CoreFunction")
        .attr("name", name)
        .attr("parameters", func.params.join(","));
    if let Some(lc) = &func.loop_count {
        el = el.attr("loop_count", lc);
    }
    el.child(serialize_core_body(&func.body))
}

fn serialize_core_body(body: &[crate::hlir::CoreStmt]) -> Element {
    let mut el = Element::new("body");
    for stmt in body {
        el.push(serialize_core_stmt(stmt));
    }
    el
}

fn serialize_core_stmt(stmt: &crate::hlir::CoreStmt) -> Element {
    use crate::hlir::CoreStmt::*;
    match stmt {
        Acquire { param, var } => Element::new("Acquire").attr("param", param).attr("var", var),
        Release { param } => Element::new("Release").attr("param", param),
        KernelCall { kernel, args } => Element::new("KernelCall").attr("kernel", kernel).attr("args", args.join(",")),
        For { var, range, body } => Element::new("For").attr("var", var).attr("range", range).child(serialize_core_body(body)),
        Assign { target, value } => Element::new("Assign").attr("target", target).attr("value", value),
    }
}

fn serialize_fifo(name: &str, fifo: &ObjectFifo) -> Element {
    let mut el = Element::new("ObjectFifo")
        .attr("name", name)
        .attr("obj_type", fifo.obj_type.to_string())
        .attr("depth", fifo.depth.to_string());
    if let Some(p) = &fifo.producer {
        el = el.attr("producer", p);
    }
    if !fifo.consumers.is_empty() {
        el = el.attr("consumers", fifo.consumers.join(","));
    }
    el
}

fn serialize_worker(name: &str, worker: &Worker, tiles: &crate::hlir::NameMap<Tile>) -> Element {
    let mut el = Element::new("Worker").attr("name", name).attr("core_fn", &worker.core_fn);
    el = serialize_tile_attrs(el, "placement", &worker.placement, tiles);
    for arg in &worker.fn_args {
        el.push(match arg {
            WorkerArg::Fifo(b) => {
                let mode = match b.mode {
                    FifoMode::Producer => "prod",
                    FifoMode::Consumer => "cons",
                };
                let mut a = Element::new("fn_arg").attr("fifo", &b.fifo_ref).attr("mode", mode);
                if let Some(idx) = b.index {
                    a = a.attr("index", idx.to_string());
                }
                a
            }
            WorkerArg::Symbol(s) => Element::new("fn_arg").attr("symbol", s),
        });
    }
    el
}

fn serialize_runtime(rt: &crate::hlir::RuntimeSequence) -> Element {
    let mut el = Element::new("Runtime")
        .attr("name", &rt.name)
        .attr("input_types", rt.input_types.iter().map(ToString::to_string).collect::<Vec<_>>().join(","))
        .attr("output_types", rt.output_types.iter().map(ToString::to_string).collect::<Vec<_>>().join(","))
        .attr("params", rt.param_names.join(","));
    let mut seq = Element::new("Sequence");
    seq.push(Element::new("Start").attr("workers", rt.start_workers.join(",")));
    for op in &rt.ops {
        seq.push(serialize_sequence_op(op));
    }
    el.push(seq);
    el
}

fn serialize_sequence_op(op: &crate::hlir::SequenceOp) -> Element {
    use crate::hlir::SequenceOp::*;
    match op {
        Fill(f) => {
            let mut el = Element::new("Fill")
                .attr("placement", &f.placement)
                .attr("fifo", &f.fifo_ref)
                .attr("host_param", &f.host_param);
            if let Some(tap) = &f.tap {
                el.push(serialize_tap(tap));
            }
            el
        }
        Drain(d) => {
            let mut el = Element::new("Drain")
                .attr("placement", &d.placement)
                .attr("fifo", &d.fifo_ref)
                .attr("host_param", &d.host_param)
                .attr("wait", d.wait.to_string());
            if let Some(tap) = &d.tap {
                el.push(serialize_tap(tap));
            }
            el
        }
    }
}

fn serialize_tap(tap: &crate::hlir::TensorAccessPattern) -> Element {
    Element::new("TensorAccessPattern")
        .attr("tensor_dims", join_dims(&tap.tensor_dims))
        .attr("offset", join_dims(&tap.offset))
        .attr("sizes", join_dims(&tap.sizes))
        .attr("strides", join_dims(&tap.strides))
}

fn join_dims(dims: &[DimExpr]) -> String {
    dims.iter().map(DimExpr::source_text).collect::<Vec<_>>().join(",")
}

// ── Reader ───────────────────────────────────────────────────────────────────

/// Parse GUI XML (or Complete XML, a superset) into a `Program`.
pub fn load(xml: &str) -> Result<Program, Vec<Diagnostic>> {
    let doc = Document::parse(xml).map_err(|e| {
        vec![Diagnostic::new(DiagLevel::Error, format!("XML parse error: {e}")).with_code(codes::XML004)]
    })?;
    let root = doc.root_element();
    if root.tag_name().name() != "Module" {
        return Err(vec![Diagnostic::new(
            DiagLevel::Error,
            format!("expected root element <Module>, found <{}>", root.tag_name().name()),
        )
        .with_code(codes::XML006)]);
    }
    let name = root.attribute("name").unwrap_or("program");
    let mut program = Program::new(name);
    let mut diags = Vec::new();

    if let Some(symbols) = root.children().find(|n| n.has_tag_name("Symbols")) {
        for child in symbols.children().filter(|n| n.is_element()) {
            match child.tag_name().name() {
                "TypeAbstraction" => {
                    if let Some(sym) = load_type_abstraction(&child, &mut diags) {
                        program.symbols.insert(sym.0, sym.1);
                    }
                }
                "Const" => {
                    if let Some((n, s)) = load_const(&child) {
                        program.symbols.insert(n, s);
                    }
                }
                other => diags.push(
                    Diagnostic::new(DiagLevel::Warn, format!("no handler for tag {other}"))
                        .with_code(codes::XML001)
                        .with_field("tag", other.to_string()),
                ),
            }
        }
    }

    if let Some(dataflow) = root.children().find(|n| n.has_tag_name("DataFlow")) {
        for child in dataflow.children().filter(|n| n.is_element()) {
            match child.tag_name().name() {
                "Tiles" => {
                    for tile_el in child.children().filter(|n| n.has_tag_name("Tile")) {
                        if let Some(tile) = load_tile(&tile_el, &mut diags) {
                            program.tiles.insert(tile.name.clone(), tile);
                        }
                    }
                }
                "ExternalFunction" => {
                    if let Some(k) = load_external_kernel(&child) {
                        program.external_kernels.insert(k.name.clone(), k);
                    }
                }
                "CoreFunction" => {
                    if let Some(f) = load_core_function(&child) {
                        program.core_functions.insert(f.name.clone(), f);
                    }
                }
                "ObjectFifo" => {
                    if let Some(f) = load_fifo(&child, &mut diags) {
                        program.fifos.insert(f.name.clone(), f);
                    }
                }
                "ObjectFifoSplit" => {
                    if let Some((n, sym)) = load_split(&child) {
                        program.symbols.insert(n, sym);
                    }
                }
                "ObjectFifoJoin" => {
                    if let Some((n, sym)) = load_join(&child) {
                        program.symbols.insert(n, sym);
                    }
                }
                "ObjectFifoForward" => {
                    if let Some((n, sym)) = load_forward(&child) {
                        program.symbols.insert(n, sym);
                    }
                }
                "Worker" => {
                    if let Some(w) = load_worker(&child) {
                        program.workers.insert(w.name.clone(), w);
                    }
                }
                "Runtime" => {
                    program.runtime = load_runtime(&child);
                }
                other => diags.push(
                    Diagnostic::new(DiagLevel::Warn, format!("no handler for tag {other}"))
                        .with_code(codes::XML001)
                        .with_field("tag", other.to_string()),
                ),
            }
        }
    }

    if diags.iter().any(|d| d.level == DiagLevel::Error) {
        Err(diags)
    } else {
        Ok(program)
    }
}

fn load_type_abstraction(el: &roxmltree::Node, diags: &mut Vec<Diagnostic>) -> Option<(String, crate::hlir::Symbol)> {
    let name = el.attribute("name")?.to_string();
    let ndarray = el.children().find(|n| n.has_tag_name("ndarray"))?;
    let shape = ndarray.children().find(|n| n.has_tag_name("shape"))?.text().unwrap_or("").to_string();
    let dtype = ndarray.children().find(|n| n.has_tag_name("dtype"))?.text().unwrap_or("").to_string();
    let Some(scalar) = ScalarKind::parse(dtype.trim()) else {
        diags.push(
            Diagnostic::new(DiagLevel::Error, format!("bad attribute type for dtype '{dtype}'"))
                .with_code(codes::XML004)
                .with_field("attr", "dtype".to_string()),
        );
        return None;
    };
    let dims = shape
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(DimExpr::parse)
        .collect();
    let tensor_type = TensorType::new(dims, scalar);
    Some((
        name.clone(),
        crate::hlir::Symbol {
            name,
            value: crate::hlir::SymbolValue::TensorType(tensor_type),
            type_hint: None,
            is_constant: false,
        },
    ))
}

fn load_const(el: &roxmltree::Node) -> Option<(String, crate::hlir::Symbol)> {
    let name = el.attribute("name")?.to_string();
    let kind = el.attribute("type").unwrap_or("str");
    let text = el.text().unwrap_or("").to_string();
    let value = match kind {
        "int" => crate::hlir::SymbolValue::Int(text.parse().ok()?),
        "float" => crate::hlir::SymbolValue::Float(text.parse().ok()?),
        _ => crate::hlir::SymbolValue::Str(text),
    };
    Some((
        name.clone(),
        crate::hlir::Symbol {
            name,
            value,
            type_hint: None,
            is_constant: true,
        },
    ))
}

fn load_tile(el: &roxmltree::Node, diags: &mut Vec<Diagnostic>) -> Option<Tile> {
    let name = el.attribute("name")?.to_string();
    let kind_str = el.attribute("kind").unwrap_or("compute");
    let Some(kind) = TileKind::parse(kind_str) else {
        diags.push(
            Diagnostic::new(DiagLevel::Error, format!("bad attribute type for kind '{kind_str}'"))
                .with_code(codes::XML004)
                .with_field("attr", "kind".to_string()),
        );
        return None;
    };
    let x = el.attribute("x").and_then(|v| v.parse().ok()).unwrap_or(0);
    let y = el.attribute("y").and_then(|v| v.parse().ok()).unwrap_or(0);
    Some(Tile {
        name,
        kind,
        x,
        y,
        metadata: BTreeMap::new(),
    })
}

fn load_external_kernel(el: &roxmltree::Node) -> Option<ExternalKernel> {
    Some(ExternalKernel {
        name: el.attribute("name")?.to_string(),
        symbol: el.attribute("symbol").unwrap_or("").to_string(),
        source_file: el.attribute("source_file").unwrap_or("").to_string(),
        arg_types: split_types(el.attribute("arg_types").unwrap_or("")),
        include_dirs: split_list(el.attribute("include_dirs").unwrap_or("")),
    })
}

fn load_core_function(el: &roxmltree::Node) -> Option<CoreFunction> {
    let name = el.attribute("name")?.to_string();
    let params = split_list(el.attribute("parameters").unwrap_or(""));
    let loop_count = el.attribute("loop_count").map(String::from);
    let body = el
        .children()
        .find(|n| n.has_tag_name("body"))
        .map(|b| load_core_body(&b))
        .unwrap_or_default();
    Some(CoreFunction {
        name,
        params,
        body,
        loop_count,
    })
}

fn load_core_body(el: &roxmltree::Node) -> Vec<crate::hlir::CoreStmt> {
    use crate::hlir::CoreStmt::*;
    el.children()
        .filter(|n| n.is_element())
        .filter_map(|n| match n.tag_name().name() {
            "Acquire" => Some(Acquire {
                param: n.attribute("param")?.to_string(),
                var: n.attribute("var")?.to_string(),
            }),
            "Release" => Some(Release {
                param: n.attribute("param")?.to_string(),
            }),
            "KernelCall" => Some(KernelCall {
                kernel: n.attribute("kernel")?.to_string(),
                args: split_list(n.attribute("args").unwrap_or("")),
            }),
            "For" => Some(For {
                var: n.attribute("var")?.to_string(),
                range: n.attribute("range")?.to_string(),
                body: n.children().find(|c| c.has_tag_name("body")).map(|b| load_core_body(&b)).unwrap_or_default(),
            }),
            "Assign" => Some(Assign {
                target: n.attribute("target")?.to_string(),
                value: n.attribute("value")?.to_string(),
            }),
            _ => None,
        })
        .collect()
}

fn load_fifo(el: &roxmltree::Node, diags: &mut Vec<Diagnostic>) -> Option<ObjectFifo> {
    let name = el.attribute("name")?.to_string();
    let Some(obj_type_str) = el.attribute("obj_type") else {
        diags.push(
            Diagnostic::new(DiagLevel::Error, format!("missing required attribute on ObjectFifo '{name}'"))
                .with_code(codes::XML003)
                .with_field("attr", "obj_type".to_string()),
        );
        return None;
    };
    let obj_type = parse_type_ref(obj_type_str);
    let depth = el.attribute("depth").and_then(|v| v.parse().ok()).unwrap_or(2);
    Some(ObjectFifo {
        name,
        obj_type,
        depth,
        producer: el.attribute("producer").map(String::from),
        consumers: split_list(el.attribute("consumers").unwrap_or("")),
        metadata: BTreeMap::new(),
    })
}

fn load_split(el: &roxmltree::Node) -> Option<(String, crate::hlir::Symbol)> {
    let name = el.attribute("name")?.to_string();
    let output_names = split_list(el.attribute("output_names").unwrap_or(""));
    let offsets = split_dims(el.attribute("offsets").unwrap_or(""));
    let num_outputs = el
        .attribute("num_outputs")
        .and_then(|v| v.parse().ok())
        .unwrap_or(output_names.len());
    let op = crate::hlir::SplitOperation {
        name: name.clone(),
        source: el.attribute("source")?.to_string(),
        num_outputs,
        output_types: vec![TypeRef::named("_inferred"); output_names.len()],
        output_names,
        offsets,
        placement: el.attribute("placement").map(String::from),
    };
    Some((
        name.clone(),
        crate::hlir::Symbol {
            name,
            value: crate::hlir::SymbolValue::Split(op),
            type_hint: None,
            is_constant: false,
        },
    ))
}

fn load_join(el: &roxmltree::Node) -> Option<(String, crate::hlir::Symbol)> {
    let name = el.attribute("name")?.to_string();
    let input_names = split_list(el.attribute("input_names").unwrap_or(""));
    let offsets = split_dims(el.attribute("offsets").unwrap_or(""));
    let num_inputs = el
        .attribute("num_inputs")
        .and_then(|v| v.parse().ok())
        .unwrap_or(input_names.len());
    let op = crate::hlir::JoinOperation {
        name: name.clone(),
        dest: el.attribute("dest")?.to_string(),
        num_inputs,
        input_types: vec![TypeRef::named("_inferred"); input_names.len()],
        input_names,
        offsets,
        placement: el.attribute("placement").map(String::from),
    };
    Some((
        name.clone(),
        crate::hlir::Symbol {
            name,
            value: crate::hlir::SymbolValue::Join(op),
            type_hint: None,
            is_constant: false,
        },
    ))
}

fn load_forward(el: &roxmltree::Node) -> Option<(String, crate::hlir::Symbol)> {
    let name = el.attribute("name")?.to_string();
    let op = crate::hlir::ForwardOperation {
        name: name.clone(),
        source: el.attribute("source")?.to_string(),
        placement: el.attribute("placement").map(String::from),
    };
    Some((
        name.clone(),
        crate::hlir::Symbol {
            name,
            value: crate::hlir::SymbolValue::Forward(op),
            type_hint: None,
            is_constant: false,
        },
    ))
}

fn load_worker(el: &roxmltree::Node) -> Option<Worker> {
    let name = el.attribute("name")?.to_string();
    let core_fn = el.attribute("core_fn")?.to_string();
    let placement = el.attribute("placement")?.to_string();
    let fn_args = el
        .children()
        .filter(|n| n.has_tag_name("fn_arg"))
        .map(|n| {
            if let Some(fifo) = n.attribute("fifo") {
                let mode = if n.attribute("mode") == Some("prod") {
                    FifoMode::Producer
                } else {
                    FifoMode::Consumer
                };
                WorkerArg::Fifo(FifoBinding {
                    fifo_ref: fifo.to_string(),
                    mode,
                    index: n.attribute("index").and_then(|v| v.parse().ok()),
                })
            } else {
                WorkerArg::Symbol(n.attribute("symbol").unwrap_or("").to_string())
            }
        })
        .collect();
    Some(Worker {
        name,
        core_fn,
        fn_args,
        placement,
    })
}

fn load_runtime(el: &roxmltree::Node) -> Option<crate::hlir::RuntimeSequence> {
    let name = el.attribute("name").unwrap_or("runtime").to_string();
    let input_types = split_types(el.attribute("input_types").unwrap_or(""));
    let output_types = split_types(el.attribute("output_types").unwrap_or(""));
    let param_names = split_list(el.attribute("params").unwrap_or(""));
    let seq = el.children().find(|n| n.has_tag_name("Sequence"))?;
    let start_workers = seq
        .children()
        .find(|n| n.has_tag_name("Start"))
        .map(|s| split_list(s.attribute("workers").unwrap_or("")))
        .unwrap_or_default();
    let ops = seq
        .children()
        .filter(|n| n.is_element() && n.tag_name().name() != "Start")
        .filter_map(|n| match n.tag_name().name() {
            "Fill" => Some(crate::hlir::SequenceOp::Fill(crate::hlir::RuntimeFill {
                placement: n.attribute("placement")?.to_string(),
                fifo_ref: n.attribute("fifo")?.to_string(),
                host_param: n.attribute("host_param")?.to_string(),
                tap: n.children().find(|c| c.has_tag_name("TensorAccessPattern")).map(load_tap),
            })),
            "Drain" => Some(crate::hlir::SequenceOp::Drain(crate::hlir::RuntimeDrain {
                placement: n.attribute("placement")?.to_string(),
                fifo_ref: n.attribute("fifo")?.to_string(),
                host_param: n.attribute("host_param")?.to_string(),
                wait: n.attribute("wait").map(|v| v == "true").unwrap_or(true),
                tap: n.children().find(|c| c.has_tag_name("TensorAccessPattern")).map(load_tap),
            })),
            _ => None,
        })
        .collect();
    Some(crate::hlir::RuntimeSequence {
        name,
        input_types,
        output_types,
        param_names,
        start_workers,
        ops,
    })
}

fn load_tap(el: roxmltree::Node) -> crate::hlir::TensorAccessPattern {
    crate::hlir::TensorAccessPattern {
        tensor_dims: split_dims(el.attribute("tensor_dims").unwrap_or("")),
        offset: split_dims(el.attribute("offset").unwrap_or("")),
        sizes: split_dims(el.attribute("sizes").unwrap_or("")),
        strides: split_dims(el.attribute("strides").unwrap_or("")),
    }
}

fn parse_type_ref(s: &str) -> TypeRef {
    match ScalarKind::parse(s) {
        Some(k) => TypeRef::Scalar(k),
        None => TypeRef::named(s),
    }
}

fn split_types(s: &str) -> Vec<TypeRef> {
    s.split(',').map(str::trim).filter(|s| !s.is_empty()).map(parse_type_ref).collect()
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect()
}

fn split_dims(s: &str) -> Vec<DimExpr> {
    s.split(',').map(str::trim).filter(|s| !s.is_empty()).map(DimExpr::parse).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ProgramBuilder;
    use crate::hlir::TileKind;

    fn sample_program() -> Program {
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
        b.build().expect("valid")
    }

    #[test]
    fn round_trips_tiles_and_fifo() {
        let program = sample_program();
        let xml = serialize(&program).render();
        let reloaded = load(&xml).expect("should parse");
        assert_eq!(reloaded.name, "passthrough");
        assert_eq!(reloaded.tiles.len(), 2);
        assert_eq!(reloaded.tiles.get("shim0").unwrap().kind, TileKind::Shim);
        let fifo = reloaded.fifos.get("of_in").unwrap();
        assert_eq!(fifo.depth, 2);
        assert_eq!(fifo.producer.as_deref(), Some("shim0"));
    }

    #[test]
    fn unknown_root_element_is_rejected() {
        let err = load("<?xml version=\"1.0\"?><NotAModule/>").unwrap_err();
        assert_eq!(err[0].code, Some(codes::XML006));
    }

    #[test]
    fn type_abstraction_round_trips_symbolic_dims() {
        let mut program = Program::new("p");
        program.symbols.insert(
            "chunk_ty",
            crate::hlir::Symbol {
                name: "chunk_ty".into(),
                value: crate::hlir::SymbolValue::TensorType(TensorType::new(
                    vec![DimExpr::Symbolic("N / 16".into())],
                    ScalarKind::Int32,
                )),
                type_hint: None,
                is_constant: false,
            },
        );
        let xml = serialize(&program).render();
        let reloaded = load(&xml).unwrap();
        let sym = reloaded.symbols.get("chunk_ty").unwrap();
        match &sym.value {
            crate::hlir::SymbolValue::TensorType(t) => {
                assert_eq!(t.dims[0], DimExpr::Symbolic("N / 16".into()));
            }
            _ => panic!("expected tensor type"),
        }
    }
}
