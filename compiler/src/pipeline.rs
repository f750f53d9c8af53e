// pipeline.rs — End-to-end orchestration (spec §4.8, §5, §6.1)
//
// Ties every stage together: load (GUI XML, sniffed vs. Complete XML,
// or an in-memory `Program` from the builder API) -> expand -> build
// the semantic graph -> generate Python -> optionally run it as a
// subprocess. Single-threaded throughout (spec §5): no stage spawns a
// thread, and the optional `--run` subprocess is waited on with a
// fixed timeout rather than polled from a background task.
//
// Provenance (a SHA-256 digest of the Complete XML plus a fingerprint
// of the id registry) lets a caller detect whether two compilations of
// "the same" program actually produced identical output — grounded on
// the teacher's use of `sha2` for its own build-manifest hashing.
//
// Preconditions: none beyond what each stage documents.
// Postconditions: `run_pipeline` either returns every emitted artifact
//   or the diagnostics that explain why it stopped.
// Failure modes: a failing stage halts the pipeline and returns its
//   diagnostics; it never proceeds with partial/best-effort output.
// Side effects: `run_pipeline` may spawn a child process (`--run`) and
//   may write files to `output_dir`, depending on `Config`.

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};

use crate::builder::ProgramBuilder;
use crate::config::{Config, EmitStage};
use crate::diag::Diagnostic;
use crate::extension::{CodegenExtensionRegistry, ExtensionRegistry};
use crate::hlir::Program;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PassId {
    LoadGuiXml,
    Expand,
    BuildGraph,
    Codegen,
}

/// The passes a given `EmitStage` requires to have run, in order.
pub fn required_passes(stage: EmitStage) -> &'static [PassId] {
    use PassId::*;
    match stage {
        EmitStage::CompleteXml => &[LoadGuiXml, Expand],
        EmitStage::GraphMl => &[LoadGuiXml, Expand, BuildGraph],
        EmitStage::Py | EmitStage::Run => &[LoadGuiXml, Expand, BuildGraph, Codegen],
    }
}

/// A SHA-256 digest of the Complete XML, plus a coarse fingerprint of
/// how many entities ended up registered in each namespace — enough to
/// tell two compilations of "the same" program apart from two that
/// only look the same at the Python-source level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
    pub complete_xml_sha256: String,
    pub entity_count: usize,
}

pub fn compute_provenance(program: &Program, complete_xml: &str) -> Provenance {
    let mut hasher = Sha256::new();
    hasher.update(complete_xml.as_bytes());
    let digest = hasher.finalize();
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    let entity_count = program.symbols.len()
        + program.tiles.len()
        + program.fifos.len()
        + program.external_kernels.len()
        + program.core_functions.len()
        + program.workers.len();
    Provenance {
        complete_xml_sha256: hex,
        entity_count,
    }
}

/// Everything a pipeline run produced, up to however far `Config.emit`
/// asked it to go.
#[derive(Debug, Default)]
pub struct PipelineOutput {
    pub complete_xml: Option<String>,
    pub graphml: Option<String>,
    pub python: Option<String>,
    pub provenance: Option<Provenance>,
    pub run_exit_code: Option<i32>,
}

/// Detects whether `source` is GUI XML / Complete XML (sniffed by
/// checking for a `<Module` root tag) as opposed to having come from
/// the builder API already as a `Program` — the two entry points
/// `run_pipeline` and `run_pipeline_from_program` cover this split
/// rather than one function branching on a filename convention, which
/// spec leaves ambiguous (Open Question, resolved in favor of content
/// sniffing: a `.py` generated-output file never round-trips back in,
/// so there is no ambiguous case to disambiguate by extension).
pub fn looks_like_gui_xml(source: &str) -> bool {
    source.trim_start().starts_with("<?xml") || source.trim_start().starts_with("<Module")
}

pub fn run_pipeline(source: &str, config: &Config, output_dir: Option<&Path>) -> Result<PipelineOutput, Vec<Diagnostic>> {
    let program = crate::gui_xml::load(source)?;
    run_pipeline_from_program(&program, config, output_dir)
}

pub fn run_pipeline_from_program(
    program: &Program,
    config: &Config,
    output_dir: Option<&Path>,
) -> Result<PipelineOutput, Vec<Diagnostic>> {
    let mut out = PipelineOutput::default();
    let passes = required_passes(config.emit);

    let complete_xml = crate::expander::expand_to_string(program);
    out.provenance = Some(compute_provenance(program, &complete_xml));
    if passes.contains(&PassId::Expand) {
        out.complete_xml = Some(complete_xml.clone());
        write_artifact(output_dir, "complete.xml", &complete_xml);
    }
    if !passes.contains(&PassId::BuildGraph) {
        return Ok(out);
    }

    let graph_extensions = ExtensionRegistry::with_builtins();
    let graph = crate::graph::build_graph(&complete_xml, &graph_extensions)?;

    if config.emit == EmitStage::GraphMl {
        let graphml = crate::graphml::render(&graph);
        out.graphml = Some(graphml.clone());
        write_artifact(output_dir, "graph.graphml", &graphml);
        return Ok(out);
    }

    let codegen_extensions = CodegenExtensionRegistry::new();
    let (python, codegen_diags) = crate::codegen::generate(&graph, &codegen_extensions);
    if codegen_diags.iter().any(|d| d.level == crate::diag::DiagLevel::Error) {
        return Err(codegen_diags);
    }
    out.python = Some(python.clone());
    write_artifact(output_dir, "generated.py", &python);

    if config.emit == EmitStage::Run || config.run {
        let path = output_dir
            .map(|d| d.join("generated.py"))
            .unwrap_or_else(|| PathBuf::from("generated.py"));
        out.run_exit_code = Some(run_subprocess(&path, Duration::from_secs(config.run_timeout_secs))?);
    }

    Ok(out)
}

fn write_artifact(output_dir: Option<&Path>, filename: &str, contents: &str) {
    let Some(dir) = output_dir else { return };
    let _ = std::fs::create_dir_all(dir);
    if let Ok(mut f) = std::fs::File::create(dir.join(filename)) {
        let _ = f.write_all(contents.as_bytes());
    }
}

/// Spawn `python3 <path>` and wait up to `timeout`, killing it and
/// reporting a system-error diagnostic if it runs past that (spec §5's
/// fixed subprocess timeout — there is no configurable override).
fn run_subprocess(path: &Path, timeout: Duration) -> Result<i32, Vec<Diagnostic>> {
    let mut child = Command::new("python3")
        .arg(path)
        .stdin(Stdio::null())
        .spawn()
        .map_err(|e| vec![Diagnostic::new(crate::diag::DiagLevel::Error, format!("failed to spawn subprocess: {e}"))])?;

    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait().map_err(|e| {
            vec![Diagnostic::new(crate::diag::DiagLevel::Error, format!("error waiting on subprocess: {e}"))]
        })? {
            return Ok(status.code().unwrap_or(-1));
        }
        if start.elapsed() >= timeout {
            let _ = child.kill();
            let _ = child.wait();
            return Err(vec![Diagnostic::new(
                crate::diag::DiagLevel::Error,
                format!("subprocess exceeded {}s timeout", timeout.as_secs()),
            )]);
        }
        std::thread::sleep(Duration::from_millis(20));
    }
}

/// Build a trivial passthrough program directly via the builder API,
/// for callers (tests, the CLI's smoke path) that want a known-good
/// `Program` without writing XML by hand.
pub fn example_passthrough_program() -> Program {
    use crate::hlir::TileKind;
    use crate::types::{ScalarKind, TypeRef};
    use std::collections::BTreeMap;

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
    b.add_core_function("passthrough_fn", vec!["of_in".into()], vec![], None, None);
    b.add_worker("w0", "passthrough_fn", vec![], "compute0", None);
    let rt = b.create_runtime("rt").add_worker("w0").build();
    rt.build().expect("passthrough program validates")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_passes_escalate_with_emit_stage() {
        assert_eq!(required_passes(EmitStage::CompleteXml), &[PassId::LoadGuiXml, PassId::Expand]);
        assert_eq!(
            required_passes(EmitStage::Py),
            &[PassId::LoadGuiXml, PassId::Expand, PassId::BuildGraph, PassId::Codegen]
        );
    }

    #[test]
    fn provenance_hash_is_stable_for_identical_input() {
        let program = example_passthrough_program();
        let xml = crate::expander::expand_to_string(&program);
        let p1 = compute_provenance(&program, &xml);
        let p2 = compute_provenance(&program, &xml);
        assert_eq!(p1, p2);
        assert_eq!(p1.complete_xml_sha256.len(), 64);
    }

    #[test]
    fn pipeline_produces_complete_xml_graphml_and_python() {
        let program = example_passthrough_program();
        let config = Config {
            emit: EmitStage::Py,
            ..Config::default()
        };
        let out = run_pipeline_from_program(&program, &config, None).expect("should succeed");
        assert!(out.complete_xml.unwrap().contains("<Module"));
        assert!(out.python.unwrap().contains("import numpy as np"));
    }

    #[test]
    fn complete_xml_only_stage_skips_graph_and_codegen() {
        let program = example_passthrough_program();
        let config = Config {
            emit: EmitStage::CompleteXml,
            ..Config::default()
        };
        let out = run_pipeline_from_program(&program, &config, None).expect("should succeed");
        assert!(out.complete_xml.is_some());
        assert!(out.python.is_none());
    }

    #[test]
    fn looks_like_gui_xml_detects_xml_content() {
        assert!(looks_like_gui_xml("<?xml version=\"1.0\"?><Module/>"));
        assert!(!looks_like_gui_xml("# a generated python file"));
    }
}
