// pipeline.rs — Round driver and pass orchestration
//
// `process_round` runs the minimal set of passes for a terminal PassId over
// one round's declarations. `compile` drives rounds: round 1 parses the user
// sources; each later round parses the declaration stubs generated by the
// round before it, with every earlier unit visible as library. Rounds stop
// once a round generates nothing.
//
// Preconditions: inputs are readable `.orbit` files or directories.
// Postconditions: every diagnostic of every round is in `Compilation`.
// Failure modes: unreadable inputs return `SourceError`; everything else is
//                reported as a diagnostic and the round continues.
// Side effects: writes generated sources and manifests through the filer.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Instant;

use serde::Serialize;

use crate::ast::CompilationUnit;
use crate::classify::{classify, Classification};
use crate::context::Context;
use crate::decl::{DeclTable, DeclarationSource, UnitInput};
use crate::describe::{describe, InterfaceDescriptor};
use crate::diag::{codes, Diagnostic, DiagnosticBuffer, DiagnosticSink};
use crate::filer::Filer;
use crate::id::{DeclId, ID_HASH_ALGORITHM};
use crate::manifest::{register_class, register_interface};
use crate::parser::parse;
use crate::pass::{descriptor, required_passes, PassId};
use crate::plan::GenerationPlan;
use crate::prelude;
use crate::render::{RenderedUnit, Renderer, UnitKind};
use crate::source::{discover, FileId, Location, SourceError, SourceFile, SourceMap};
use crate::validate::{check_collisions, validate_markers, validate_methods};
use crate::walk::{walk, Candidates};

/// Rounds after the first exist only to re-ingest generated stubs; a build
/// that keeps generating past this many rounds is reported and stopped.
pub const MAX_ROUNDS: usize = 8;

// ── Options ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmitTarget {
    /// Generate sources and manifests.
    #[default]
    All,
    /// Interface descriptors as JSON; nothing written.
    Decls,
    /// Generation plans as JSON; nothing written.
    Plan,
    /// Provenance JSON; nothing compiled.
    BuildInfo,
}

impl EmitTarget {
    /// Last pass needed, or `None` when no pass runs.
    pub fn terminal(self) -> Option<PassId> {
        match self {
            EmitTarget::All => Some(PassId::Register),
            EmitTarget::Decls => Some(PassId::AssignIds),
            EmitTarget::Plan => Some(PassId::Plan),
            EmitTarget::BuildInfo => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompilerOptions {
    pub inputs: Vec<PathBuf>,
    pub out_dir: PathBuf,
    pub emit: EmitTarget,
}

// ── Round ──────────────────────────────────────────────────────────────────

/// Artifacts of one round, filled as passes run.
#[derive(Debug, Default)]
pub struct RoundOutput {
    pub candidates: Candidates,
    pub classified: Vec<(DeclId, Classification)>,
    pub descriptors: Vec<InterfaceDescriptor>,
    pub plans: Vec<GenerationPlan>,
    /// Relative paths of every source written.
    pub generated: Vec<String>,
    /// Stubs written this round, to be parsed by the next.
    pub stubs: Vec<RenderedUnit>,
    /// Relative paths of every manifest written.
    pub manifests: Vec<String>,
}

/// Run the passes required for `terminal` over one round.
pub fn process_round(ctx: &Context<'_>, renderer: &dyn Renderer, terminal: PassId) -> RoundOutput {
    let mut out = RoundOutput::default();
    let mut rendered: HashSet<DeclId> = HashSet::new();

    for pass in required_passes(terminal) {
        let t = Instant::now();
        match pass {
            PassId::Walk => {
                out.candidates = walk(ctx.decls);
            }
            PassId::Classify => {
                out.classified = out
                    .candidates
                    .interfaces
                    .iter()
                    .map(|&id| (id, classify(ctx.decls, id)))
                    .collect();
            }
            PassId::Describe => {
                out.descriptors = out
                    .classified
                    .iter()
                    .filter(|(_, c)| *c != Classification::None)
                    .map(|&(id, c)| describe(ctx.decls, id, c == Classification::Actor))
                    .collect();
            }
            PassId::Validate => {
                let actors: HashSet<DeclId> = out
                    .classified
                    .iter()
                    .filter(|(_, c)| *c == Classification::Actor)
                    .map(|(id, _)| *id)
                    .collect();
                validate_markers(ctx, &out.candidates, &actors);
                for descriptor in &mut out.descriptors {
                    validate_methods(ctx, descriptor);
                }
            }
            PassId::AssignIds => {
                for descriptor in &mut out.descriptors {
                    descriptor.assign_ids();
                }
                check_collisions(ctx, &mut out.descriptors);
            }
            PassId::Plan => {
                out.plans = out.descriptors.iter().map(GenerationPlan::build).collect();
            }
            PassId::Render => {
                for plan in &out.plans {
                    if let Some(units) = render_plan(ctx, renderer, plan) {
                        rendered.insert(plan.decl);
                        for unit in units {
                            out.generated.push(unit.path.clone());
                            if unit.kind == UnitKind::DeclarationStub {
                                out.stubs.push(unit);
                            }
                        }
                    }
                }
            }
            PassId::Register => {
                for plan in out.plans.iter().filter(|p| rendered.contains(&p.decl)) {
                    out.manifests.extend(register_interface(ctx, plan));
                }
                for &class in &out.candidates.classes {
                    out.manifests.extend(register_class(ctx, class));
                }
            }
        }
        tracing::debug!(
            pass = descriptor(pass).name,
            elapsed_ms = t.elapsed().as_secs_f64() * 1000.0,
            "pass complete"
        );
    }
    out
}

/// Render one plan and write its units. Any failure is reported against the
/// interface and abandons its remaining outputs.
fn render_plan(
    ctx: &Context<'_>,
    renderer: &dyn Renderer,
    plan: &GenerationPlan,
) -> Option<Vec<RenderedUnit>> {
    let units = match renderer.render(plan) {
        Ok(units) => units,
        Err(err) => {
            ctx.report_at(
                plan.decl,
                Diagnostic::error(codes::E0402, format!("cannot render: {}", err)),
            );
            return None;
        }
    };
    for unit in &units {
        if let Err(err) = ctx.filer.create_source(&unit.path, &unit.contents) {
            ctx.report_at(
                plan.decl,
                Diagnostic::error(codes::E0401, format!("cannot write generated source: {}", err)),
            );
            return None;
        }
    }
    ctx.report_at(
        plan.decl,
        Diagnostic::info(
            codes::I0001,
            format!(
                "generated {} ({} files)",
                plan.factory_qualified_name(),
                units.len()
            ),
        ),
    );
    Some(units)
}

// ── Driver ─────────────────────────────────────────────────────────────────

/// Everything a build produced, across all rounds.
#[derive(Debug, Default)]
pub struct Compilation {
    pub sources: SourceMap,
    /// User inputs, in discovery order.
    pub inputs: Vec<FileId>,
    pub diagnostics: Vec<Diagnostic>,
    pub descriptors: Vec<InterfaceDescriptor>,
    pub plans: Vec<GenerationPlan>,
    pub generated: Vec<String>,
    pub manifests: Vec<String>,
    pub rounds: usize,
}

impl Compilation {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

struct ParsedUnit {
    file: FileId,
    unit: CompilationUnit,
}

/// Forwards diagnostics located in files added at or after `first_new`.
/// Rebuilding the declaration table each round would otherwise repeat the
/// earlier rounds' reports.
struct NewFilesOnly<'a> {
    inner: &'a dyn DiagnosticSink,
    first_new: FileId,
}

impl DiagnosticSink for NewFilesOnly<'_> {
    fn report(&self, diagnostic: Diagnostic) {
        if !matches!(diagnostic.location, Some(loc) if loc.file < self.first_new) {
            self.inner.report(diagnostic);
        }
    }
}

/// Read the user inputs into a source map after the prelude.
pub fn load_inputs(inputs: &[PathBuf]) -> Result<(SourceMap, Vec<FileId>), SourceError> {
    let mut sources = SourceMap::new();
    for (path, text) in prelude::sources() {
        sources.add(*path, *text, None);
    }
    let mut ids = Vec::new();
    for input in discover(inputs)? {
        ids.push(sources.load(&input)?);
    }
    Ok((sources, ids))
}

fn parse_file(sources: &SourceMap, file: FileId, diags: &dyn DiagnosticSink) -> Option<ParsedUnit> {
    let result = parse(&sources.file(file).text);
    for err in &result.errors {
        let span = *err.span();
        diags.report(
            Diagnostic::error(codes::E0101, err.to_string()).at(Some(Location { file, span })),
        );
    }
    result.unit.map(|unit| ParsedUnit { file, unit })
}

/// Compile `options.inputs`, writing through `filer` with `renderer`.
pub fn compile(
    options: &CompilerOptions,
    filer: &dyn Filer,
    renderer: &dyn Renderer,
) -> Result<Compilation, SourceError> {
    let (sources, inputs) = load_inputs(&options.inputs)?;
    let mut compilation = Compilation {
        sources,
        inputs,
        ..Compilation::default()
    };
    let Some(terminal) = options.emit.terminal() else {
        return Ok(compilation);
    };

    let diags = DiagnosticBuffer::new();
    let mut units: Vec<ParsedUnit> = Vec::new();
    let prelude_files: Vec<FileId> = compilation
        .sources
        .files()
        .take(prelude::sources().len())
        .map(|(id, _)| id)
        .collect();
    for file in prelude_files.into_iter().chain(compilation.inputs.iter().copied()) {
        units.extend(parse_file(&compilation.sources, file, &diags));
    }

    let mut first_new = compilation
        .inputs
        .first()
        .copied()
        .unwrap_or(FileId(u32::MAX));
    let mut round = 1;
    loop {
        let _span = tracing::debug_span!("round", n = round).entered();
        let inputs: Vec<UnitInput<'_>> = units
            .iter()
            .map(|u| UnitInput {
                unit: &u.unit,
                file: u.file,
                package_hint: compilation.sources.file(u.file).package_hint.as_deref(),
                is_root: u.file >= first_new,
            })
            .collect();
        let table = DeclTable::build(
            &inputs,
            &NewFilesOnly {
                inner: &diags,
                first_new,
            },
        );
        let ctx = Context::new(&table, filer, &diags);
        let out = process_round(&ctx, renderer, terminal);
        tracing::debug!(
            roots = table.roots().len(),
            plans = out.plans.len(),
            stubs = out.stubs.len(),
            "round complete"
        );

        compilation.rounds = round;
        compilation.descriptors.extend(out.descriptors);
        compilation.plans.extend(out.plans);
        compilation.generated.extend(out.generated);
        compilation.manifests.extend(out.manifests);
        if out.stubs.is_empty() {
            break;
        }
        if round == MAX_ROUNDS {
            diags.report(Diagnostic::error(
                codes::E0501,
                format!("generation did not settle after {} rounds", MAX_ROUNDS),
            ));
            break;
        }

        round += 1;
        first_new = FileId(compilation.sources.files().count() as u32);
        for stub in out.stubs {
            let path = options.out_dir.join("src").join(&stub.path);
            let file = compilation.sources.add(path, stub.contents, None);
            units.extend(parse_file(&compilation.sources, file, &diags));
        }
    }

    compilation.diagnostics = diags.into_inner();
    Ok(compilation)
}

// ── Provenance ─────────────────────────────────────────────────────────────

/// Provenance metadata for `--emit build-info`.
#[derive(Debug, Clone, Serialize)]
pub struct Provenance {
    pub compiler_version: &'static str,
    pub id_hash_algorithm: &'static str,
    pub sources: Vec<SourceHash>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceHash {
    pub path: String,
    pub sha256: String,
}

impl Provenance {
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        use std::fmt::Write;
        let _ = write!(s, "{:02x}", b);
    }
    s
}

/// SHA-256 of each source, sorted by path.
pub fn compute_provenance<'a>(files: impl IntoIterator<Item = &'a SourceFile>) -> Provenance {
    use sha2::{Digest, Sha256};

    let mut sources: Vec<SourceHash> = files
        .into_iter()
        .map(|f| SourceHash {
            path: f.path.display().to_string(),
            sha256: bytes_to_hex(&Sha256::digest(f.text.as_bytes())),
        })
        .collect();
    sources.sort_by(|a, b| a.path.cmp(&b.path));

    Provenance {
        compiler_version: env!("CARGO_PKG_VERSION"),
        id_hash_algorithm: ID_HASH_ALGORITHM,
        sources,
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filer::{MemoryFiler, OutputKind};
    use crate::render::default_renderer;

    fn write_inputs(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, text) in files {
            let path = dir.path().join(name);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, text).unwrap();
        }
        dir
    }

    fn options(dir: &tempfile::TempDir, emit: EmitTarget) -> CompilerOptions {
        CompilerOptions {
            inputs: vec![dir.path().to_path_buf()],
            out_dir: PathBuf::from("out"),
            emit,
        }
    }

    const HELLO: &str = "interface Hello extends Actor { Task<String> hi(String who); }\n\
                         class HelloActor implements Hello;";

    #[test]
    fn two_rounds_then_settles() {
        let dir = write_inputs(&[("com/example/Hello.orbit", HELLO)]);
        let filer = MemoryFiler::new();
        let c = compile(&options(&dir, EmitTarget::All), &filer, &default_renderer()).unwrap();
        assert!(!c.has_errors(), "{:?}", c.diagnostics);
        assert_eq!(c.rounds, 2);
        assert_eq!(c.plans.len(), 1);
        assert_eq!(
            filer.paths(OutputKind::Source),
            vec!["com/example/HelloFactory.orbit", "com/example/hello.rs"]
        );
        assert_eq!(
            filer.paths(OutputKind::Resource),
            vec![
                "META-INF/orbit/actors/classes/com.example.HelloActor",
                "META-INF/orbit/actors/interfaces/com.example.Hello",
            ]
        );
        assert!(c
            .diagnostics
            .iter()
            .any(|d| d.code == Some(codes::I0001)));
    }

    #[test]
    fn plan_target_writes_nothing() {
        let dir = write_inputs(&[("com/example/Hello.orbit", HELLO)]);
        let filer = MemoryFiler::new();
        let c = compile(&options(&dir, EmitTarget::Plan), &filer, &default_renderer()).unwrap();
        assert_eq!(c.rounds, 1);
        assert_eq!(c.plans.len(), 1);
        assert!(filer.paths(OutputKind::Source).is_empty());
        assert!(filer.paths(OutputKind::Resource).is_empty());
    }

    #[test]
    fn build_info_runs_no_rounds() {
        let dir = write_inputs(&[("A.orbit", "interface A extends Actor {}")]);
        let filer = MemoryFiler::new();
        let c = compile(&options(&dir, EmitTarget::BuildInfo), &filer, &default_renderer())
            .unwrap();
        assert_eq!(c.rounds, 0);
        assert_eq!(c.inputs.len(), 1);
    }

    #[test]
    fn render_write_failure_skips_manifest_only_for_that_interface() {
        let dir = write_inputs(&[(
            "p/Two.orbit",
            "interface A extends Actor {} interface B extends Actor {}",
        )]);
        let filer = MemoryFiler::new().fail_on("p/a.rs");
        let c = compile(&options(&dir, EmitTarget::All), &filer, &default_renderer()).unwrap();
        let errors: Vec<&Diagnostic> = c.diagnostics.iter().filter(|d| d.is_error()).collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, Some(codes::E0401));
        assert_eq!(errors[0].origin.as_deref(), Some("p.A"));
        assert_eq!(
            filer.paths(OutputKind::Resource),
            vec!["META-INF/orbit/actors/interfaces/p.B"]
        );
    }

    #[test]
    fn syntax_errors_are_located() {
        let dir = write_inputs(&[("Bad.orbit", "interface A extends Actor { Task f() }")]);
        let filer = MemoryFiler::new();
        let c = compile(&options(&dir, EmitTarget::All), &filer, &default_renderer()).unwrap();
        let err = c.diagnostics.iter().find(|d| d.is_error()).unwrap();
        assert_eq!(err.code, Some(codes::E0101));
        let rendered = c.sources.render(err);
        assert!(rendered.contains("Bad.orbit:1:"), "{rendered}");
    }

    #[test]
    fn duplicate_reported_once_across_rounds() {
        let dir = write_inputs(&[
            ("p/A.orbit", "interface A extends Actor {}"),
            ("p/B.orbit", "interface A extends Actor {}"),
        ]);
        let filer = MemoryFiler::new();
        let c = compile(&options(&dir, EmitTarget::All), &filer, &default_renderer()).unwrap();
        let dups = c
            .diagnostics
            .iter()
            .filter(|d| d.code == Some(codes::E0102))
            .count();
        assert_eq!(dups, 1);
        assert_eq!(c.rounds, 2);
    }

    #[test]
    fn missing_input_is_source_error() {
        let options = CompilerOptions {
            inputs: vec![PathBuf::from("/no/such/input.orbit")],
            out_dir: PathBuf::from("out"),
            emit: EmitTarget::All,
        };
        let result = compile(&options, &MemoryFiler::new(), &default_renderer());
        assert!(matches!(result, Err(SourceError::Io { .. })));
    }

    #[test]
    fn provenance_is_sorted_and_hashed() {
        let mut map = SourceMap::new();
        map.add("b.orbit", "", None);
        map.add("a.orbit", "", None);
        let p = compute_provenance(map.files().map(|(_, f)| f));
        assert_eq!(p.id_hash_algorithm, "orbit-id-v1");
        assert_eq!(p.sources[0].path, "a.orbit");
        assert_eq!(
            p.sources[0].sha256,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert!(p.to_json().contains("\"compiler_version\""));
    }
}
