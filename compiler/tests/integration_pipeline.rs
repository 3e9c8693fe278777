// Integration tests for the round driver through the library API.
//
// Each test writes `.orbit` sources into a temporary directory, compiles them
// with an in-memory filer, and checks diagnostics, generated paths, and
// manifest contents.

use std::path::{Path, PathBuf};

use orbc::diag::{codes, DiagCode, Diagnostic};
use orbc::filer::{DirFiler, MemoryFiler, OutputKind};
use orbc::pipeline::{compile, Compilation, CompilerOptions, EmitTarget};
use orbc::render::default_renderer;
use serde_json::json;

// ── Helpers ─────────────────────────────────────────────────────────────────

fn write_sources(dir: &Path, files: &[(&str, &str)]) {
    for (name, text) in files {
        let path = dir.join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, text).unwrap();
    }
}

fn options(input: &Path, emit: EmitTarget) -> CompilerOptions {
    CompilerOptions {
        inputs: vec![input.to_path_buf()],
        out_dir: PathBuf::from("orbc-out"),
        emit,
    }
}

fn compile_sources(files: &[(&str, &str)]) -> (Compilation, MemoryFiler) {
    let dir = tempfile::tempdir().unwrap();
    write_sources(dir.path(), files);
    let filer = MemoryFiler::new();
    let c = compile(&options(dir.path(), EmitTarget::All), &filer, &default_renderer())
        .expect("inputs readable");
    (c, filer)
}

fn error_codes(c: &Compilation) -> Vec<DiagCode> {
    c.diagnostics
        .iter()
        .filter(|d| d.is_error())
        .filter_map(|d| d.code)
        .collect()
}

fn errors_with(c: &Compilation, code: DiagCode) -> Vec<&Diagnostic> {
    c.diagnostics
        .iter()
        .filter(|d| d.code == Some(code))
        .collect()
}

fn plan_names(c: &Compilation) -> Vec<&str> {
    c.plans.iter().map(|p| p.interface_name.as_str()).collect()
}

// ── Classification ──────────────────────────────────────────────────────────

#[test]
fn actor_reached_through_two_levels_of_extension() {
    let (c, filer) = compile_sources(&[(
        "com/example/Chain.orbit",
        "interface Base extends Actor {}\n\
         interface Middle extends Base {}\n\
         interface Leaf extends Middle { Task<String> name(); }",
    )]);
    assert!(error_codes(&c).is_empty(), "{:?}", c.diagnostics);
    assert_eq!(
        plan_names(&c),
        vec!["com.example.Base", "com.example.Middle", "com.example.Leaf"]
    );
    assert!(c.plans.iter().all(|p| p.is_actor));
    assert_eq!(
        filer.get(
            OutputKind::Resource,
            "META-INF/orbit/actors/interfaces/com.example.Leaf"
        ),
        Some("com.example.LeafFactory".to_string())
    );
}

#[test]
fn observers_and_plain_interfaces() {
    let (c, filer) = compile_sources(&[(
        "p/Mixed.orbit",
        "interface Listener extends ActorObserver { Task<Void> changed(int v); }\n\
         interface Plain { void run(); }",
    )]);
    assert!(error_codes(&c).is_empty(), "{:?}", c.diagnostics);
    assert_eq!(plan_names(&c), vec!["p.Listener"]);
    assert!(!c.plans[0].is_actor);
    // A plain interface is neither validated nor registered.
    assert_eq!(
        filer.paths(OutputKind::Resource),
        vec!["META-INF/orbit/actors/interfaces/p.Listener"]
    );
}

#[test]
fn method_inherited_from_plain_interface_joins_the_actor() {
    let (c, _) = compile_sources(&[(
        "p/Inherit.orbit",
        "interface Named { Task<String> name(); }\n\
         interface Person extends Actor, Named { Task<Integer> age(); }",
    )]);
    assert!(error_codes(&c).is_empty(), "{:?}", c.diagnostics);
    let sigs: Vec<String> = c.plans[0].methods.iter().map(|m| m.signature()).collect();
    assert_eq!(sigs, vec!["age()", "name()"]);
    assert_eq!(c.plans[0].methods[1].declared_in, "p.Named");
}

// ── Remote-call contract ────────────────────────────────────────────────────

#[test]
fn return_type_gate() {
    let (c, _) = compile_sources(&[(
        "p/Gate.orbit",
        "interface Gate extends Actor {\n\
             void a();\n\
             String b();\n\
             Task<String>[] c();\n\
             Task<String> ok();\n\
         }",
    )]);
    assert_eq!(
        error_codes(&c),
        vec![codes::E0201, codes::E0202, codes::E0202]
    );
    assert_eq!(errors_with(&c, codes::E0201)[0].origin.as_deref(), Some("p.Gate#a"));
    // Invalid methods are dropped; the interface is still generated.
    assert_eq!(c.plans.len(), 1);
    let names: Vec<&str> = c.plans[0].methods.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["ok"]);
}

#[test]
fn one_way_gate() {
    let (c, _) = compile_sources(&[(
        "p/OneWays.orbit",
        "interface Fire extends Actor {\n\
             @OneWay Task raw();\n\
             @OneWay Task<Void> unit();\n\
             @OneWay Task<String> typed();\n\
         }",
    )]);
    assert_eq!(error_codes(&c), vec![codes::E0203]);
    assert_eq!(errors_with(&c, codes::E0203)[0].origin.as_deref(), Some("p.Fire#typed"));
    assert!(c.plans[0].methods.iter().all(|m| m.oneway));
    assert_eq!(c.plans[0].methods.len(), 2);
}

#[test]
fn marker_misuse_is_reported() {
    let (c, _) = compile_sources(&[(
        "p/Markers.orbit",
        "@StatelessWorker interface Obs extends ActorObserver {}\n\
         @NoIdentity class Impl;\n\
         @StatelessWorker interface Worker extends Actor {}\n\
         @NoIdentity interface Singleton extends Actor {}",
    )]);
    assert_eq!(error_codes(&c), vec![codes::E0205, codes::E0204]);
    let singleton = c
        .plans
        .iter()
        .find(|p| p.interface_name == "p.Singleton")
        .unwrap();
    assert!(singleton.is_no_identity);
}

#[test]
fn library_markers_reach_plans_and_dispatchers() {
    let (c, filer) = compile_sources(&[(
        "p/A.orbit",
        "interface A extends Actor { @OneWay Task<String> typed(); @OneWay Task<Void> fire(); }\n\
         @StatelessWorker class Impl implements A;",
    )]);
    assert_eq!(error_codes(&c), vec![codes::E0204, codes::E0203]);
    assert!(errors_with(&c, codes::E0101).is_empty(), "{:?}", c.diagnostics);
    assert_eq!(c.rounds, 2);

    let fire = &c.plans[0].methods[0];
    assert_eq!(fire.name, "fire");
    assert!(fire.oneway);
    let rust = filer.get(OutputKind::Source, "p/a.rs").unwrap();
    assert!(rust.contains("target.fire();\n                Ok(None)"));
}

#[test]
fn parameter_names_must_be_distinct() {
    let (c, filer) = compile_sources(&[(
        "p/Params.orbit",
        "interface Dup extends Actor { Task<Void> f(int a, int a); Task<Void> ok(); }\n\
         interface Snake extends Actor { Task<Void> g(int fooBar, int foo_bar); }",
    )]);
    assert_eq!(error_codes(&c), vec![codes::E0206, codes::E0402]);
    assert_eq!(errors_with(&c, codes::E0206)[0].origin.as_deref(), Some("p.Dup#f"));
    assert_eq!(errors_with(&c, codes::E0402)[0].origin.as_deref(), Some("p.Snake"));

    let dup = c.plans.iter().find(|p| p.interface_name == "p.Dup").unwrap();
    let names: Vec<&str> = dup.methods.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["ok"]);
    assert!(filer.get(OutputKind::Source, "p/dup.rs").is_some());
    assert!(filer.get(OutputKind::Source, "p/snake.rs").is_none());
}

#[test]
fn dropped_supertypes_are_reported() {
    let (c, _) = compile_sources(&[(
        "p/Shapes.orbit",
        "interface Hello extends Actor { Task<Void> hi(); }\n\
         class Base;\n\
         class HelloActor extends Base, Hello;\n\
         interface X implements Actor { Task<Void> f(); }",
    )]);
    assert_eq!(error_codes(&c), vec![codes::E0103, codes::E0103]);
    let origins: Vec<Option<&str>> = errors_with(&c, codes::E0103)
        .iter()
        .map(|d| d.origin.as_deref())
        .collect();
    assert_eq!(origins, vec![Some("p.HelloActor"), Some("p.X")]);
}

#[test]
fn every_violation_in_one_build_is_reported() {
    let (c, _) = compile_sources(&[
        ("p/A.orbit", "interface A extends Actor { void x(); }"),
        ("p/B.orbit", "interface B extends Actor { int y(); }"),
        ("p/C.orbit", "interface C extends Actor { @OneWay Task<Long> z(); }"),
        ("q/Broken.orbit", "interface Broken extends Actor { Task f( }"),
    ]);
    let mut codes_seen = error_codes(&c);
    codes_seen.sort_by_key(|code| code.0);
    codes_seen.dedup();
    assert_eq!(
        codes_seen,
        vec![codes::E0101, codes::E0201, codes::E0202, codes::E0203]
    );
    // The well-formed interfaces are still planned.
    assert_eq!(plan_names(&c), vec!["p.A", "p.B", "p.C"]);
}

// ── Generation and manifests ────────────────────────────────────────────────

#[test]
fn registrar_manifest_names_factory() {
    let (c, filer) = compile_sources(&[(
        "pkg/Foo.orbit",
        "interface IFoo extends Actor { Task<Void> go(); }\nclass FooActor implements IFoo;",
    )]);
    assert!(!c.has_errors(), "{:?}", c.diagnostics);
    assert_eq!(
        filer.get(OutputKind::Resource, "META-INF/orbit/actors/interfaces/pkg.IFoo"),
        Some("pkg.FooFactory".to_string())
    );
    assert_eq!(
        filer.get(OutputKind::Resource, "META-INF/orbit/actors/classes/pkg.FooActor"),
        Some("pkg.FooActor".to_string())
    );
    let rust = filer.get(OutputKind::Source, "pkg/foo.rs").unwrap();
    assert!(rust.contains("pub struct FooReference"));
    assert!(rust.contains("pub struct FooInvoker"));
    assert!(rust.contains("pub struct FooFactory"));
}

#[test]
fn second_round_ingests_stubs_and_generates_nothing() {
    let (c, filer) = compile_sources(&[(
        "p/Hello.orbit",
        "interface Hello extends Actor { Task<String> hi(); }",
    )]);
    assert_eq!(c.rounds, 2);
    assert_eq!(c.plans.len(), 1, "generated stubs must not be planned again");
    assert_eq!(c.generated, vec!["p/hello.rs", "p/HelloFactory.orbit"]);
    let stub = filer.get(OutputKind::Source, "p/HelloFactory.orbit").unwrap();
    assert!(stub.contains("@orbit.actors.annotation.Generated"));
    assert!(stub.contains("class HelloReference implements p.Hello;"));
}

#[test]
fn compiling_twice_is_deterministic() {
    let files = [
        (
            "com/example/Hello.orbit",
            "/** Greets. */\n\
             interface IHello extends Actor {\n\
                 Task<String> sayHello(String greeting, int times);\n\
                 Task<String> sayHello(String greeting);\n\
                 @OneWay Task<Void> poke();\n\
             }",
        ),
        ("com/example/Impl.orbit", "class HelloActor implements IHello;"),
    ];
    let (a, fa) = compile_sources(&files);
    let (b, fb) = compile_sources(&files);
    assert_eq!(a.plans, b.plans);
    for kind in [OutputKind::Source, OutputKind::Resource] {
        assert_eq!(fa.paths(kind), fb.paths(kind));
        for path in fa.paths(kind) {
            assert_eq!(fa.get(kind, &path), fb.get(kind, &path), "{path}");
        }
    }
}

#[test]
fn write_failure_spares_other_interfaces() {
    let dir = tempfile::tempdir().unwrap();
    write_sources(
        dir.path(),
        &[(
            "p/Two.orbit",
            "interface Alpha extends Actor {}\ninterface Beta extends Actor {}",
        )],
    );
    let filer = MemoryFiler::new().fail_on("META-INF/orbit/actors/interfaces/p.Alpha");
    let c = compile(&options(dir.path(), EmitTarget::All), &filer, &default_renderer()).unwrap();
    assert_eq!(error_codes(&c), vec![codes::E0401]);
    assert_eq!(
        filer.paths(OutputKind::Resource),
        vec!["META-INF/orbit/actors/interfaces/p.Beta"]
    );
    // Alpha's sources were still generated.
    assert!(filer.get(OutputKind::Source, "p/alpha.rs").is_some());
}

#[test]
fn dir_filer_lays_out_sources_and_resources() {
    let input = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_sources(
        input.path(),
        &[("p/Hello.orbit", "interface Hello extends Actor { Task<Void> hi(); }")],
    );
    let filer = DirFiler::new(out.path());
    let c = compile(&options(input.path(), EmitTarget::All), &filer, &default_renderer()).unwrap();
    assert!(!c.has_errors(), "{:?}", c.diagnostics);
    assert!(out.path().join("src/p/hello.rs").is_file());
    assert!(out.path().join("src/p/HelloFactory.orbit").is_file());
    let manifest = out
        .path()
        .join("resources/META-INF/orbit/actors/interfaces/p.Hello");
    assert_eq!(std::fs::read_to_string(manifest).unwrap(), "p.HelloFactory");
}

// ── Plans as a contract ─────────────────────────────────────────────────────

#[test]
fn plan_round_trips_a_call_positionally() {
    let dir = tempfile::tempdir().unwrap();
    write_sources(
        dir.path(),
        &[(
            "p/Greeter.orbit",
            "interface Greeter extends Actor { Task<String> greet(String name, int times, boolean loud); }",
        )],
    );
    let c = compile(
        &options(dir.path(), EmitTarget::Plan),
        &MemoryFiler::new(),
        &default_renderer(),
    )
    .unwrap();
    let plan = &c.plans[0];
    let call = plan
        .proxy_call(
            "greet(orbit.lang.String,int,boolean)",
            &[("loud", json!(true)), ("name", json!("ada")), ("times", json!(3))],
        )
        .unwrap();
    assert_eq!(call.invocation.args, vec![json!("ada"), json!(3), json!(true)]);
    assert!(call.awaits_reply);

    let bound = plan.dispatch(&call.invocation).unwrap();
    assert_eq!(bound.method.name, "greet");
    assert_eq!(
        bound.arguments,
        vec![("name", &json!("ada")), ("times", &json!(3)), ("loud", &json!(true))]
    );
}
