// Snapshot tests: lock the JSON shape of generation plans (`--emit plan`),
// which downstream tooling reads.
//
// Snapshots are managed by `insta` and stored under `compiler/tests/snapshots/`.
// Run `cargo insta review` after intentional output changes to update baselines.

use orbc::filer::MemoryFiler;
use orbc::pipeline::{compile, CompilerOptions, EmitTarget};
use orbc::render::default_renderer;

fn plan_json(package_dir: &str, file: &str, source: &str) -> String {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(package_dir);
    std::fs::create_dir_all(&path).unwrap();
    std::fs::write(path.join(file), source).unwrap();

    let options = CompilerOptions {
        inputs: vec![dir.path().to_path_buf()],
        out_dir: "orbc-out".into(),
        emit: EmitTarget::Plan,
    };
    let c = compile(&options, &MemoryFiler::new(), &default_renderer()).unwrap();
    assert!(!c.has_errors(), "{:?}", c.diagnostics);
    assert_eq!(c.plans.len(), 1);
    serde_json::to_string_pretty(&c.plans[0]).unwrap()
}

#[test]
fn snapshot_hello_plan() {
    let json = plan_json(
        "com/example",
        "Hello.orbit",
        "/** Greets callers. */\n\
         interface Hello extends Actor {\n\
             Task<String> greet(String who);\n\
             @OneWay\n\
             Task ping();\n\
         }\n",
    );
    insta::assert_snapshot!(json);
}
