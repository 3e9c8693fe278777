// validate.rs — Remote-call contract checks
//
// Every check reports through the context and keeps going, so one round
// surfaces every violation. Methods that break the contract are removed from
// their descriptor; an interface left with no methods is still generated.
//
// Rules:
//   - a method returning `void` is rejected (E0201);
//   - any other return type that is not the task wrapper is rejected (E0202);
//   - the task wrapper takes at most one type argument (E0202);
//   - a one-way method must return `Task<Void>` or raw `Task` (E0203);
//   - parameter names of one method are distinct (E0206);
//   - the stateless-worker and no-identity markers belong on actor
//     interfaces only (E0204, E0205), including on annotation declarations;
//   - distinct signatures of one interface must not share a method id
//     (E0301), and interfaces of one round must not share an interface id
//     (E0302).

use std::collections::{BTreeMap, HashSet};

use crate::context::Context;
use crate::decl::{DeclarationSource, MemberRef, ResolvedType};
use crate::describe::{InterfaceDescriptor, MethodDescriptor};
use crate::diag::{codes, DiagCode, Diagnostic};
use crate::id::{DeclId, InterfaceId, MethodId};
use crate::prelude;
use crate::walk::Candidates;

// ── Methods ─────────────────────────────────────────────────────────────────

/// Check each method of `descriptor` and drop the ones that fail.
pub fn validate_methods(ctx: &Context<'_>, descriptor: &mut InterfaceDescriptor) {
    descriptor.methods.retain(|method| match check_method(method) {
        Ok(()) => true,
        Err(violation) => {
            ctx.report(
                violation
                    .at(method.location)
                    .from_origin(method.origin_name()),
            );
            false
        }
    });
}

fn check_method(method: &MethodDescriptor) -> Result<(), Diagnostic> {
    let ret = &method.return_type;
    if ret.is_raw("void") {
        return Err(Diagnostic::error(
            codes::E0201,
            "remote methods cannot return void",
        )
        .with_hint("return `Task<Void>` for methods without a result"));
    }
    if ret.name != prelude::TASK || ret.array_dims > 0 || ret.args.len() > 1 {
        return Err(Diagnostic::error(
            codes::E0202,
            format!("remote methods must return `{}`, found `{}`", prelude::TASK, ret),
        ));
    }
    if method.oneway && !is_void_task(ret) {
        return Err(Diagnostic::error(
            codes::E0203,
            format!("one-way methods cannot return a result, found `{}`", ret),
        )
        .with_hint("declare the method as returning `Task<Void>` or `Task`"));
    }
    for (index, param) in method.params.iter().enumerate() {
        if method.params[..index].iter().any(|p| p.name == param.name) {
            return Err(Diagnostic::error(
                codes::E0206,
                format!("parameter `{}` is declared more than once", param.name),
            ));
        }
    }
    Ok(())
}

/// `Task` or `Task<Void>`.
fn is_void_task(ret: &ResolvedType) -> bool {
    ret.is_raw(prelude::TASK)
        || (ret.name == prelude::TASK
            && ret.array_dims == 0
            && matches!(ret.args.as_slice(), [arg] if arg.is_raw(prelude::VOID)))
}

// ── Markers ─────────────────────────────────────────────────────────────────

/// Report stateless-worker and no-identity markers on anything other than an
/// actor interface, including annotation declarations and methods.
pub fn validate_markers(ctx: &Context<'_>, candidates: &Candidates, actors: &HashSet<DeclId>) {
    let src = ctx.decls;
    for id in candidates.all() {
        if !actors.contains(&id) {
            for (marker, code) in markers() {
                if src.has_annotation(id, marker) {
                    ctx.report_at(id, marker_misuse(marker, code));
                }
            }
        }
        for member in src.list_members(id) {
            let MemberRef::Method(mref) = member else {
                continue;
            };
            let method = src.method(*mref);
            for (marker, code) in markers() {
                if method.annotations.iter().any(|a| a.name == marker) {
                    ctx.report(
                        marker_misuse(marker, code)
                            .at(method.location)
                            .from_origin(format!("{}#{}", src.qualified_name(id), method.name)),
                    );
                }
            }
        }
    }
}

fn markers() -> [(&'static str, DiagCode); 2] {
    [
        (prelude::STATELESS_WORKER, codes::E0204),
        (prelude::NO_IDENTITY, codes::E0205),
    ]
}

fn marker_misuse(marker: &str, code: DiagCode) -> Diagnostic {
    Diagnostic::error(
        code,
        format!("the @{} annotation must be used only with actor interfaces", marker),
    )
}

// ── Identifier collisions ───────────────────────────────────────────────────

/// Detect id collisions after ids are assigned. Colliding methods are
/// reported pairwise and removed from their interface; colliding interfaces
/// are reported only.
pub fn check_collisions(ctx: &Context<'_>, descriptors: &mut [InterfaceDescriptor]) {
    for descriptor in descriptors.iter_mut() {
        check_method_collisions(ctx, descriptor);
    }

    let mut by_id: BTreeMap<InterfaceId, Vec<&InterfaceDescriptor>> = BTreeMap::new();
    for descriptor in descriptors.iter() {
        by_id
            .entry(descriptor.interface_id())
            .or_default()
            .push(descriptor);
    }
    for (id, group) in by_id {
        for pair in group.windows(2) {
            ctx.report_at(
                pair[1].decl,
                Diagnostic::error(
                    codes::E0302,
                    format!(
                        "interface id {} of `{}` collides with `{}`",
                        id, pair[1].qualified_name, pair[0].qualified_name
                    ),
                )
                .with_hint("rename one of the interfaces"),
            );
        }
    }
}

fn check_method_collisions(ctx: &Context<'_>, descriptor: &mut InterfaceDescriptor) {
    let mut by_id: BTreeMap<MethodId, Vec<usize>> = BTreeMap::new();
    for (index, method) in descriptor.methods.iter().enumerate() {
        if let Some(id) = method.method_id {
            by_id.entry(id).or_default().push(index);
        }
    }

    let mut colliding = HashSet::new();
    for (id, group) in &by_id {
        if group.len() < 2 {
            continue;
        }
        for pair in group.windows(2) {
            let (first, second) = (&descriptor.methods[pair[0]], &descriptor.methods[pair[1]]);
            ctx.report_at(
                descriptor.decl,
                Diagnostic::error(
                    codes::E0301,
                    format!(
                        "method id {} of `{}` collides with `{}`",
                        id,
                        second.signature(),
                        first.signature()
                    ),
                )
                .with_hint("rename one of the methods"),
            );
        }
        colliding.extend(group.iter().copied());
    }

    if !colliding.is_empty() {
        let mut index = 0;
        descriptor.methods.retain(|_| {
            let keep = !colliding.contains(&index);
            index += 1;
            keep
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{classify, Classification};
    use crate::decl::{table_from, DeclTable};
    use crate::describe::describe;
    use crate::diag::DiagnosticBuffer;
    use crate::filer::MemoryFiler;
    use crate::walk::walk;

    fn validated(source: &str, name: &str) -> (InterfaceDescriptor, Vec<Diagnostic>) {
        let (table, _) = table_from(&[source]);
        let filer = MemoryFiler::new();
        let diags = DiagnosticBuffer::new();
        let ctx = Context::new(&table, &filer, &diags);
        let id = table.lookup(name).expect("declared");
        let mut d = describe(&table, id, true);
        validate_methods(&ctx, &mut d);
        (d, diags.into_inner())
    }

    fn codes_of(diags: &[Diagnostic]) -> Vec<DiagCode> {
        diags.iter().filter_map(|d| d.code).collect()
    }

    fn names(d: &InterfaceDescriptor) -> Vec<&str> {
        d.methods.iter().map(|m| m.name.as_str()).collect()
    }

    #[test]
    fn task_returns_accepted() {
        let (d, diags) = validated(
            "package p; interface A extends Actor {\n\
             Task<String> a(); Task b(); Task<Void> c(); Task<int[]> d();\n\
             }",
            "p.A",
        );
        assert!(diags.is_empty(), "{diags:?}");
        assert_eq!(names(&d), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn void_return_rejected_once() {
        let (d, diags) = validated(
            "package p; interface A extends Actor { void a(); Task ok(); }",
            "p.A",
        );
        assert_eq!(codes_of(&diags), vec![codes::E0201]);
        assert_eq!(diags[0].origin.as_deref(), Some("p.A#a"));
        assert!(diags[0].location.is_some());
        assert_eq!(names(&d), vec!["ok"]);
    }

    #[test]
    fn non_task_returns_rejected() {
        let (d, diags) = validated(
            "package p; interface A extends Actor {\n\
             String a(); Void b(); TaskLike c(); Task[] d(); int e(); Task<String, int> f();\n\
             }",
            "p.A",
        );
        assert_eq!(codes_of(&diags), vec![codes::E0202; 6]);
        assert!(d.methods.is_empty());
    }

    #[test]
    fn oneway_gate() {
        let (d, diags) = validated(
            "package p; interface A extends Actor {\n\
             @OneWay Task raw();\n\
             @OneWay Task<Void> unit();\n\
             @OneWay Task<String> typed();\n\
             @OneWay Task<Void[]> arr();\n\
             }",
            "p.A",
        );
        assert_eq!(codes_of(&diags), vec![codes::E0203, codes::E0203]);
        assert_eq!(names(&d), vec!["raw", "unit"]);
    }

    #[test]
    fn every_violation_reported() {
        let (_, diags) = validated(
            "package p; interface A extends Actor { void a(); int b(); @OneWay Task<Long> c(); }",
            "p.A",
        );
        assert_eq!(
            codes_of(&diags),
            vec![codes::E0201, codes::E0202, codes::E0203]
        );
    }

    #[test]
    fn duplicate_parameter_names_rejected() {
        let (d, diags) = validated(
            "package p; interface A extends Actor {\n\
             Task<Void> f(int a, int a);\n\
             Task<Void> g(int a, String b, long a);\n\
             Task<Void> h(int fooBar, int foo_bar);\n\
             }",
            "p.A",
        );
        assert_eq!(codes_of(&diags), vec![codes::E0206, codes::E0206]);
        assert_eq!(diags[0].origin.as_deref(), Some("p.A#f"));
        assert!(diags[1].message.contains("`a`"));
        assert_eq!(names(&d), vec!["h"]);
    }

    fn marker_diags(source: &str) -> Vec<Diagnostic> {
        let (table, _) = table_from(&[source]);
        let candidates = walk(&table);
        let actors: HashSet<DeclId> = candidates
            .interfaces
            .iter()
            .copied()
            .filter(|id| classify(&table, *id) == Classification::Actor)
            .collect();
        let filer = MemoryFiler::new();
        let diags = DiagnosticBuffer::new();
        validate_markers(&Context::new(&table, &filer, &diags), &candidates, &actors);
        diags.into_inner()
    }

    #[test]
    fn markers_on_actor_interfaces_accepted() {
        let diags = marker_diags(
            "package p; @StatelessWorker @NoIdentity interface A extends Actor { Task f(); }",
        );
        assert!(diags.is_empty(), "{diags:?}");
    }

    #[test]
    fn markers_elsewhere_rejected() {
        let diags = marker_diags(
            "package p;\n\
             @StatelessWorker class Impl;\n\
             @NoIdentity interface Obs extends ActorObserver {}\n\
             interface A extends Actor { @StatelessWorker Task f(); }\n\
             @StatelessWorker annotation Tag;\n\
             @Generated @NoIdentity class Skipped;",
        );
        let mut got: Vec<(DiagCode, String)> = diags
            .iter()
            .map(|d| (d.code.unwrap(), d.origin.clone().unwrap()))
            .collect();
        got.sort_by(|a, b| a.1.cmp(&b.1));
        assert_eq!(
            got,
            vec![
                (codes::E0204, "p.A#f".to_string()),
                (codes::E0204, "p.Impl".to_string()),
                (codes::E0205, "p.Obs".to_string()),
                (codes::E0204, "p.Tag".to_string()),
            ]
        );
    }

    fn descriptor(table: &DeclTable, name: &str) -> InterfaceDescriptor {
        let mut d = describe(table, table.lookup(name).unwrap(), true);
        d.assign_ids();
        d
    }

    #[test]
    fn distinct_ids_pass_collision_check() {
        let (table, _) = table_from(&[
            "package p; interface A extends Actor { Task f(); Task g(int x); }\n\
             interface B extends Actor { Task f(); }",
        ]);
        let mut ds = vec![descriptor(&table, "p.A"), descriptor(&table, "p.B")];
        let filer = MemoryFiler::new();
        let diags = DiagnosticBuffer::new();
        check_collisions(&Context::new(&table, &filer, &diags), &mut ds);
        assert!(!diags.has_errors());
        assert_eq!(ds[0].methods.len(), 2);
    }

    #[test]
    fn method_id_collision_reported_and_dropped() {
        let (table, _) = table_from(&[
            "package p; interface A extends Actor { Task f(); Task g(); Task h(); }",
        ]);
        let mut d = descriptor(&table, "p.A");
        // Force a collision between f and h.
        d.methods[2].method_id = d.methods[0].method_id;
        let mut ds = vec![d];
        let filer = MemoryFiler::new();
        let diags = DiagnosticBuffer::new();
        check_collisions(&Context::new(&table, &filer, &diags), &mut ds);
        let reported = diags.into_inner();
        assert_eq!(codes_of(&reported), vec![codes::E0301]);
        assert!(reported[0].message.contains("h()"));
        assert!(reported[0].message.contains("f()"));
        assert_eq!(names(&ds[0]), vec!["g"]);
    }

    #[test]
    fn interface_id_collision_reported() {
        let (table, _) = table_from(&[
            "package p; interface A extends Actor {} interface B extends Actor {}",
        ]);
        let a = descriptor(&table, "p.A");
        let mut b = descriptor(&table, "p.B");
        b.qualified_name = a.qualified_name.clone();
        let mut ds = vec![a, b];
        let filer = MemoryFiler::new();
        let diags = DiagnosticBuffer::new();
        check_collisions(&Context::new(&table, &filer, &diags), &mut ds);
        assert_eq!(codes_of(&diags.into_inner()), vec![codes::E0302]);
    }
}
