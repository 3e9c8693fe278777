// manifest.rs — Discovery manifests
//
// One resource per generated registrar and one per concrete actor class, so
// the runtime can enumerate both without scanning every compiled type:
//
//   META-INF/orbit/actors/interfaces/<interface binary name>  → registrar FQN
//   META-INF/orbit/actors/classes/<class binary name>         → binary name
//
// Each record is a single line without a trailing newline.
//
// Failure modes: write failures are reported as E0401 against the
//                originating declaration; nothing else is abandoned.
// Side effects: writes resources through the context's filer.

use crate::classify::implements_marker;
use crate::context::Context;
use crate::decl::{DeclKind, DeclarationSource};
use crate::diag::{codes, Diagnostic};
use crate::id::DeclId;
use crate::plan::GenerationPlan;
use crate::prelude;

pub const INTERFACES_DIR: &str = "META-INF/orbit/actors/interfaces";
pub const CLASSES_DIR: &str = "META-INF/orbit/actors/classes";

pub fn interface_manifest_path(binary_name: &str) -> String {
    format!("{}/{}", INTERFACES_DIR, binary_name)
}

pub fn class_manifest_path(binary_name: &str) -> String {
    format!("{}/{}", CLASSES_DIR, binary_name)
}

/// Map the interface's binary name to its registrar. Returns the resource
/// path when written.
pub fn register_interface(ctx: &Context<'_>, plan: &GenerationPlan) -> Option<String> {
    let path = interface_manifest_path(&plan.binary_name);
    write(ctx, plan.decl, &path, &plan.factory_qualified_name())
}

/// Concrete (non-abstract) classes that reach the actor marker, directly or
/// through their superclasses.
pub fn is_actor_class(src: &dyn DeclarationSource, id: DeclId) -> bool {
    src.kind(id) == DeclKind::Class
        && !src.is_abstract(id)
        && implements_marker(src, id, prelude::ACTOR)
}

/// List `id` as an instantiable actor class if it is one. Returns the
/// resource path when written.
pub fn register_class(ctx: &Context<'_>, id: DeclId) -> Option<String> {
    if !is_actor_class(ctx.decls, id) {
        return None;
    }
    let binary_name = ctx.decls.binary_name(id);
    let path = class_manifest_path(binary_name);
    write(ctx, id, &path, binary_name)
}

fn write(ctx: &Context<'_>, origin: DeclId, path: &str, contents: &str) -> Option<String> {
    match ctx.filer.create_resource(path, contents) {
        Ok(()) => {
            tracing::debug!(path, "registered");
            Some(path.to_string())
        }
        Err(err) => {
            ctx.report_at(
                origin,
                Diagnostic::error(codes::E0401, format!("cannot write manifest: {}", err)),
            );
            None
        }
    }
}
