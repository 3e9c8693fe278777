// context.rs — Per-round context handed to every pass
//
// Bundles the three collaborators a pass may touch: the declaration graph,
// the output writer, and the diagnostic sink. Passes receive it by shared
// reference and keep no state of their own between rounds.

use crate::decl::DeclarationSource;
use crate::diag::{Diagnostic, DiagnosticSink};
use crate::filer::Filer;
use crate::id::DeclId;

#[derive(Clone, Copy)]
pub struct Context<'a> {
    pub decls: &'a dyn DeclarationSource,
    pub filer: &'a dyn Filer,
    pub diags: &'a dyn DiagnosticSink,
}

impl<'a> Context<'a> {
    pub fn new(
        decls: &'a dyn DeclarationSource,
        filer: &'a dyn Filer,
        diags: &'a dyn DiagnosticSink,
    ) -> Self {
        Self {
            decls,
            filer,
            diags,
        }
    }

    pub fn report(&self, diagnostic: Diagnostic) {
        self.diags.report(diagnostic);
    }

    /// Report against a declaration: attaches its location and, unless one
    /// is already set, its qualified name as the origin.
    pub fn report_at(&self, id: DeclId, diagnostic: Diagnostic) {
        let mut diagnostic = diagnostic.at(self.decls.location(id));
        if diagnostic.origin.is_none() {
            diagnostic = diagnostic.from_origin(self.decls.qualified_name(id));
        }
        self.diags.report(diagnostic);
    }
}
