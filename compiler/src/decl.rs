// decl.rs — Declaration inspection over parsed compilation units
//
// `DeclarationSource` is the narrow capability every later pass reads the
// declaration graph through. `DeclTable` implements it over the units of one
// build: an arena of type declarations and methods with every type reference
// resolved to its fully-qualified name.
//
// Preconditions: units come from `parser::parse`; library units (prelude,
//                earlier rounds) are passed alongside the round's new units.
// Postconditions: every registered declaration has unique qualified and
//                 binary names; roots are the top-level declarations of the
//                 new units, in input order.
// Failure modes: a duplicate qualified name reports E0102 against the second
//                declaration, which is then left out of the table.
// Side effects: reports diagnostics.

use std::collections::HashMap;
use std::fmt;

use serde::{Serialize, Serializer};

use crate::ast::{self, CompilationUnit, Member as AstMember, QualifiedName, TypeDecl};
use crate::diag::{codes, Diagnostic, DiagnosticSink};
use crate::id::{DeclId, MethodRef};
use crate::prelude;
use crate::source::{FileId, Location};

pub use crate::ast::TypeDeclKind as DeclKind;

// ── Resolved model ──────────────────────────────────────────────────────────

/// A type reference with its name resolved. `Display` gives the canonical
/// type string: `pkg.Type<pkg.Arg1,pkg.Arg2>[]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedType {
    pub name: String,
    pub args: Vec<ResolvedType>,
    pub array_dims: u8,
}

impl ResolvedType {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            array_dims: 0,
        }
    }

    pub fn with_args(mut self, args: Vec<ResolvedType>) -> Self {
        self.args = args;
        self
    }

    /// True for the bare, non-array type `name`.
    pub fn is_raw(&self, name: &str) -> bool {
        self.name == name && self.args.is_empty() && self.array_dims == 0
    }
}

impl fmt::Display for ResolvedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.args.is_empty() {
            write!(f, "<")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write!(f, "{}", arg)?;
            }
            write!(f, ">")?;
        }
        for _ in 0..self.array_dims {
            write!(f, "[]")?;
        }
        Ok(())
    }
}

impl Serialize for ResolvedType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// An annotation with its name resolved. Arguments are carried as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationRef {
    pub name: String,
    pub args: Vec<String>,
}

impl fmt::Display for AnnotationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.name)?;
        if !self.args.is_empty() {
            write!(f, "({})", self.args.join(", "))?;
        }
        Ok(())
    }
}

impl Serialize for AnnotationRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamInfo {
    pub name: String,
    pub ty: ResolvedType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodInfo {
    pub name: String,
    pub doc: Option<String>,
    pub annotations: Vec<AnnotationRef>,
    pub return_type: ResolvedType,
    pub params: Vec<ParamInfo>,
    /// The type declaration this method is declared in.
    pub enclosing: DeclId,
    pub location: Option<Location>,
}

/// A member of a type declaration, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberRef {
    Type(DeclId),
    Method(MethodRef),
}

// ── Inspection capability ───────────────────────────────────────────────────

/// Read-only view of the declaration graph of one round.
pub trait DeclarationSource {
    /// Top-level declarations of the round's new units.
    fn roots(&self) -> &[DeclId];
    fn kind(&self, id: DeclId) -> DeclKind;
    /// Nested declarations and methods, in declaration order.
    fn list_members(&self, id: DeclId) -> &[MemberRef];
    /// Interfaces: the `extends` list. Classes: the `implements` list.
    fn extended_interfaces(&self, id: DeclId) -> &[ResolvedType];
    /// Classes only.
    fn superclass(&self, id: DeclId) -> Option<&ResolvedType>;
    fn annotations_of(&self, id: DeclId) -> &[AnnotationRef];
    fn doc_of(&self, id: DeclId) -> Option<&str>;
    fn method(&self, method: MethodRef) -> &MethodInfo;
    fn simple_name(&self, id: DeclId) -> &str;
    /// `pkg.Outer.Inner`
    fn qualified_name(&self, id: DeclId) -> &str;
    /// `pkg.Outer$Inner`
    fn binary_name(&self, id: DeclId) -> &str;
    fn package(&self, id: DeclId) -> &str;
    fn is_abstract(&self, id: DeclId) -> bool;
    fn location(&self, id: DeclId) -> Option<Location>;
    fn lookup(&self, qualified_name: &str) -> Option<DeclId>;

    fn has_annotation(&self, id: DeclId, annotation: &str) -> bool {
        self.annotations_of(id).iter().any(|a| a.name == annotation)
    }
}

// ── Table ───────────────────────────────────────────────────────────────────

/// One compilation unit handed to `DeclTable::build`.
#[derive(Debug, Clone, Copy)]
pub struct UnitInput<'a> {
    pub unit: &'a CompilationUnit,
    pub file: FileId,
    /// Package to use when the unit declares none.
    pub package_hint: Option<&'a str>,
    /// Whether the unit's top-level declarations are roots of this round.
    pub is_root: bool,
}

#[derive(Debug)]
struct DeclEntry {
    kind: DeclKind,
    simple_name: String,
    qualified_name: String,
    binary_name: String,
    package: String,
    doc: Option<String>,
    is_abstract: bool,
    annotations: Vec<AnnotationRef>,
    interfaces: Vec<ResolvedType>,
    superclass: Option<ResolvedType>,
    members: Vec<MemberRef>,
    enclosing: Option<DeclId>,
    location: Location,
}

#[derive(Debug, Default)]
pub struct DeclTable {
    decls: Vec<DeclEntry>,
    methods: Vec<MethodInfo>,
    roots: Vec<DeclId>,
    by_name: HashMap<String, DeclId>,
}

/// A registered declaration awaiting resolution: its syntax, its unit, and
/// the ids given to its nested declarations (`None` for methods and for
/// rejected duplicates).
struct Pending<'a> {
    id: DeclId,
    syntax: &'a TypeDecl,
    unit: usize,
    nested: Vec<Option<DeclId>>,
}

impl DeclTable {
    /// Register every declaration, then resolve every type reference.
    pub fn build(units: &[UnitInput<'_>], diags: &dyn DiagnosticSink) -> Self {
        let mut table = DeclTable::default();
        let mut pending = Vec::new();

        for (index, input) in units.iter().enumerate() {
            let package = input
                .unit
                .package
                .as_ref()
                .map(QualifiedName::dotted)
                .or_else(|| input.package_hint.map(str::to_string))
                .unwrap_or_default();
            for decl in &input.unit.decls {
                let id = table.register(decl, &package, None, index, input.file, diags, &mut pending);
                if let (Some(id), true) = (id, input.is_root) {
                    table.roots.push(id);
                }
            }
        }

        let scopes: Vec<ImportScope> = units.iter().map(|u| ImportScope::of(u.unit)).collect();
        for item in &pending {
            table.resolve_decl(item, &scopes[item.unit], units[item.unit].file);
        }
        table
    }

    #[allow(clippy::too_many_arguments)]
    fn register<'a>(
        &mut self,
        decl: &'a TypeDecl,
        package: &str,
        enclosing: Option<DeclId>,
        unit: usize,
        file: FileId,
        diags: &dyn DiagnosticSink,
        pending: &mut Vec<Pending<'a>>,
    ) -> Option<DeclId> {
        let simple = decl.name.name.clone();
        let (qualified_name, binary_name) = match enclosing {
            Some(outer) => {
                let outer = &self.decls[outer.0 as usize];
                (
                    format!("{}.{}", outer.qualified_name, simple),
                    format!("{}${}", outer.binary_name, simple),
                )
            }
            None if package.is_empty() => (simple.clone(), simple.clone()),
            None => {
                let q = format!("{}.{}", package, simple);
                (q.clone(), q)
            }
        };
        let location = Location {
            file,
            span: decl.name.span,
        };

        if self.by_name.contains_key(&qualified_name) {
            diags.report(
                Diagnostic::error(
                    codes::E0102,
                    format!("duplicate declaration of `{}`", qualified_name),
                )
                .at(Some(location))
                .from_origin(qualified_name),
            );
            return None;
        }

        Self::check_supertypes(decl, &qualified_name, file, diags);

        let id = DeclId(self.decls.len() as u32);
        self.by_name.insert(qualified_name.clone(), id);
        self.decls.push(DeclEntry {
            kind: decl.kind,
            simple_name: simple,
            qualified_name,
            binary_name,
            package: package.to_string(),
            doc: decl.doc.clone(),
            is_abstract: decl.is_abstract,
            annotations: Vec::new(),
            interfaces: Vec::new(),
            superclass: None,
            members: Vec::new(),
            enclosing,
            location,
        });

        let slot = pending.len();
        pending.push(Pending {
            id,
            syntax: decl,
            unit,
            nested: Vec::new(),
        });
        let mut nested = Vec::with_capacity(decl.members.len());
        for member in &decl.members {
            nested.push(match member {
                AstMember::Type(inner) => {
                    self.register(inner, package, Some(id), unit, file, diags, pending)
                }
                AstMember::Method(_) => None,
            });
        }
        pending[slot].nested = nested;
        Some(id)
    }

    /// A class extends at most one type; interfaces and annotations only
    /// extend. The extra supertypes are reported and otherwise ignored.
    fn check_supertypes(
        decl: &TypeDecl,
        qualified_name: &str,
        file: FileId,
        diags: &dyn DiagnosticSink,
    ) {
        let extra = match decl.kind {
            DeclKind::Class => decl.extends.get(1),
            DeclKind::Interface | DeclKind::Annotation => decl.implements.first(),
        };
        let Some(ty) = extra else {
            return;
        };
        let message = match decl.kind {
            DeclKind::Class => format!("class `{}` can extend only one type", qualified_name),
            _ => format!("`{}` cannot implement types; use `extends`", qualified_name),
        };
        diags.report(
            Diagnostic::error(codes::E0103, message)
                .at(Some(Location { file, span: ty.span }))
                .from_origin(qualified_name),
        );
    }

    fn resolve_decl(&mut self, item: &Pending<'_>, imports: &ImportScope, file: FileId) {
        let decl = item.syntax;
        let outer = self.decls[item.id.0 as usize].enclosing;

        let annotations = self.resolve_annotations(&decl.annotations, outer, item.id, imports);
        let extends: Vec<ResolvedType> = decl
            .extends
            .iter()
            .map(|t| self.resolve_type(t, outer, item.id, imports))
            .collect();
        let implements: Vec<ResolvedType> = decl
            .implements
            .iter()
            .map(|t| self.resolve_type(t, outer, item.id, imports))
            .collect();

        let mut members = Vec::with_capacity(decl.members.len());
        for (member, nested) in decl.members.iter().zip(&item.nested) {
            match (member, nested) {
                (AstMember::Type(_), Some(child)) => members.push(MemberRef::Type(*child)),
                (AstMember::Type(_), None) => {}
                (AstMember::Method(m), _) => {
                    let info = MethodInfo {
                        name: m.name.name.clone(),
                        doc: m.doc.clone(),
                        annotations: self.resolve_annotations(
                            &m.annotations,
                            Some(item.id),
                            item.id,
                            imports,
                        ),
                        return_type: self.resolve_type(&m.return_type, Some(item.id), item.id, imports),
                        params: m
                            .params
                            .iter()
                            .map(|p| ParamInfo {
                                name: p.name.name.clone(),
                                ty: self.resolve_type(&p.ty, Some(item.id), item.id, imports),
                            })
                            .collect(),
                        enclosing: item.id,
                        location: Some(Location { file, span: m.span }),
                    };
                    let mref = MethodRef(self.methods.len() as u32);
                    self.methods.push(info);
                    members.push(MemberRef::Method(mref));
                }
            }
        }

        let entry = &mut self.decls[item.id.0 as usize];
        entry.annotations = annotations;
        entry.members = members;
        match entry.kind {
            DeclKind::Class => {
                entry.superclass = extends.into_iter().next();
                entry.interfaces = implements;
            }
            DeclKind::Interface | DeclKind::Annotation => {
                entry.interfaces = extends;
            }
        }
    }

    fn resolve_annotations(
        &self,
        annotations: &[ast::Annotation],
        scope: Option<DeclId>,
        owner: DeclId,
        imports: &ImportScope,
    ) -> Vec<AnnotationRef> {
        annotations
            .iter()
            .map(|a| AnnotationRef {
                name: self.resolve_name(&a.name, scope, owner, imports),
                args: a.args.clone(),
            })
            .collect()
    }

    fn resolve_type(
        &self,
        ty: &ast::TypeRef,
        scope: Option<DeclId>,
        owner: DeclId,
        imports: &ImportScope,
    ) -> ResolvedType {
        ResolvedType {
            name: self.resolve_name(&ty.name, scope, owner, imports),
            args: ty
                .args
                .iter()
                .map(|a| self.resolve_type(a, scope, owner, imports))
                .collect(),
            array_dims: ty.array_dims,
        }
    }

    /// Resolve a possibly-qualified name to a fully-qualified one.
    ///
    /// The head segment is searched: primitives, then nested types of `scope`
    /// and its enclosing declarations (innermost outward), then the owner's
    /// package, then imports, then the implicit library packages. Remaining
    /// segments walk nested declarations. Anything unresolved is kept as
    /// written.
    fn resolve_name(
        &self,
        name: &QualifiedName,
        scope: Option<DeclId>,
        owner: DeclId,
        imports: &ImportScope,
    ) -> String {
        let written = name.dotted();
        let Some(head) = name.segments.first() else {
            return written;
        };
        if name.segments.len() == 1 && prelude::is_primitive(&head.name) {
            return written;
        }

        let head_fqn = self.resolve_head(&head.name, scope, owner, imports);
        let Some(mut fqn) = head_fqn else {
            return written;
        };
        for segment in &name.segments[1..] {
            let candidate = format!("{}.{}", fqn, segment.name);
            if !self.by_name.contains_key(&candidate) {
                return written;
            }
            fqn = candidate;
        }
        fqn
    }

    fn resolve_head(
        &self,
        simple: &str,
        scope: Option<DeclId>,
        owner: DeclId,
        imports: &ImportScope,
    ) -> Option<String> {
        let mut cursor = scope;
        while let Some(id) = cursor {
            let entry = &self.decls[id.0 as usize];
            let nested = format!("{}.{}", entry.qualified_name, simple);
            if self.by_name.contains_key(&nested) {
                return Some(nested);
            }
            if entry.simple_name == simple {
                return Some(entry.qualified_name.clone());
            }
            cursor = entry.enclosing;
        }

        let package = &self.decls[owner.0 as usize].package;
        let same_package = if package.is_empty() {
            simple.to_string()
        } else {
            format!("{}.{}", package, simple)
        };
        if self.by_name.contains_key(&same_package) {
            return Some(same_package);
        }

        if let Some(imported) = imports.get(simple) {
            return Some(imported.to_string());
        }

        prelude::IMPLICIT_PACKAGES
            .iter()
            .map(|pkg| format!("{}.{}", pkg, simple))
            .find(|fqn| self.by_name.contains_key(fqn))
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    fn entry(&self, id: DeclId) -> &DeclEntry {
        &self.decls[id.0 as usize]
    }
}

/// Simple name → fully-qualified name, from a unit's single-type imports.
struct ImportScope {
    names: HashMap<String, String>,
}

impl ImportScope {
    fn of(unit: &CompilationUnit) -> Self {
        let names = unit
            .imports
            .iter()
            .map(|q| (q.last().to_string(), q.dotted()))
            .collect();
        Self { names }
    }

    fn get(&self, simple: &str) -> Option<&str> {
        self.names.get(simple).map(String::as_str)
    }
}

impl DeclarationSource for DeclTable {
    fn roots(&self) -> &[DeclId] {
        &self.roots
    }

    fn kind(&self, id: DeclId) -> DeclKind {
        self.entry(id).kind
    }

    fn list_members(&self, id: DeclId) -> &[MemberRef] {
        &self.entry(id).members
    }

    fn extended_interfaces(&self, id: DeclId) -> &[ResolvedType] {
        &self.entry(id).interfaces
    }

    fn superclass(&self, id: DeclId) -> Option<&ResolvedType> {
        self.entry(id).superclass.as_ref()
    }

    fn annotations_of(&self, id: DeclId) -> &[AnnotationRef] {
        &self.entry(id).annotations
    }

    fn doc_of(&self, id: DeclId) -> Option<&str> {
        self.entry(id).doc.as_deref()
    }

    fn method(&self, method: MethodRef) -> &MethodInfo {
        &self.methods[method.0 as usize]
    }

    fn simple_name(&self, id: DeclId) -> &str {
        &self.entry(id).simple_name
    }

    fn qualified_name(&self, id: DeclId) -> &str {
        &self.entry(id).qualified_name
    }

    fn binary_name(&self, id: DeclId) -> &str {
        &self.entry(id).binary_name
    }

    fn package(&self, id: DeclId) -> &str {
        &self.entry(id).package
    }

    fn is_abstract(&self, id: DeclId) -> bool {
        self.entry(id).is_abstract
    }

    fn location(&self, id: DeclId) -> Option<Location> {
        Some(self.entry(id).location)
    }

    fn lookup(&self, qualified_name: &str) -> Option<DeclId> {
        self.by_name.get(qualified_name).copied()
    }
}

// ── Test support ────────────────────────────────────────────────────────────

/// Build a table from source snippets plus the prelude. Each snippet is one
/// root unit; parse errors fail the calling test.
#[cfg(test)]
pub(crate) fn table_from(sources: &[&str]) -> (DeclTable, crate::diag::DiagnosticBuffer) {
    use crate::parser::parse;

    let mut units = Vec::new();
    for (_, text) in prelude::sources() {
        units.push((parse(text).unit.expect("prelude parses"), false));
    }
    for text in sources {
        let result = parse(text);
        assert!(result.errors.is_empty(), "parse errors: {:?}", result.errors);
        units.push((result.unit.expect("unit"), true));
    }
    let inputs: Vec<UnitInput<'_>> = units
        .iter()
        .enumerate()
        .map(|(i, (unit, is_root))| UnitInput {
            unit,
            file: FileId(i as u32),
            package_hint: None,
            is_root: *is_root,
        })
        .collect();
    let diags = crate::diag::DiagnosticBuffer::new();
    let table = DeclTable::build(&inputs, &diags);
    (table, diags)
}
