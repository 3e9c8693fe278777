// AST node types for .orbit declaration sources.
//
// One `CompilationUnit` per file: an optional package, single-type imports,
// and top-level type declarations whose bodies nest methods and further
// declarations. Every node carries a `SimpleSpan` for diagnostics.
//
// Preconditions: produced by the parser from a valid or partially-valid token stream.
// Postconditions: each node's span covers the source range of the construct.
// Failure modes: none (data-only module).
// Side effects: none.

use chumsky::span::SimpleSpan;

/// Byte-offset span (alias for chumsky's `SimpleSpan`).
pub type Span = SimpleSpan;

// ── Root ──

#[derive(Debug, Clone, PartialEq)]
pub struct CompilationUnit {
    pub package: Option<QualifiedName>,
    pub imports: Vec<QualifiedName>,
    pub decls: Vec<TypeDecl>,
    pub span: Span,
}

// ── Declarations ──

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeDeclKind {
    Interface,
    Class,
    Annotation,
}

/// `doc? annotation* abstract? (interface|class|annotation) IDENT clauses body`
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    pub kind: TypeDeclKind,
    pub name: Ident,
    pub doc: Option<String>,
    pub annotations: Vec<Annotation>,
    pub is_abstract: bool,
    /// Interfaces: every extended interface. Classes: at most one superclass.
    pub extends: Vec<TypeRef>,
    /// Classes only.
    pub implements: Vec<TypeRef>,
    pub members: Vec<Member>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    Method(MethodDecl),
    Type(TypeDecl),
}

/// `doc? annotation* type IDENT '(' params? ')' ';'`
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub name: Ident,
    pub doc: Option<String>,
    pub annotations: Vec<Annotation>,
    pub return_type: TypeRef,
    pub params: Vec<Param>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub ty: TypeRef,
    pub name: Ident,
    pub span: Span,
}

// ── Types and annotations ──

/// `qualified ('<' type (',' type)* '>')? ('[' ']')*`
#[derive(Debug, Clone, PartialEq)]
pub struct TypeRef {
    pub name: QualifiedName,
    pub args: Vec<TypeRef>,
    pub array_dims: u8,
    pub span: Span,
}

/// `'@' qualified ('(' arg (',' arg)* ')')?`; arguments are kept as source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub name: QualifiedName,
    pub args: Vec<String>,
    pub span: Span,
}

/// A dotted name such as `com.example.Hello`.
#[derive(Debug, Clone, PartialEq)]
pub struct QualifiedName {
    pub segments: Vec<Ident>,
    pub span: Span,
}

impl QualifiedName {
    pub fn dotted(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(".")
    }

    pub fn last(&self) -> &str {
        self.segments.last().map_or("", |s| s.name.as_str())
    }
}

/// An identifier with its source text and span.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}
