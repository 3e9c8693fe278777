// Parser for .orbit declaration sources.
//
// Parses a token stream (from the lexer) into a `CompilationUnit`. Uses
// chumsky combinators.
//
// Grammar:
//   unit      = (doc? 'package' qualified ';')? import* decl*
//   import    = 'import' qualified ';'
//   decl      = doc? annotation* 'abstract'? kind IDENT
//               ('extends' type (',' type)*)? ('implements' type (',' type)*)?
//               ('{' member* '}' | ';')
//   member    = decl | doc? annotation* type IDENT '(' (type IDENT),* ')' ';'
//   type      = qualified ('<' type (',' type)* '>')? ('[' ']'){0,255}
//   qualified = IDENT ('.' (IDENT | keyword))*
//
// Preconditions: input is a valid token stream from `lexer::lex()`.
// Postconditions: returns an AST plus any parse errors (non-fatal).
// Failure modes: syntax errors produce `Rich` diagnostics.
// Side effects: none.

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;
use chumsky::span::SimpleSpan;

use crate::ast::*;
use crate::lexer::{self, Token};

/// Result of parsing: AST plus any errors.
#[derive(Debug)]
pub struct ParseResult {
    pub unit: Option<CompilationUnit>,
    pub errors: Vec<Rich<'static, Token, SimpleSpan>>,
}

/// Parse a declaration source string. Lexes then parses.
pub fn parse(source: &str) -> ParseResult {
    let lex_result = lexer::lex(source);
    let len = source.len();

    let tokens = attach_docs(lex_result.tokens);
    let token_iter = tokens.into_iter().map(|(tok, span)| {
        let cspan: SimpleSpan = (span.start..span.end).into();
        (tok, cspan)
    });
    let eoi: SimpleSpan = (len..len).into();
    let stream = Stream::from_iter(token_iter).map(eoi, |(t, s): (_, _)| (t, s));

    let parser = unit_parser(source);
    let (unit, parse_errors) = parser.parse(stream).into_output_errors();

    let mut all_errors: Vec<Rich<'static, Token, SimpleSpan>> = lex_result
        .errors
        .into_iter()
        .map(|e| {
            let span: SimpleSpan = (e.span.start..e.span.end).into();
            Rich::custom(span, e.message)
        })
        .collect();
    all_errors.extend(parse_errors.into_iter().map(|e| e.into_owned()));

    ParseResult {
        unit,
        errors: all_errors,
    }
}

/// Keep a doc comment only where a declaration or method can start, so the
/// grammar sees at most one `Doc` token in front of each header. Doc comments
/// anywhere else (inside a parameter list, before `package`) are dropped.
fn attach_docs(tokens: Vec<(Token, lexer::Span)>) -> Vec<(Token, lexer::Span)> {
    let mut kept: Vec<(Token, lexer::Span)> = Vec::with_capacity(tokens.len());
    let mut iter = tokens.into_iter().peekable();
    while let Some((tok, span)) = iter.next() {
        if let Token::Doc(_) = tok {
            let after_boundary = matches!(
                kept.last(),
                None | Some((Token::Semi | Token::LBrace | Token::RBrace, _))
            );
            let before_header = matches!(
                iter.peek(),
                Some((
                    Token::At
                        | Token::Abstract
                        | Token::Interface
                        | Token::Class
                        | Token::Annotation
                        | Token::Ident,
                    _
                ))
            );
            if !(after_boundary && before_header) {
                continue;
            }
        }
        kept.push((tok, span));
    }
    kept
}

// ── Main parser builder ──
//
// All grammar rules are built inside `unit_parser` so that the `source`
// reference is captured once and shared by all combinators.

fn unit_parser<'tokens, 'src: 'tokens, I>(
    source: &'src str,
) -> impl Parser<'tokens, I, CompilationUnit, extra::Err<Rich<'tokens, Token, SimpleSpan>>> + 'src
where
    'tokens: 'src,
    I: ValueInput<'tokens, Token = Token, Span = SimpleSpan>,
{
    // ── Names ──

    let ident = just(Token::Ident).map_with(move |_, e| {
        let span: SimpleSpan = e.span();
        Ident {
            name: source[span.start()..span.end()].to_string(),
            span,
        }
    });

    // After a dot, keywords are plain name segments (`orbit.actors.annotation`).
    let segment = select! {
        Token::Ident => (),
        Token::Package => (),
        Token::Import => (),
        Token::Interface => (),
        Token::Class => (),
        Token::Abstract => (),
        Token::Annotation => (),
        Token::Extends => (),
        Token::Implements => (),
    }
    .map_with(move |_, e| {
        let span: SimpleSpan = e.span();
        Ident {
            name: source[span.start()..span.end()].to_string(),
            span,
        }
    });

    let qualified = ident
        .clone()
        .then(
            just(Token::Dot)
                .ignore_then(segment)
                .repeated()
                .collect::<Vec<_>>(),
        )
        .map_with(|(head, rest), e| {
            let mut segments = Vec::with_capacity(rest.len() + 1);
            segments.push(head);
            segments.extend(rest);
            QualifiedName {
                segments,
                span: e.span(),
            }
        });

    // ── Types ──

    let type_ref = recursive(|type_ref| {
        let type_args = type_ref
            .separated_by(just(Token::Comma))
            .at_least(1)
            .collect::<Vec<_>>()
            .delimited_by(just(Token::Lt), just(Token::Gt));

        qualified
            .clone()
            .then(type_args.or_not())
            .then(
                just(Token::LBracket)
                    .then(just(Token::RBracket))
                    .repeated()
                    .count(),
            )
            .try_map(|((name, args), dims), span: SimpleSpan| match u8::try_from(dims) {
                Ok(array_dims) => Ok(TypeRef {
                    name,
                    args: args.unwrap_or_default(),
                    array_dims,
                    span,
                }),
                Err(_) => Err(Rich::custom(
                    span,
                    format!("too many array dimensions ({}, at most {})", dims, u8::MAX),
                )),
            })
    });

    let type_list = type_ref
        .clone()
        .separated_by(just(Token::Comma))
        .at_least(1)
        .collect::<Vec<_>>();

    // ── Annotations ──

    // Arguments are kept as written; nothing downstream interprets them.
    let annotation_arg = select! {
        Token::StringLit(_) => (),
        Token::Number(_) => (),
    }
    .or(qualified.clone().ignored())
    .map_with(move |_, e| {
        let span: SimpleSpan = e.span();
        source[span.start()..span.end()].to_string()
    });

    let annotation = just(Token::At)
        .ignore_then(qualified.clone())
        .then(
            annotation_arg
                .separated_by(just(Token::Comma))
                .collect::<Vec<_>>()
                .delimited_by(just(Token::LParen), just(Token::RParen))
                .or_not(),
        )
        .map_with(|(name, args), e| Annotation {
            name,
            args: args.unwrap_or_default(),
            span: e.span(),
        });

    let doc = select! { Token::Doc(text) => text };

    let header = doc
        .or_not()
        .then(annotation.repeated().collect::<Vec<_>>());

    // ── Methods ──

    let param = type_ref
        .clone()
        .then(ident.clone())
        .map_with(|(ty, name), e| Param {
            ty,
            name,
            span: e.span(),
        });

    let method = header
        .clone()
        .then(type_ref.clone())
        .then(ident.clone())
        .then(
            param
                .separated_by(just(Token::Comma))
                .collect::<Vec<_>>()
                .delimited_by(just(Token::LParen), just(Token::RParen)),
        )
        .then_ignore(just(Token::Semi))
        .map_with(
            |((((doc, annotations), return_type), name), params), e| MethodDecl {
                name,
                doc,
                annotations,
                return_type,
                params,
                span: e.span(),
            },
        );

    // ── Type declarations ──

    let kind = select! {
        Token::Interface => TypeDeclKind::Interface,
        Token::Class => TypeDeclKind::Class,
        Token::Annotation => TypeDeclKind::Annotation,
    };

    let decl = recursive(|decl| {
        let member = decl
            .map(Member::Type)
            .or(method.clone().map(Member::Method));

        let body = member
            .repeated()
            .collect::<Vec<_>>()
            .delimited_by(just(Token::LBrace), just(Token::RBrace))
            .or(just(Token::Semi).to(Vec::new()));

        header
            .clone()
            .then(just(Token::Abstract).or_not().map(|a| a.is_some()))
            .then(kind)
            .then(ident.clone())
            .then(just(Token::Extends).ignore_then(type_list.clone()).or_not())
            .then(
                just(Token::Implements)
                    .ignore_then(type_list.clone())
                    .or_not(),
            )
            .then(body)
            .map_with(
                |(((((((doc, annotations), is_abstract), kind), name), extends), implements), members), e| {
                    TypeDecl {
                        kind,
                        name,
                        doc,
                        annotations,
                        is_abstract,
                        extends: extends.unwrap_or_default(),
                        implements: implements.unwrap_or_default(),
                        members,
                        span: e.span(),
                    }
                },
            )
    });

    // ── Compilation unit ──

    let package = just(Token::Package)
        .ignore_then(qualified.clone())
        .then_ignore(just(Token::Semi));

    let import = just(Token::Import)
        .ignore_then(qualified)
        .then_ignore(just(Token::Semi));

    package
        .or_not()
        .then(import.repeated().collect::<Vec<_>>())
        .then(decl.repeated().collect::<Vec<_>>())
        .map_with(|((package, imports), decls), e| CompilationUnit {
            package,
            imports,
            decls,
            span: e.span(),
        })
}

// ── Tests ──
