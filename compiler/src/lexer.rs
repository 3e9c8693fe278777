// Lexer for .orbit declaration sources.
//
// Tokenizes interface/class declarations. Uses the `logos` crate for
// DFA-based lexing. Line comments and plain block comments are skipped;
// `/** ... */` doc comments are kept as tokens so the parser can attach them
// to the following declaration or method.
//
// Preconditions: input is valid UTF-8.
// Postconditions: returns all tokens with byte-offset spans, plus any lex errors.
// Failure modes: unrecognized characters and unterminated comments produce
//                `LexError`; lexing continues.
// Side effects: none.

use logos::{FilterResult, Logos};
use std::fmt;

/// Byte-offset span in source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// A lexer error with location.
#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub span: Span,
    pub message: String,
}

/// Result of lexing: tokens plus any errors (non-fatal).
#[derive(Debug)]
pub struct LexResult {
    pub tokens: Vec<(Token, Span)>,
    pub errors: Vec<LexError>,
}

/// Declaration-language tokens.
///
/// Identifiers carry no value; the parser slices the text by span.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+|//[^\n]*")]
pub enum Token {
    // ── Keywords ──
    #[token("package")]
    Package,
    #[token("import")]
    Import,
    #[token("interface")]
    Interface,
    #[token("class")]
    Class,
    #[token("abstract")]
    Abstract,
    #[token("annotation")]
    Annotation,
    #[token("extends")]
    Extends,
    #[token("implements")]
    Implements,

    // ── Symbols ──
    #[token("@")]
    At,
    #[token(".")]
    Dot,
    #[token(",")]
    Comma,
    #[token(";")]
    Semi,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,

    // ── Literals (annotation arguments) ──
    /// Numeric literal, kept as written.
    #[regex(r"-?[0-9]+(\.[0-9]+)?", |lex| lex.slice().to_string())]
    Number(String),

    /// String literal with `\"` and `\\` escapes; value excludes the quotes.
    #[regex(r#""([^"\\]|\\.)*""#, |lex| { let s = lex.slice(); s[1..s.len() - 1].to_string() })]
    StringLit(String),

    // ── Comments ──
    /// Doc comment body with `*` gutters stripped. Plain `/* */` comments
    /// are consumed by the same callback and skipped.
    #[token("/*", block_comment)]
    Doc(String),

    // ── Identifier ──
    #[regex(r"[a-zA-Z_$][a-zA-Z0-9_$]*")]
    Ident,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Package => write!(f, "package"),
            Token::Import => write!(f, "import"),
            Token::Interface => write!(f, "interface"),
            Token::Class => write!(f, "class"),
            Token::Abstract => write!(f, "abstract"),
            Token::Annotation => write!(f, "annotation"),
            Token::Extends => write!(f, "extends"),
            Token::Implements => write!(f, "implements"),
            Token::At => write!(f, "@"),
            Token::Dot => write!(f, "."),
            Token::Comma => write!(f, ","),
            Token::Semi => write!(f, ";"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::Lt => write!(f, "<"),
            Token::Gt => write!(f, ">"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::Number(n) => write!(f, "{n}"),
            Token::StringLit(s) => write!(f, "\"{s}\""),
            Token::Doc(_) => write!(f, "<doc comment>"),
            Token::Ident => write!(f, "<ident>"),
        }
    }
}

// ── Callbacks ──

fn block_comment(lex: &mut logos::Lexer<'_, Token>) -> FilterResult<String, ()> {
    let rest = lex.remainder();
    let Some(end) = rest.find("*/") else {
        lex.bump(rest.len());
        return FilterResult::Error(());
    };
    let body = &rest[..end];
    lex.bump(end + 2);
    match body.strip_prefix('*') {
        Some(doc) => FilterResult::Emit(clean_doc(doc)),
        None => FilterResult::Skip,
    }
}

/// Strip the leading `*` gutter of each line and surrounding blank lines.
fn clean_doc(body: &str) -> String {
    let lines: Vec<&str> = body
        .lines()
        .map(|line| {
            let line = line.trim_start();
            let line = line.strip_prefix('*').unwrap_or(line);
            line.strip_prefix(' ').unwrap_or(line).trim_end()
        })
        .collect();
    lines.join("\n").trim().to_string()
}

// ── Public API ──

/// Lex a declaration source string into tokens.
///
/// Lexing is non-fatal: errors are collected and the lexer continues past
/// bad characters.
pub fn lex(source: &str) -> LexResult {
    let lexer = Token::lexer(source);
    let mut tokens = Vec::new();
    let mut errors = Vec::new();

    for (result, range) in lexer.spanned() {
        let span = Span {
            start: range.start,
            end: range.end,
        };
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(()) => {
                let text = &source[span.start..span.end];
                let message = if text.starts_with("/*") {
                    "unterminated block comment".to_string()
                } else {
                    format!("unexpected character: {:?}", text)
                };
                errors.push(LexError { span, message });
            }
        }
    }

    LexResult { tokens, errors }
}

// ── Tests ──
