// orbc — Orbit actor interface compiler
//
// Library root. Front end (lexer, parser, decl), per-round passes (walk,
// classify, describe, validate, plan, render, manifest), and the round
// driver in `pipeline`.

pub mod ast;
pub mod classify;
pub mod context;
pub mod decl;
pub mod describe;
pub mod diag;
pub mod filer;
pub mod id;
pub mod lexer;
pub mod manifest;
pub mod parser;
pub mod pass;
pub mod pipeline;
pub mod plan;
pub mod prelude;
pub mod render;
pub mod source;
pub mod validate;
pub mod walk;
