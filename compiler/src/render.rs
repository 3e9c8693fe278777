// render.rs — Renderers for generation plans
//
// A renderer turns one `GenerationPlan` into source text. Two are provided:
//
//   - `RustRenderer` emits a Rust module with the interface trait, the client
//     proxy, the dispatcher, and the registrar. The module targets the
//     `orbit_runtime` crate, which is not part of this compiler.
//   - `StubRenderer` emits a `.orbit` declaration stub naming the three
//     generated types, each marked `@Generated`. The driver feeds stubs back
//     in as the next round's sources.
//
// Preconditions: the plan's methods have ids and passed validation.
// Postconditions: rendering is a pure function of the plan.
// Failure modes: `RenderError` when the plan cannot be expressed in the
//                target (e.g. two methods map to one Rust name).
// Side effects: none.

use std::collections::HashMap;
use std::fmt::Write;

use thiserror::Error;

use crate::decl::ResolvedType;
use crate::describe::MethodDescriptor;
use crate::plan::GenerationPlan;
use crate::prelude;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("methods `{first}` and `{second}` both render as `{name}`")]
    NameClash {
        first: String,
        second: String,
        name: String,
    },
    #[error("parameters of `{method}` both render as `{name}`")]
    ParamClash { method: String, name: String },
    #[error("type `{0}` has no Rust rendering")]
    UnsupportedType(String),
    #[error(transparent)]
    Fmt(#[from] std::fmt::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    RustSource,
    /// Declarations the next round parses.
    DeclarationStub,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedUnit {
    pub kind: UnitKind,
    /// Path relative to the sources output root.
    pub path: String,
    pub contents: String,
}

pub trait Renderer {
    fn render(&self, plan: &GenerationPlan) -> Result<Vec<RenderedUnit>, RenderError>;
}

/// Run both renderers; a failure in either fails the pair.
impl<A: Renderer, B: Renderer> Renderer for (A, B) {
    fn render(&self, plan: &GenerationPlan) -> Result<Vec<RenderedUnit>, RenderError> {
        let mut units = self.0.render(plan)?;
        units.extend(self.1.render(plan)?);
        Ok(units)
    }
}

/// Rust module plus declaration stub.
pub fn default_renderer() -> (RustRenderer, StubRenderer) {
    (RustRenderer, StubRenderer)
}

fn header(plan: &GenerationPlan) -> String {
    format!(
        "Generated by orbc from {}. Do not edit.",
        plan.interface_name
    )
}

/// `com.example` → `com/example/`; the unnamed package is the root.
fn package_dir(package: &str) -> String {
    if package.is_empty() {
        String::new()
    } else {
        format!("{}/", package.replace('.', "/"))
    }
}

// ── Rust ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct RustRenderer;

const RUNTIME: &str = "orbit_runtime";

const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "dyn", "else", "enum", "extern", "false",
    "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref",
    "return", "static", "struct", "trait", "true", "type", "unsafe", "use", "where", "while",
    "abstract", "become", "box", "do", "final", "gen", "macro", "override", "priv", "try",
    "typeof", "unsized", "virtual", "yield",
];

/// Keywords that cannot be raw identifiers.
const RESERVED: &[&str] = &["self", "Self", "super", "crate", "_"];

/// `sayHello` → `say_hello`, `getHTTPCode` → `get_http_code`.
pub fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some(p) if p == '_' => false,
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.is_some_and(char::is_lowercase),
                _ => false,
            };
            if boundary {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else if c == '$' {
            out.push('_');
        } else {
            out.push(c);
        }
    }
    out
}

/// A snake-cased identifier that is legal in Rust.
pub fn rust_ident(name: &str) -> String {
    let snake = snake_case(name);
    if RESERVED.contains(&snake.as_str()) {
        format!("{}_", snake)
    } else if RUST_KEYWORDS.contains(&snake.as_str()) {
        format!("r#{}", snake)
    } else {
        snake
    }
}

fn boxed(name: &str) -> Option<&'static str> {
    Some(match name {
        "boolean" | "orbit.lang.Boolean" => "bool",
        "byte" | "orbit.lang.Byte" => "i8",
        "short" | "orbit.lang.Short" => "i16",
        "int" | "orbit.lang.Integer" => "i32",
        "long" | "orbit.lang.Long" => "i64",
        "float" | "orbit.lang.Float" => "f32",
        "double" | "orbit.lang.Double" => "f64",
        "char" | "orbit.lang.Character" => "char",
        "orbit.lang.String" => "String",
        "void" | prelude::VOID => "()",
        _ => return None,
    })
}

pub fn rust_type(ty: &ResolvedType) -> Result<String, RenderError> {
    let base = if let Some(simple) = boxed(&ty.name) {
        simple.to_string()
    } else if ty.name == prelude::OBJECT {
        format!("{}::Value", RUNTIME)
    } else if ty.name == prelude::TASK {
        match ty.args.as_slice() {
            [] => format!("{}::Task<()>", RUNTIME),
            [inner] => format!("{}::Task<{}>", RUNTIME, rust_type(inner)?),
            _ => return Err(RenderError::UnsupportedType(ty.to_string())),
        }
    } else {
        let mut path = format!("crate::{}", ty.name.replace('.', "::"));
        if !ty.args.is_empty() {
            let args = ty
                .args
                .iter()
                .map(rust_type)
                .collect::<Result<Vec<_>, _>>()?;
            write!(path, "<{}>", args.join(", "))?;
        }
        path
    };
    Ok((0..ty.array_dims).fold(base, |t, _| format!("Vec<{}>", t)))
}

fn write_doc(out: &mut String, indent: &str, doc: Option<&str>) -> Result<(), RenderError> {
    if let Some(doc) = doc {
        for line in doc.lines() {
            if line.is_empty() {
                writeln!(out, "{}///", indent)?;
            } else {
                writeln!(out, "{}/// {}", indent, line)?;
            }
        }
    }
    Ok(())
}

/// Rust method names in plan order. Overloads after the first get an
/// ordinal suffix (`f`, `f_1`, ...).
fn method_names(plan: &GenerationPlan) -> Result<Vec<String>, RenderError> {
    let mut overloads: HashMap<&str, usize> = HashMap::new();
    let mut taken: HashMap<String, &MethodDescriptor> = HashMap::new();
    let mut names = Vec::with_capacity(plan.methods.len());
    for method in &plan.methods {
        let ordinal = overloads.entry(method.name.as_str()).or_insert(0);
        let name = match *ordinal {
            0 => rust_ident(&method.name),
            n => format!("{}_{}", rust_ident(&method.name).trim_start_matches("r#"), n),
        };
        *ordinal += 1;
        if let Some(first) = taken.get(&name) {
            return Err(RenderError::NameClash {
                first: first.signature(),
                second: method.signature(),
                name,
            });
        }
        taken.insert(name.clone(), method);
        names.push(name);
    }
    Ok(names)
}

struct RustMethod<'p> {
    descriptor: &'p MethodDescriptor,
    name: String,
    /// `(rust name, rust type)` in parameter order.
    params: Vec<(String, String)>,
    ret: String,
    id: i32,
}

impl RustMethod<'_> {
    fn signature(&self) -> String {
        let params: Vec<String> = self
            .params
            .iter()
            .map(|(n, t)| format!(", {}: {}", n, t))
            .collect();
        format!("fn {}(&self{}) -> {}", self.name, params.concat(), self.ret)
    }
}

impl RustRenderer {
    /// `com/example/hello.rs` for `com.example.IHello`; nested interfaces
    /// join their enclosing names: `com/example/outer_inner.rs`.
    pub fn module_path(plan: &GenerationPlan) -> String {
        let relative = plan
            .binary_name
            .strip_prefix(&format!("{}.", plan.package))
            .unwrap_or(&plan.binary_name);
        let stem: Vec<String> = relative
            .split('$')
            .map(|s| snake_case(crate::plan::base_name(s)))
            .collect();
        format!("{}{}.rs", package_dir(&plan.package), stem.join("_"))
    }

    fn methods<'p>(&self, plan: &'p GenerationPlan) -> Result<Vec<RustMethod<'p>>, RenderError> {
        let names = method_names(plan)?;
        plan.methods
            .iter()
            .zip(names)
            .map(|(m, name)| {
                let mut params: Vec<(String, String)> = Vec::with_capacity(m.params.len());
                for p in &m.params {
                    let ident = rust_ident(&p.name);
                    if params.iter().any(|(taken, _)| *taken == ident) {
                        return Err(RenderError::ParamClash {
                            method: m.signature(),
                            name: ident,
                        });
                    }
                    params.push((ident, rust_type(&p.ty)?));
                }
                Ok(RustMethod {
                    descriptor: m,
                    name,
                    params,
                    ret: rust_type(&m.return_type)?,
                    id: plan.method_id_of(m).0,
                })
            })
            .collect()
    }
}

impl Renderer for RustRenderer {
    fn render(&self, plan: &GenerationPlan) -> Result<Vec<RenderedUnit>, RenderError> {
        let methods = self.methods(plan)?;
        let trait_name = &plan.simple_name;
        let marker = if plan.is_actor { "Actor" } else { "ActorObserver" };
        let mut out = String::new();

        writeln!(out, "// {}", header(plan))?;
        writeln!(out)?;
        writeln!(out, "use {}::{{InvokeError, Reply, Value}};", RUNTIME)?;
        writeln!(out)?;

        // Interface trait.
        write_doc(&mut out, "", plan.doc.as_deref())?;
        writeln!(out, "pub trait {}: {}::{} {{", trait_name, RUNTIME, marker)?;
        for m in &methods {
            write_doc(&mut out, "    ", m.descriptor.doc.as_deref())?;
            writeln!(out, "    {};", m.signature())?;
        }
        writeln!(out, "}}")?;
        writeln!(out)?;

        // Client proxy.
        writeln!(out, "/// Client proxy for `{}`.", plan.interface_name)?;
        writeln!(out, "#[derive(Debug, Clone)]")?;
        writeln!(out, "pub struct {} {{", plan.reference_name)?;
        writeln!(out, "    target: {}::Reference,", RUNTIME)?;
        writeln!(out, "}}")?;
        writeln!(out)?;
        writeln!(out, "impl {} {{", plan.reference_name)?;
        writeln!(out, "    pub fn new(target: {}::Reference) -> Self {{", RUNTIME)?;
        writeln!(out, "        Self {{ target }}")?;
        writeln!(out, "    }}")?;
        writeln!(out, "}}")?;
        writeln!(out)?;
        writeln!(out, "impl {} for {} {{}}", marker_path(marker), plan.reference_name)?;
        writeln!(out)?;
        writeln!(out, "impl {} for {} {{", trait_name, plan.reference_name)?;
        for m in &methods {
            let args: Vec<String> = m
                .params
                .iter()
                .map(|(n, _)| format!("{}::pack({})", RUNTIME, n))
                .collect();
            writeln!(out, "    {} {{", m.signature())?;
            if m.descriptor.oneway {
                writeln!(
                    out,
                    "        self.target.send_oneway({}, {}, vec![{}]);",
                    plan.interface_id,
                    m.id,
                    args.join(", ")
                )?;
                writeln!(out, "        {}::Task::completed(())", RUNTIME)?;
            } else {
                writeln!(
                    out,
                    "        self.target.invoke({}, {}, vec![{}])",
                    plan.interface_id,
                    m.id,
                    args.join(", ")
                )?;
            }
            writeln!(out, "    }}")?;
        }
        writeln!(out, "}}")?;
        writeln!(out)?;

        // Dispatcher.
        writeln!(out, "/// Dispatcher for `{}`.", plan.interface_name)?;
        writeln!(out, "#[derive(Debug, Default)]")?;
        writeln!(out, "pub struct {};", plan.invoker_name)?;
        writeln!(out)?;
        writeln!(out, "impl {}::Invoker for {} {{", RUNTIME, plan.invoker_name)?;
        writeln!(out, "    type Target = dyn {};", trait_name)?;
        writeln!(out)?;
        writeln!(
            out,
            "    fn invoke(&self, target: &dyn {}, method_id: i32, args: Vec<Value>) -> Result<Option<Reply>, InvokeError> {{",
            trait_name
        )?;
        writeln!(out, "        match method_id {{")?;
        for m in &methods {
            writeln!(out, "            {} => {{", m.id)?;
            writeln!(
                out,
                "                {}::check_arity(method_id, &args, {})?;",
                RUNTIME,
                m.params.len()
            )?;
            // Positional locals; parameter names may shadow `args` or `target`.
            let mut call_args = Vec::with_capacity(m.params.len());
            for (index, (_, ty)) in m.params.iter().enumerate() {
                writeln!(
                    out,
                    "                let arg{}: {} = {}::unpack(&args[{}])?;",
                    index, ty, RUNTIME, index
                )?;
                call_args.push(format!("arg{}", index));
            }
            let call = format!("target.{}({})", m.name, call_args.join(", "));
            if m.descriptor.oneway {
                writeln!(out, "                {};", call)?;
                writeln!(out, "                Ok(None)")?;
            } else {
                writeln!(out, "                Ok(Some(Reply::from_task({})))", call)?;
            }
            writeln!(out, "            }}")?;
        }
        writeln!(out, "            _ => Err(InvokeError::UnknownMethod(method_id)),")?;
        writeln!(out, "        }}")?;
        writeln!(out, "    }}")?;
        writeln!(out, "}}")?;
        writeln!(out)?;

        // Registrar.
        writeln!(out, "/// Registrar for `{}`.", plan.interface_name)?;
        writeln!(out, "pub struct {};", plan.factory_name)?;
        writeln!(out)?;
        writeln!(out, "impl {} {{", plan.factory_name)?;
        writeln!(out, "    pub const INTERFACE_ID: i32 = {};", plan.interface_id)?;
        writeln!(out, "    pub const IS_ACTOR: bool = {};", plan.is_actor)?;
        writeln!(out, "    pub const IS_NO_IDENTITY: bool = {};", plan.is_no_identity)?;
        writeln!(out)?;
        if plan.is_no_identity {
            writeln!(
                out,
                "    pub fn reference(runtime: &{}::Runtime) -> {} {{",
                RUNTIME, plan.reference_name
            )?;
            writeln!(
                out,
                "        {}::new(runtime.reference(Self::INTERFACE_ID, None))",
                plan.reference_name
            )?;
        } else {
            writeln!(
                out,
                "    pub fn reference(runtime: &{}::Runtime, identity: &str) -> {} {{",
                RUNTIME, plan.reference_name
            )?;
            writeln!(
                out,
                "        {}::new(runtime.reference(Self::INTERFACE_ID, Some(identity)))",
                plan.reference_name
            )?;
        }
        writeln!(out, "    }}")?;
        writeln!(out)?;
        writeln!(
            out,
            "    pub fn register(table: &mut {}::DispatchRegistry) {{",
            RUNTIME
        )?;
        writeln!(
            out,
            "        table.register(Self::INTERFACE_ID, Box::new({}));",
            plan.invoker_name
        )?;
        writeln!(out, "    }}")?;
        writeln!(out, "}}")?;

        Ok(vec![RenderedUnit {
            kind: UnitKind::RustSource,
            path: Self::module_path(plan),
            contents: out,
        }])
    }
}

fn marker_path(marker: &str) -> String {
    format!("{}::{}", RUNTIME, marker)
}

// ── Declaration stubs ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct StubRenderer;

impl StubRenderer {
    /// `com/example/HelloFactory.orbit`
    pub fn stub_path(plan: &GenerationPlan) -> String {
        format!(
            "{}{}.{}",
            package_dir(&plan.package),
            plan.factory_name,
            crate::source::SOURCE_EXTENSION
        )
    }
}

impl Renderer for StubRenderer {
    fn render(&self, plan: &GenerationPlan) -> Result<Vec<RenderedUnit>, RenderError> {
        let mut out = String::new();
        writeln!(out, "// {}", header(plan))?;
        if !plan.package.is_empty() {
            writeln!(out, "package {};", plan.package)?;
        }
        writeln!(out)?;
        writeln!(out, "@{}", prelude::GENERATED)?;
        writeln!(
            out,
            "class {} implements {};",
            plan.reference_name, plan.interface_name
        )?;
        writeln!(out)?;
        writeln!(out, "@{}", prelude::GENERATED)?;
        writeln!(out, "class {};", plan.invoker_name)?;
        writeln!(out)?;
        writeln!(out, "@{}", prelude::GENERATED)?;
        writeln!(out, "class {};", plan.factory_name)?;

        Ok(vec![RenderedUnit {
            kind: UnitKind::DeclarationStub,
            path: Self::stub_path(plan),
            contents: out,
        }])
    }
}
