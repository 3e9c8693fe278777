// plan.rs — Generation plans
//
// A `GenerationPlan` is everything a renderer needs for one interface: the
// interface id, the three generated type names, and the validated method
// table with ids assigned. It also carries the dispatch table the generated
// dispatcher is built from, and models the proxy and dispatcher contracts
// (`proxy_call`, `dispatch`) so they can be exercised without a runtime.
//
// Invariants: `methods` keeps descriptor order; argument arrays are indexed
//             by parameter declaration position.
// Side effects: none.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::decl::AnnotationRef;
use crate::describe::{InterfaceDescriptor, MethodDescriptor};
use crate::id::{self, DeclId, InterfaceId, MethodId};

pub const REFERENCE_SUFFIX: &str = "Reference";
pub const INVOKER_SUFFIX: &str = "Invoker";
pub const FACTORY_SUFFIX: &str = "Factory";

#[derive(Debug, Error, PartialEq)]
pub enum InvokeError {
    #[error("invocation for interface {found} delivered to interface {expected}")]
    InterfaceMismatch {
        expected: InterfaceId,
        found: InterfaceId,
    },
    #[error("no method with id {0}")]
    UnknownMethod(MethodId),
    #[error("no method with signature `{0}`")]
    UnknownSignature(String),
    #[error("`{method}` takes {expected} arguments, got {found}")]
    Arity {
        method: String,
        expected: usize,
        found: usize,
    },
    #[error("`{method}` has no parameter `{name}`")]
    UnknownParameter { method: String, name: String },
}

// ── Invocation records ──────────────────────────────────────────────────────

/// What a proxy submits to the runtime: `{interfaceId, methodId, args}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Invocation {
    pub interface_id: InterfaceId,
    pub method_id: MethodId,
    pub args: Vec<Value>,
}

/// A packed call plus whether the proxy hands back the pending reply.
/// One-way calls return right after submission.
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyCall {
    pub invocation: Invocation,
    pub awaits_reply: bool,
}

/// A received invocation bound to its target method.
#[derive(Debug, PartialEq)]
pub struct BoundCall<'p> {
    pub method: &'p MethodDescriptor,
    /// `(parameter name, argument)` in declaration order.
    pub arguments: Vec<(&'p str, &'p Value)>,
    /// False for one-way methods: the dispatcher sends nothing back.
    pub replies: bool,
}

// ── Dispatch table ──────────────────────────────────────────────────────────

/// Method id → index into the plan's method list. Built once per plan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchTable {
    index: HashMap<MethodId, usize>,
}

impl DispatchTable {
    /// The first method wins when two share an id; collisions are rejected
    /// before plans are built.
    pub fn new(methods: &[MethodDescriptor]) -> Self {
        let mut index = HashMap::with_capacity(methods.len());
        for (i, method) in methods.iter().enumerate() {
            index.entry(effective_id(method)).or_insert(i);
        }
        Self { index }
    }

    pub fn get(&self, method_id: MethodId) -> Option<usize> {
        self.index.get(&method_id).copied()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

fn effective_id(method: &MethodDescriptor) -> MethodId {
    method
        .method_id
        .unwrap_or_else(|| id::method_id(&method.signature()))
}

// ── Plan ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationPlan {
    #[serde(skip)]
    pub decl: DeclId,
    pub interface_id: InterfaceId,
    pub interface_name: String,
    pub binary_name: String,
    pub package: String,
    pub simple_name: String,
    pub reference_name: String,
    pub invoker_name: String,
    pub factory_name: String,
    pub is_actor: bool,
    pub is_no_identity: bool,
    pub doc: Option<String>,
    pub annotations: Vec<AnnotationRef>,
    pub methods: Vec<MethodDescriptor>,
    #[serde(skip)]
    dispatch: DispatchTable,
}

/// `IHello` → `Hello`; `Inventory` stays `Inventory`.
pub fn base_name(simple_name: &str) -> &str {
    let mut chars = simple_name.chars();
    match (chars.next(), chars.next()) {
        (Some('I'), Some(next)) if next.is_ascii_uppercase() => &simple_name[1..],
        _ => simple_name,
    }
}

impl GenerationPlan {
    pub fn build(descriptor: &InterfaceDescriptor) -> Self {
        let base = base_name(&descriptor.simple_name);
        let methods: Vec<MethodDescriptor> = descriptor
            .methods
            .iter()
            .map(|m| {
                let mut m = m.clone();
                m.method_id = Some(effective_id(&m));
                m
            })
            .collect();
        let dispatch = DispatchTable::new(&methods);
        Self {
            decl: descriptor.decl,
            interface_id: descriptor.interface_id(),
            interface_name: descriptor.qualified_name.clone(),
            binary_name: descriptor.binary_name.clone(),
            package: descriptor.package.clone(),
            simple_name: descriptor.simple_name.clone(),
            reference_name: format!("{}{}", base, REFERENCE_SUFFIX),
            invoker_name: format!("{}{}", base, INVOKER_SUFFIX),
            factory_name: format!("{}{}", base, FACTORY_SUFFIX),
            is_actor: descriptor.is_actor,
            is_no_identity: descriptor.is_no_identity,
            doc: descriptor.doc.clone(),
            annotations: descriptor.annotations.clone(),
            methods,
            dispatch,
        }
    }

    /// Fully-qualified name of the registrar, as written to the manifest.
    pub fn factory_qualified_name(&self) -> String {
        self.qualify(&self.factory_name)
    }

    pub fn qualify(&self, simple: &str) -> String {
        if self.package.is_empty() {
            simple.to_string()
        } else {
            format!("{}.{}", self.package, simple)
        }
    }

    pub fn method_id_of(&self, method: &MethodDescriptor) -> MethodId {
        effective_id(method)
    }

    pub fn method_by_signature(&self, signature: &str) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|m| m.signature() == signature)
    }

    pub fn dispatch_table(&self) -> &DispatchTable {
        &self.dispatch
    }

    /// Client side: pack named arguments into parameter-index order.
    pub fn proxy_call(
        &self,
        signature: &str,
        args: &[(&str, Value)],
    ) -> Result<ProxyCall, InvokeError> {
        let method = self
            .method_by_signature(signature)
            .ok_or_else(|| InvokeError::UnknownSignature(signature.to_string()))?;
        if args.len() != method.params.len() {
            return Err(InvokeError::Arity {
                method: signature.to_string(),
                expected: method.params.len(),
                found: args.len(),
            });
        }

        let mut packed = vec![Value::Null; method.params.len()];
        for (name, value) in args {
            let param = method
                .params
                .iter()
                .find(|p| p.name == *name)
                .ok_or_else(|| InvokeError::UnknownParameter {
                    method: signature.to_string(),
                    name: name.to_string(),
                })?;
            packed[param.index] = value.clone();
        }

        Ok(ProxyCall {
            invocation: Invocation {
                interface_id: self.interface_id,
                method_id: effective_id(method),
                args: packed,
            },
            awaits_reply: !method.oneway,
        })
    }

    /// Server side: resolve the method id through the dispatch table and bind
    /// the packed arguments positionally.
    pub fn dispatch<'p>(&'p self, invocation: &'p Invocation) -> Result<BoundCall<'p>, InvokeError> {
        if invocation.interface_id != self.interface_id {
            return Err(InvokeError::InterfaceMismatch {
                expected: self.interface_id,
                found: invocation.interface_id,
            });
        }
        let index = self
            .dispatch
            .get(invocation.method_id)
            .ok_or(InvokeError::UnknownMethod(invocation.method_id))?;
        let method = &self.methods[index];
        if invocation.args.len() != method.params.len() {
            return Err(InvokeError::Arity {
                method: method.signature(),
                expected: method.params.len(),
                found: invocation.args.len(),
            });
        }
        let arguments = method
            .params
            .iter()
            .map(|p| (p.name.as_str(), &invocation.args[p.index]))
            .collect();
        Ok(BoundCall {
            method,
            arguments,
            replies: !method.oneway,
        })
    }
}
