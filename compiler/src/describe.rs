// describe.rs — Interface and method descriptors
//
// Builds the descriptor of a classified interface: its names, documentation
// and annotations, and its effective method set. The effective set is the
// interface's own methods in declaration order followed by inherited methods,
// breadth-first over extended interfaces. A signature already collected is
// not collected again, and methods of the universal root type are excluded.
//
// Invariants: method order and parameter order are never re-sorted; a
//             parameter's `index` is its declaration position.
// Side effects: none.

use std::collections::{HashSet, VecDeque};

use serde::Serialize;

use crate::decl::{AnnotationRef, DeclarationSource, MemberRef, ResolvedType};
use crate::id::{self, DeclId, InterfaceId, MethodId, MethodRef};
use crate::prelude;
use crate::source::Location;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterfaceDescriptor {
    #[serde(skip)]
    pub decl: DeclId,
    pub qualified_name: String,
    pub binary_name: String,
    pub package: String,
    pub simple_name: String,
    pub doc: Option<String>,
    pub annotations: Vec<AnnotationRef>,
    pub is_actor: bool,
    pub is_no_identity: bool,
    pub methods: Vec<MethodDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodDescriptor {
    pub name: String,
    pub return_type: ResolvedType,
    pub params: Vec<ParameterDescriptor>,
    pub doc: Option<String>,
    pub annotations: Vec<AnnotationRef>,
    pub oneway: bool,
    pub method_id: Option<MethodId>,
    /// Qualified name of the interface that declares the method.
    pub declared_in: String,
    #[serde(skip)]
    pub origin: MethodRef,
    #[serde(skip)]
    pub location: Option<Location>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ResolvedType,
    pub index: usize,
}

impl MethodDescriptor {
    /// Canonical signature `name(T1,T2,...)`.
    pub fn signature(&self) -> String {
        let types: Vec<String> = self.params.iter().map(|p| p.ty.to_string()).collect();
        id::signature(&self.name, types.iter().map(String::as_str))
    }

    /// `pkg.Iface#name` for diagnostics.
    pub fn origin_name(&self) -> String {
        format!("{}#{}", self.declared_in, self.name)
    }
}

impl InterfaceDescriptor {
    pub fn interface_id(&self) -> InterfaceId {
        id::interface_id(&self.qualified_name)
    }

    /// Fill in every method's id from its canonical signature.
    pub fn assign_ids(&mut self) {
        for method in &mut self.methods {
            method.method_id = Some(id::method_id(&method.signature()));
        }
    }
}

pub fn describe(src: &dyn DeclarationSource, id: DeclId, is_actor: bool) -> InterfaceDescriptor {
    let mut methods = Vec::new();
    let mut seen_signatures = HashSet::new();
    let mut visited = HashSet::new();
    let mut queue = VecDeque::from([id]);

    while let Some(current) = queue.pop_front() {
        if !visited.insert(current) {
            continue;
        }
        if src.qualified_name(current) == prelude::OBJECT {
            continue;
        }
        for member in src.list_members(current) {
            let MemberRef::Method(mref) = member else {
                continue;
            };
            let method = method_descriptor(src, *mref);
            if seen_signatures.insert(method.signature()) {
                methods.push(method);
            }
        }
        for parent in src.extended_interfaces(current) {
            if let Some(parent_id) = src.lookup(&parent.name) {
                queue.push_back(parent_id);
            }
        }
    }

    InterfaceDescriptor {
        decl: id,
        qualified_name: src.qualified_name(id).to_string(),
        binary_name: src.binary_name(id).to_string(),
        package: src.package(id).to_string(),
        simple_name: src.simple_name(id).to_string(),
        doc: src.doc_of(id).map(str::to_string),
        annotations: src.annotations_of(id).to_vec(),
        is_actor,
        is_no_identity: src.has_annotation(id, prelude::NO_IDENTITY),
        methods,
    }
}

fn method_descriptor(src: &dyn DeclarationSource, mref: MethodRef) -> MethodDescriptor {
    let info = src.method(mref);
    MethodDescriptor {
        name: info.name.clone(),
        return_type: info.return_type.clone(),
        params: info
            .params
            .iter()
            .enumerate()
            .map(|(index, p)| ParameterDescriptor {
                name: p.name.clone(),
                ty: p.ty.clone(),
                index,
            })
            .collect(),
        doc: info.doc.clone(),
        annotations: info
            .annotations
            .iter()
            .filter(|a| a.name != prelude::OVERRIDE)
            .cloned()
            .collect(),
        oneway: info.annotations.iter().any(|a| a.name == prelude::ONE_WAY),
        method_id: None,
        declared_in: src.qualified_name(info.enclosing).to_string(),
        origin: mref,
        location: info.location,
    }
}
