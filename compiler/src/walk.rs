// walk.rs — Declaration walker
//
// Enumerates every type declaration reachable from the round's roots,
// breadth-first over nested members, and buckets them by kind. Annotation
// declarations are kept only so marker misuse on them can be reported.
//
// Postconditions: a declaration carrying the generated marker appears in
//                 neither bucket, and none of its nested declarations are
//                 visited.
// Side effects: none.

use std::collections::VecDeque;

use crate::decl::{DeclKind, DeclarationSource, MemberRef};
use crate::id::DeclId;
use crate::prelude;

/// Candidates in breadth-first discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidates {
    pub classes: Vec<DeclId>,
    pub interfaces: Vec<DeclId>,
    pub annotations: Vec<DeclId>,
}

impl Candidates {
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        self.classes.len() + self.interfaces.len() + self.annotations.len()
    }

    /// Every candidate, classes first, then interfaces, then annotations.
    pub fn all(&self) -> impl Iterator<Item = DeclId> + '_ {
        self.classes
            .iter()
            .chain(&self.interfaces)
            .chain(&self.annotations)
            .copied()
    }
}

pub fn walk(src: &dyn DeclarationSource) -> Candidates {
    let mut candidates = Candidates::default();
    let mut queue: VecDeque<DeclId> = src.roots().iter().copied().collect();

    while let Some(id) = queue.pop_front() {
        if src.has_annotation(id, prelude::GENERATED) {
            continue;
        }
        match src.kind(id) {
            DeclKind::Class => candidates.classes.push(id),
            DeclKind::Interface => candidates.interfaces.push(id),
            DeclKind::Annotation => candidates.annotations.push(id),
        }
        for member in src.list_members(id) {
            if let MemberRef::Type(nested) = member {
                queue.push_back(*nested);
            }
        }
    }
    candidates
}
