// classify.rs — Actor/observer classification
//
// An interface is an actor interface when it transitively extends the actor
// marker, and an observer interface when it transitively extends the
// observer marker. The search is an iterative worklist over resolved
// supertype names with a visited set, so diamond-shaped hierarchies visit
// each ancestor once and cyclic declarations terminate.
//
// Side effects: none.

use std::collections::{HashSet, VecDeque};

use serde::Serialize;

use crate::decl::{DeclKind, DeclarationSource};
use crate::id::DeclId;
use crate::prelude;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Actor,
    Observer,
    None,
}

/// Actor takes precedence when an interface reaches both markers.
pub fn classify(src: &dyn DeclarationSource, id: DeclId) -> Classification {
    if implements_marker(src, id, prelude::ACTOR) {
        Classification::Actor
    } else if implements_marker(src, id, prelude::ACTOR_OBSERVER) {
        Classification::Observer
    } else {
        Classification::None
    }
}

/// Whether `id` reaches `marker` through its supertypes. Direct supertypes
/// are checked before any of theirs. For classes the superclass chain is
/// followed as well. Supertypes that are not declared anywhere in the build
/// are leaves.
pub fn implements_marker(src: &dyn DeclarationSource, id: DeclId, marker: &str) -> bool {
    let mut visited: HashSet<&str> = HashSet::new();
    let mut worklist: VecDeque<&str> = VecDeque::new();
    enqueue_supertypes(src, id, &mut worklist);

    while let Some(name) = worklist.pop_front() {
        if name == marker {
            return true;
        }
        if !visited.insert(name) {
            continue;
        }
        if let Some(next) = src.lookup(name) {
            enqueue_supertypes(src, next, &mut worklist);
        }
    }
    false
}

fn enqueue_supertypes<'s>(
    src: &'s dyn DeclarationSource,
    id: DeclId,
    worklist: &mut VecDeque<&'s str>,
) {
    worklist.extend(src.extended_interfaces(id).iter().map(|t| t.name.as_str()));
    if src.kind(id) == DeclKind::Class {
        if let Some(superclass) = src.superclass(id) {
            worklist.push_back(superclass.name.as_str());
        }
    }
}
