// pass.rs — Pass descriptor module: metadata, dependency resolution, artifact IDs
//
// Declares the compiler's 8 per-round passes (parsing and declaration-table
// construction happen before the runner), their dependency edges, and the
// artifacts they produce. Used by the pipeline runner to compute the minimal
// pass subset for each --emit target.

use std::collections::HashSet;

// ── Pass and Artifact identifiers ──────────────────────────────────────────

/// Identifies each per-round pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassId {
    Walk,
    Classify,
    Describe,
    Validate,
    AssignIds,
    Plan,
    Render,
    Register,
}

/// Machine-readable artifact identifiers. Each maps to a field of the
/// round state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactId {
    Candidates,  // Candidates
    Classified,  // Vec<(DeclId, Classification)>
    Descriptors, // Vec<InterfaceDescriptor>
    Validated,   // descriptors with invalid methods removed
    Ids,         // descriptors with method ids, collisions removed
    Plans,       // Vec<GenerationPlan>
    Rendered,    // Vec<RenderedUnit>, written
    Manifests,   // resource paths written
}

// ── Pass descriptor ────────────────────────────────────────────────────────

/// Static metadata about a compiler pass.
pub struct PassDescriptor {
    /// Human-readable name for logs.
    pub name: &'static str,
    /// Pass dependencies (other passes whose outputs this pass consumes).
    pub inputs: &'static [PassId],
    /// Artifacts this pass produces.
    pub outputs: &'static [ArtifactId],
    /// Postconditions (documentation only).
    pub invariants: &'static str,
}

/// Return the static descriptor for a given pass.
pub fn descriptor(id: PassId) -> PassDescriptor {
    match id {
        PassId::Walk => PassDescriptor {
            name: "walk",
            inputs: &[],
            outputs: &[ArtifactId::Candidates],
            invariants: "generated declarations and their members excluded",
        },
        PassId::Classify => PassDescriptor {
            name: "classify",
            inputs: &[PassId::Walk],
            outputs: &[ArtifactId::Classified],
            invariants: "every interface candidate is actor, observer, or neither",
        },
        PassId::Describe => PassDescriptor {
            name: "describe",
            inputs: &[PassId::Classify],
            outputs: &[ArtifactId::Descriptors],
            invariants: "effective method set in declaration-derived order",
        },
        PassId::Validate => PassDescriptor {
            name: "validate",
            inputs: &[PassId::Describe],
            outputs: &[ArtifactId::Validated],
            invariants: "every remaining method returns a task; one-way methods return no result",
        },
        PassId::AssignIds => PassDescriptor {
            name: "assign_ids",
            inputs: &[PassId::Validate],
            outputs: &[ArtifactId::Ids],
            invariants: "method ids unique within each interface",
        },
        PassId::Plan => PassDescriptor {
            name: "plan",
            inputs: &[PassId::AssignIds],
            outputs: &[ArtifactId::Plans],
            invariants: "one plan per classified interface, dispatch table built",
        },
        PassId::Render => PassDescriptor {
            name: "render",
            inputs: &[PassId::Plan],
            outputs: &[ArtifactId::Rendered],
            invariants: "each plan rendered and written, or reported",
        },
        PassId::Register => PassDescriptor {
            name: "register",
            inputs: &[PassId::Render, PassId::Walk],
            outputs: &[ArtifactId::Manifests],
            invariants: "one manifest per rendered interface and per concrete actor class",
        },
    }
}

// ── Dependency resolution ──────────────────────────────────────────────────

/// All 8 pass IDs in declaration order (used for iteration).
pub const ALL_PASSES: [PassId; 8] = [
    PassId::Walk,
    PassId::Classify,
    PassId::Describe,
    PassId::Validate,
    PassId::AssignIds,
    PassId::Plan,
    PassId::Render,
    PassId::Register,
];

/// Compute the minimal ordered set of passes needed to produce `terminal`.
/// Returns passes in topological (execution) order.
pub fn required_passes(terminal: PassId) -> Vec<PassId> {
    let mut visited = HashSet::new();
    let mut order = Vec::new();
    visit(terminal, &mut visited, &mut order);
    order
}

fn visit(id: PassId, visited: &mut HashSet<PassId>, order: &mut Vec<PassId>) {
    if !visited.insert(id) {
        return;
    }
    for &dep in descriptor(id).inputs {
        visit(dep, visited, order);
    }
    order.push(id);
}

// ── Tests ──────────────────────────────────────────────────────────────────
