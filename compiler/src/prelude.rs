// prelude.rs — Embedded library declarations
//
// The marker interfaces, annotations, task wrapper, and boxed value types
// every build can see. Prelude units are parsed like user sources but are
// never roots of a round: they are resolvable, never walked.
//
// Postconditions: `sources()` is fixed text; parsing it yields no errors.
// Side effects: none.

// ── Well-known names ──

pub const ACTOR: &str = "orbit.actors.Actor";
pub const ACTOR_OBSERVER: &str = "orbit.actors.ActorObserver";
pub const TASK: &str = "orbit.concurrent.Task";
pub const VOID: &str = "orbit.lang.Void";
pub const OBJECT: &str = "orbit.lang.Object";
pub const OVERRIDE: &str = "orbit.lang.Override";

pub const ONE_WAY: &str = "orbit.actors.annotation.OneWay";
pub const NO_IDENTITY: &str = "orbit.actors.annotation.NoIdentity";
pub const STATELESS_WORKER: &str = "orbit.actors.annotation.StatelessWorker";
pub const GENERATED: &str = "orbit.actors.annotation.Generated";

/// Packages whose declarations resolve by simple name without an import,
/// searched in this order.
pub const IMPLICIT_PACKAGES: &[&str] = &[
    "orbit.lang",
    "orbit.actors",
    "orbit.actors.annotation",
    "orbit.concurrent",
];

/// Names that resolve to themselves.
pub const PRIMITIVES: &[&str] = &[
    "void", "boolean", "byte", "short", "int", "long", "float", "double", "char",
];

pub fn is_primitive(name: &str) -> bool {
    PRIMITIVES.contains(&name)
}

// ── Sources ──

const LANG: &str = r#"
package orbit.lang;

/** Root of every declared type. */
class Object {
    int hashCode();
    boolean equals(Object other);
    String toString();
}

class Void;
class String;
class Integer;
class Long;
class Boolean;
class Double;
class Float;
class Short;
class Byte;
class Character;

annotation Override;
"#;

const ACTORS: &str = r#"
package orbit.actors;

/** Marker for location-transparent, remotely addressable actors. */
interface Actor;

/** Marker for callback targets reachable from remote actors. */
interface ActorObserver;
"#;

const ANNOTATIONS: &str = r#"
package orbit.actors.annotation;

/** The caller does not wait for a reply. */
annotation OneWay;

/** Instances are not addressed by a caller-supplied identity. */
annotation NoIdentity;

/** Calls may be dispatched to any activation. */
annotation StatelessWorker;

/** Emitted by the compiler; never processed again. */
annotation Generated;
"#;

const CONCURRENT: &str = r#"
package orbit.concurrent;

/** Pending result of a remote call. */
class Task;
"#;

/// Virtual file name and text of each prelude unit.
pub fn sources() -> &'static [(&'static str, &'static str)] {
    &[
        ("<prelude>/orbit/lang.orbit", LANG),
        ("<prelude>/orbit/actors.orbit", ACTORS),
        ("<prelude>/orbit/actors/annotation.orbit", ANNOTATIONS),
        ("<prelude>/orbit/concurrent.orbit", CONCURRENT),
    ]
}
