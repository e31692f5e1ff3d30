//! Nesting of structures into enclosing paper shells.
//!
//! ```text
//! containment.rs : "is B fully inside A?" predicate
//! generator.rs  : shell generation for a structure set
//! tree.rs       : arena-backed hierarchy and insertion
//! subtract.rs   : which child shells to cut out of each parent
//! ```

mod containment;
mod generator;
mod subtract;
mod tree;

pub use containment::{ContainmentOracle, RayParityContainment};
pub use generator::{BoundingBoxShell, ShellGenerator};
pub use subtract::SubtractionStep;
pub use tree::{HierarchyNode, HierarchyTree, NodeId};
