pub mod layout;
pub mod mesh;
pub mod shell;
pub mod structure;

pub use layout::Layout;
pub use mesh::TriangleMesh;
pub use shell::Shell;
pub use structure::{ProjectionMethod, Structure};
