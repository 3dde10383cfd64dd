//! Top-level facade crate for statree.
//!
//! Re-exports the core registry and the HTTP server library so users can depend on a single crate.

pub mod core {
    pub use statree_core::*;
}

pub mod server {
    pub use statree_server::*;
}
