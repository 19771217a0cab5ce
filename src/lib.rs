//! Public library API for reconstructing C/C++ declarations from debug type streams.

/// Type-stream parsing, graph building, layout resolution, and declaration synthesis.
pub mod tys;
