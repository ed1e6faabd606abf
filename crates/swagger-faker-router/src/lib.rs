//! Prefix-trie route table.
//!
//! Holds path templates (`/pets/{id}`, `/files/{path+}`) keyed by method and
//! answers lookups with a typed [`RouteMatch`]. The interceptor uses it as the
//! host application's route table, and the document loader uses it to map a
//! request path back onto the document's path templates.

pub mod trie;

pub use trie::{normalize_path, RouteMatch, Router};
