//! # Mummy
//!
//! A static site generator built as a two-phase pipeline. The source tree is
//! first *planned* into a graph of artifacts, then *mummified*: every
//! artifact is written into the target tree by the handler that planned it.
//!
//! # Architecture: Plan, Then Mummify
//!
//! ```text
//! 1. Plan      site/   →  Artifact graph   (nothing written)
//! 2. Mummify   graph   →  dist/            (directories first, then content and children)
//! 3. Deploy    dist/   →  optional target  (pluggable, none built in)
//! ```
//!
//! Planning and writing are separate passes because some outputs need the
//! whole graph: a page's links are resolved against every planned artifact,
//! and a directory without an index page gets a generated listing of its
//! children. Both phases run sibling subtrees in parallel on rayon; the graph
//! is immutable once planned, so it is shared without locks.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`artifact`] | The artifact graph: real and phantom sources, content vs. children, referent paths |
//! | [`planner`] | Phase 1: plans the source tree, checks target uniqueness |
//! | [`mummify`] | Phase 2: writes the graph, reports progress events |
//! | [`mummifier`] | The `Mummifier` trait, the registry, and the directory/page/image/opaque handlers |
//! | [`context`] | Read-only run context: roots, config lookup, ignore/veil filters, registry |
//! | [`config`] | `config.toml` loading, merging over stock defaults, validation |
//! | [`description`] | Typed resource descriptions and sidecar metadata |
//! | [`references`] | Referent index, link rewriting, fingerprints |
//! | [`naming`] | `NNN-name` filename convention parser |
//! | [`types`] | Media types |
//! | [`imaging`] | Pure-Rust image operations behind a backend trait |
//! | [`deploy`] | Deploy target boundary and the full build pipeline |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Every Directory Has a Page
//!
//! A directory is represented by its content file (`index.md` by default).
//! When there is none, a *phantom* page is planned in its place: it has a
//! nominal source path that does not exist and renders as a listing of the
//! directory. Links and navigation can then treat every directory the same
//! way. Veiled directories (`_drafts/`) opt out.
//!
//! ## Directories Carry No Metadata
//!
//! A directory's description is its content page's description. A sidecar
//! for a directory (`blog.meta.toml`) describes the synthesized page, so the
//! rule holds for phantom pages too.
//!
//! ## Closed Set of Handlers
//!
//! The four mummifiers are known at compile time and owned by the
//! [`mummifier::Registry`]. An artifact records which kind planned it; the
//! mummify phase dispatches on that kind rather than re-inspecting paths.

pub mod artifact;
pub mod config;
pub mod context;
pub mod deploy;
pub mod description;
pub mod imaging;
pub mod mummifier;
pub mod mummify;
pub mod naming;
pub mod output;
pub mod planner;
pub mod references;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
