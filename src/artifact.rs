//! The artifact graph.
//!
//! An [`Artifact`] is one planned unit of output: where it comes from, where
//! it goes, which mummifier materializes it, and what is known about it.
//! Directories are composite: they hold an optional *content artifact* (the
//! page that represents the directory, e.g. its `index.md`) and the
//! artifacts of their other entries.
//!
//! Artifacts are built once by the planner and never mutated afterwards, so
//! the whole graph can be shared read-only across mummification workers.
//!
//! ## Two views of a directory
//!
//! - **comprised** artifacts: content + children, the full one-level walk
//! - **subsumed** artifacts: content only, what *represents* the directory
//!
//! A directory's description, referent source paths and link target all
//! come from its subsumed view.

use crate::description::ResourceDescription;
use crate::naming;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

static EMPTY_DESCRIPTION: ResourceDescription = ResourceDescription::new();

/// The closed set of mummifier variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MummifierKind {
    Directory,
    Page,
    Image,
    Opaque,
}

impl MummifierKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Directory => "directory",
            Self::Page => "page",
            Self::Image => "image",
            Self::Opaque => "opaque",
        }
    }
}

impl fmt::Display for MummifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an artifact's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "lowercase")]
pub enum ArtifactSource {
    /// A file or directory present in the source tree.
    Real(PathBuf),
    /// A synthesized artifact. The path is nominal: nothing exists there.
    Phantom(PathBuf),
}

impl ArtifactSource {
    pub fn path(&self) -> &Path {
        match self {
            Self::Real(p) | Self::Phantom(p) => p,
        }
    }

    pub fn is_phantom(&self) -> bool {
        matches!(self, Self::Phantom(_))
    }
}

/// An extra output produced beside a file artifact (an image aspect).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactVariant {
    pub name: String,
    pub target_path: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum ArtifactBody {
    Directory {
        content: Option<Box<Artifact>>,
        children: Vec<Artifact>,
    },
    File {
        description: ResourceDescription,
        variants: Vec<ArtifactVariant>,
    },
}

/// One node of the build graph.
#[derive(Debug, Clone, Serialize)]
pub struct Artifact {
    source: ArtifactSource,
    target_path: PathBuf,
    mummifier: MummifierKind,
    navigable: bool,
    #[serde(flatten)]
    body: ArtifactBody,
}

impl Artifact {
    /// A leaf artifact. Not navigable unless marked so.
    pub fn file(
        source: ArtifactSource,
        target_path: PathBuf,
        mummifier: MummifierKind,
        description: ResourceDescription,
    ) -> Self {
        Self {
            source,
            target_path,
            mummifier,
            navigable: false,
            body: ArtifactBody::File {
                description,
                variants: Vec::new(),
            },
        }
    }

    /// A directory artifact. Navigable unless marked otherwise.
    pub fn directory(
        source_path: PathBuf,
        target_path: PathBuf,
        content: Option<Artifact>,
        children: Vec<Artifact>,
    ) -> Self {
        Self {
            source: ArtifactSource::Real(source_path),
            target_path,
            mummifier: MummifierKind::Directory,
            navigable: true,
            body: ArtifactBody::Directory {
                content: content.map(Box::new),
                children,
            },
        }
    }

    pub fn with_navigable(mut self, navigable: bool) -> Self {
        self.navigable = navigable;
        self
    }

    /// Attach variant outputs. Directories have none; the call is a no-op
    /// for them.
    pub fn with_variants(mut self, new_variants: Vec<ArtifactVariant>) -> Self {
        if let ArtifactBody::File { variants, .. } = &mut self.body {
            *variants = new_variants;
        }
        self
    }

    pub fn source(&self) -> &ArtifactSource {
        &self.source
    }

    pub fn source_path(&self) -> &Path {
        self.source.path()
    }

    pub fn is_phantom(&self) -> bool {
        self.source.is_phantom()
    }

    pub fn target_path(&self) -> &Path {
        &self.target_path
    }

    pub fn mummifier(&self) -> MummifierKind {
        self.mummifier
    }

    pub fn is_navigable(&self) -> bool {
        self.navigable
    }

    pub fn is_directory(&self) -> bool {
        matches!(self.body, ArtifactBody::Directory { .. })
    }

    pub fn is_source_path_file(&self) -> bool {
        !self.is_directory()
    }

    /// The artifact's metadata. A directory has none of its own: it reports
    /// its content artifact's description, or an empty one.
    pub fn description(&self) -> &ResourceDescription {
        match &self.body {
            ArtifactBody::File { description, .. } => description,
            ArtifactBody::Directory { content, .. } => content
                .as_deref()
                .map_or(&EMPTY_DESCRIPTION, Artifact::description),
        }
    }

    pub fn content_artifact(&self) -> Option<&Artifact> {
        match &self.body {
            ArtifactBody::Directory { content, .. } => content.as_deref(),
            ArtifactBody::File { .. } => None,
        }
    }

    pub fn child_artifacts(&self) -> &[Artifact] {
        match &self.body {
            ArtifactBody::Directory { children, .. } => children,
            ArtifactBody::File { .. } => &[],
        }
    }

    pub fn variants(&self) -> &[ArtifactVariant] {
        match &self.body {
            ArtifactBody::File { variants, .. } => variants,
            ArtifactBody::Directory { .. } => &[],
        }
    }

    /// Content artifact (if any) followed by the children.
    pub fn comprised_artifacts(&self) -> impl Iterator<Item = &Artifact> {
        self.content_artifact()
            .into_iter()
            .chain(self.child_artifacts())
    }

    /// The artifacts that stand for this one: a directory's content artifact.
    pub fn subsumed_artifacts(&self) -> impl Iterator<Item = &Artifact> {
        self.content_artifact().into_iter()
    }

    /// Source paths whose output this artifact semantically is: its own, plus
    /// everything its subsumed artifacts report.
    pub fn referent_source_paths(&self) -> BTreeSet<PathBuf> {
        let mut paths = BTreeSet::from([self.source_path().to_path_buf()]);
        for subsumed in self.subsumed_artifacts() {
            paths.extend(subsumed.referent_source_paths());
        }
        paths
    }

    /// Where a link to this artifact should point. A directory with content
    /// is reached through its content page.
    pub fn link_target(&self) -> &Path {
        match self.content_artifact() {
            Some(content) => content.link_target(),
            None => &self.target_path,
        }
    }

    /// Every path this artifact writes: its target plus any variants.
    pub fn target_paths(&self) -> impl Iterator<Item = &Path> {
        std::iter::once(self.target_path.as_path())
            .chain(self.variants().iter().map(|v| v.target_path.as_path()))
    }

    /// Display title: the description's title, else the source file name.
    pub fn title(&self) -> String {
        self.description()
            .title()
            .map(String::from)
            .unwrap_or_else(|| naming::file_name(self.source_path()))
    }

    /// Depth-first pre-order walk: the artifact, then its content, then each
    /// child subtree.
    pub fn walk(&self) -> Walk<'_> {
        Walk { stack: vec![self] }
    }

    /// Find the artifact planned for `source_path` anywhere in this subtree.
    pub fn find(&self, source_path: &Path) -> Option<&Artifact> {
        self.walk().find(|a| a.source_path() == source_path)
    }
}

/// Iterator returned by [`Artifact::walk`].
pub struct Walk<'a> {
    stack: Vec<&'a Artifact>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a Artifact;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        let before = self.stack.len();
        self.stack.extend(next.comprised_artifacts());
        self.stack[before..].reverse();
        Some(next)
    }
}
