//! CLI output formatting for planning and mummification.
//!
//! # Information-First Display
//!
//! Every artifact leads with its positional index, title and mummifier;
//! source and target paths follow as indented context lines, relative to
//! their roots. The output reads as an inventory of the site while still
//! tracing each entry back to its file.
//!
//! # Output Format
//!
//! ## Plan
//!
//! ```text
//! My Site [directory]
//!     Source: ./
//!     Target: ./
//!     Content: My Site [page, phantom]
//!         Source: index.md
//!         Target: index.html
//!     001 blog [directory]
//!         Source: blog/
//!         Target: blog/
//!         Content: blog [page, phantom]
//!             Source: blog/index.md
//!             Target: blog/index.html
//!         001 First post [page]
//!             Source: blog/010-first-post.md
//!             Target: blog/010-first-post.html
//!     002 dawn [image]
//!         Source: dawn.jpg
//!         Target: dawn.jpg
//!         Variant thumb: dawn-thumb.jpg
//!
//! Planned 6 artifacts: 2 directories, 3 pages (2 phantom), 1 image, 0 opaque
//! ```
//!
//! ## Build
//!
//! ```text
//! created   ./
//! generated index.html
//! created   blog/
//! rendered  blog/010-first-post.html
//! scaled    dawn.jpg (800x600)
//! variant   dawn-thumb.jpg (thumb 200x150)
//!
//! Wrote 5 files in 2 directories (1.2 MB)
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns lines) for testability and
//! a `print_*` wrapper that writes to stdout. Format functions are pure: no
//! I/O, no side effects. [`summarize_target`] is the one function here that
//! reads the filesystem, and it only gathers numbers for
//! [`format_target_summary`].

use crate::artifact::{Artifact, MummifierKind};
use crate::mummify::{MummifyAction, MummifyEvent};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Path relative to `root` for display. The root itself is `./`; directories
/// get a trailing slash.
fn display_path(path: &Path, root: &Path, directory: bool) -> String {
    let relative = match path.strip_prefix(root) {
        Ok(rel) if rel.as_os_str().is_empty() => return "./".to_string(),
        Ok(rel) => rel.to_string_lossy().replace('\\', "/"),
        Err(_) => path.display().to_string(),
    };
    if directory {
        format!("{relative}/")
    } else {
        relative
    }
}

/// `[page]`, `[page, phantom]`, `[directory, veiled]`...
fn tags(artifact: &Artifact) -> String {
    let mut tags = vec![artifact.mummifier().as_str()];
    if artifact.is_phantom() {
        tags.push("phantom");
    }
    let hidden_by_default = matches!(
        artifact.mummifier(),
        MummifierKind::Image | MummifierKind::Opaque
    );
    if !artifact.is_navigable() && !hidden_by_default {
        tags.push("veiled");
    }
    format!("[{}]", tags.join(", "))
}

/// Human-readable byte count.
fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

fn plural(n: usize, one: &str, many: &str) -> String {
    format!("{n} {}", if n == 1 { one } else { many })
}

// ============================================================================
// Plan output
// ============================================================================

/// The roots paths are shown relative to, plus optional fingerprints keyed
/// by source path.
pub struct PlanDisplay<'a> {
    pub source_root: &'a Path,
    pub target_root: &'a Path,
    pub fingerprints: Option<&'a BTreeMap<PathBuf, String>>,
}

/// Format the planned artifact graph as an indented tree followed by a
/// count line.
pub fn format_plan_output(root: &Artifact, display: &PlanDisplay<'_>) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(format!("{} {}", root.title(), tags(root)));
    format_details(&mut lines, root, 1, display);
    lines.push(String::new());
    lines.push(format_plan_counts(root));
    lines
}

fn format_details(lines: &mut Vec<String>, artifact: &Artifact, depth: usize, display: &PlanDisplay<'_>) {
    let pad = indent(depth);
    let directory = artifact.is_directory();
    lines.push(format!(
        "{pad}Source: {}",
        display_path(artifact.source_path(), display.source_root, directory)
    ));
    lines.push(format!(
        "{pad}Target: {}",
        display_path(artifact.target_path(), display.target_root, directory)
    ));
    for variant in artifact.variants() {
        lines.push(format!(
            "{pad}Variant {}: {}",
            variant.name,
            display_path(&variant.target_path, display.target_root, false)
        ));
    }
    if let Some(fingerprint) = display
        .fingerprints
        .and_then(|f| f.get(artifact.source_path()))
    {
        lines.push(format!("{pad}Fingerprint: {fingerprint}"));
    }

    if let Some(content) = artifact.content_artifact() {
        lines.push(format!("{pad}Content: {} {}", content.title(), tags(content)));
        format_details(lines, content, depth + 1, display);
    }
    for (i, child) in artifact.child_artifacts().iter().enumerate() {
        lines.push(format!(
            "{pad}{} {} {}",
            format_index(i + 1),
            child.title(),
            tags(child)
        ));
        format_details(lines, child, depth + 1, display);
    }
}

/// `Planned N artifacts: ...` over the whole graph.
pub fn format_plan_counts(root: &Artifact) -> String {
    let mut counts: BTreeMap<MummifierKind, usize> = BTreeMap::new();
    let mut phantoms = 0;
    let mut total = 0;
    for artifact in root.walk() {
        *counts.entry(artifact.mummifier()).or_default() += 1;
        phantoms += usize::from(artifact.is_phantom());
        total += 1;
    }
    let count = |kind: MummifierKind| counts.get(&kind).copied().unwrap_or_default();
    let pages = plural(count(MummifierKind::Page), "page", "pages");
    let pages = if phantoms > 0 {
        format!("{pages} ({phantoms} phantom)")
    } else {
        pages
    };
    format!(
        "Planned {}: {}, {}, {}, {} opaque",
        plural(total, "artifact", "artifacts"),
        plural(count(MummifierKind::Directory), "directory", "directories"),
        pages,
        plural(count(MummifierKind::Image), "image", "images"),
        count(MummifierKind::Opaque),
    )
}

/// Print plan output to stdout.
pub fn print_plan_output(root: &Artifact, display: &PlanDisplay<'_>) {
    for line in format_plan_output(root, display) {
        println!("{}", line);
    }
}

// ============================================================================
// Mummification output
// ============================================================================

/// Format one mummification event as a single line.
pub fn format_mummify_event(event: &MummifyEvent, target_root: &Path) -> String {
    let directory = event.action == MummifyAction::Created;
    let path = display_path(&event.target, target_root, directory);
    let (verb, detail) = match &event.action {
        MummifyAction::Created => ("created", None),
        MummifyAction::Rendered => ("rendered", None),
        MummifyAction::Generated => ("generated", None),
        MummifyAction::Copied => ("copied", None),
        MummifyAction::Scaled { width, height } => ("scaled", Some(format!("{width}x{height}"))),
        MummifyAction::Variant {
            name,
            width,
            height,
        } => ("variant", Some(format!("{name} {width}x{height}"))),
    };
    match detail {
        Some(detail) => format!("{verb:<9} {path} ({detail})"),
        None => format!("{verb:<9} {path}"),
    }
}

/// What the target tree holds after a build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TargetSummary {
    pub files: usize,
    pub directories: usize,
    pub bytes: u64,
}

/// Count files, directories (the root excluded) and bytes under `root`.
pub fn summarize_target(root: &Path) -> io::Result<TargetSummary> {
    let mut summary = TargetSummary::default();
    for entry in WalkDir::new(root).min_depth(1) {
        let entry = entry.map_err(io::Error::other)?;
        if entry.file_type().is_dir() {
            summary.directories += 1;
        } else if entry.file_type().is_file() {
            summary.files += 1;
            summary.bytes += entry.metadata().map_err(io::Error::other)?.len();
        }
    }
    Ok(summary)
}

pub fn format_target_summary(summary: &TargetSummary) -> String {
    format!(
        "Wrote {} in {} ({})",
        plural(summary.files, "file", "files"),
        plural(summary.directories, "directory", "directories"),
        format_bytes(summary.bytes)
    )
}

/// Print the target summary to stdout.
pub fn print_target_summary(summary: &TargetSummary) {
    println!();
    println!("{}", format_target_summary(summary));
}

// ============================================================================
// Tests
// ============================================================================
