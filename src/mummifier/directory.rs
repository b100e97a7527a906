//! Directory mummifier.
//!
//! Planning a directory decides its *content artifact* and plans every other
//! entry as a child:
//!
//! ```text
//! if a real content file is found (base names in order):
//!     content = plan(that file); it is not a child
//! else if the directory is veiled or there are no base names:
//!     content = none
//! else:
//!     content = phantom page named after the first base name
//! children = plan(every other entry that is not ignored)
//! ```
//!
//! A content file is an entry whose stem is a configured base name and which
//! the registry hands to the page mummifier, so `index.md` counts and
//! `index.css` does not. Entries are read in file-name order, which fixes
//! both the child order and which candidate wins when several match.
//!
//! The content artifact and the children are planned concurrently; the
//! directory artifact is assembled once both are done.

use super::Mummifier;
use crate::artifact::{Artifact, MummifierKind};
use crate::context::Context;
use crate::mummify::{MummifyAction, MummifyError, MummifyScope};
use crate::naming;
use crate::planner::{self, PlanError};
use crate::types::MediaType;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

pub struct DirectoryMummifier;

impl Mummifier for DirectoryMummifier {
    fn kind(&self) -> MummifierKind {
        MummifierKind::Directory
    }

    fn supported_extensions(&self) -> &[&'static str] {
        &[]
    }

    fn media_type_for(&self, _path: &Path) -> Option<MediaType> {
        None
    }

    fn plan(&self, context: &Context, source_path: &Path) -> Result<Artifact, PlanError> {
        let entries = read_entries(context, source_path)?;
        let content_file = find_content_file(context, &entries);
        // The source root always gets a page, whatever its name.
        let veiled = source_path != context.source_root() && context.is_veiled(source_path);
        let others: Vec<&PathBuf> = entries
            .iter()
            .filter(|e| Some(e.as_path()) != content_file)
            .collect();

        let (content, children) = rayon::join(
            || plan_content(context, source_path, content_file, veiled),
            || {
                others
                    .par_iter()
                    .map(|entry| planner::plan_path(context, entry))
                    .collect::<Result<Vec<_>, _>>()
            },
        );

        let target = planner::target_path(context, source_path, None)?;
        Ok(
            Artifact::directory(source_path.to_path_buf(), target, content?, children?)
                .with_navigable(!veiled),
        )
    }

    fn mummify(
        &self,
        scope: &MummifyScope<'_>,
        _context_artifact: &Artifact,
        artifact: &Artifact,
    ) -> Result<(), MummifyError> {
        let target = artifact.target_path();
        fs::create_dir_all(target)
            .map_err(MummifyError::write_failed(MummifierKind::Directory, target))?;
        scope.emit(MummifierKind::Directory, target, MummifyAction::Created);

        if let Some(content) = artifact.content_artifact() {
            scope.mummify(artifact, content)?;
        }
        artifact
            .child_artifacts()
            .par_iter()
            .try_for_each(|child| scope.mummify(artifact, child))
    }
}

/// Entries of `dir` that are not ignored, sorted by file name.
fn read_entries(context: &Context, dir: &Path) -> Result<Vec<PathBuf>, PlanError> {
    let mut entries = fs::read_dir(dir)
        .map_err(PlanError::io(dir))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(PlanError::io(dir))?;
    entries.retain(|path| !context.is_ignored(path));
    entries.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(entries)
}

/// The first entry, by base name order then file-name order, that is a page
/// named after a content base name.
fn find_content_file<'a>(context: &Context, entries: &'a [PathBuf]) -> Option<&'a Path> {
    context.content_base_names().iter().find_map(|base| {
        entries
            .iter()
            .filter(|path| naming::has_base_name(path, base))
            .find(|path| {
                context
                    .mummifier_for_path(path)
                    .is_some_and(|m| m.kind() == MummifierKind::Page)
            })
            .map(PathBuf::as_path)
    })
}

fn plan_content(
    context: &Context,
    directory: &Path,
    content_file: Option<&Path>,
    veiled: bool,
) -> Result<Option<Artifact>, PlanError> {
    if let Some(file) = content_file {
        return context
            .registry()
            .page()
            .plan_content(context, file, directory)
            .map(Some);
    }
    match context.content_base_names().first() {
        Some(base) if !veiled => context
            .registry()
            .page()
            .plan_phantom(context, directory, base)
            .map(Some),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::mummify;
    use crate::test_helpers::{child_names, context_for, context_with, find_child, write_tree};
    use tempfile::TempDir;

    fn plan_dir(ctx: &Context, relative: &str) -> Artifact {
        DirectoryMummifier
            .plan(ctx, &ctx.source_root().join(relative))
            .unwrap()
    }

    #[test]
    fn real_content_file_is_not_a_child() {
        let tmp = TempDir::new().unwrap();
        let ctx = context_for(&tmp);
        write_tree(
            ctx.source_root(),
            &[("blog/index.md", "# Blog"), ("blog/post1.md", "# One")],
        );
        let blog = plan_dir(&ctx, "blog");

        let content = blog.content_artifact().unwrap();
        assert!(!content.is_phantom());
        assert_eq!(content.source_path(), ctx.source_root().join("blog/index.md"));
        assert_eq!(child_names(&blog), vec!["post1.md"]);
        assert_eq!(blog.description(), content.description());
        assert_eq!(blog.title(), "Blog");
    }

    #[test]
    fn untitled_content_file_is_named_after_directory() {
        let tmp = TempDir::new().unwrap();
        let mut config = SiteConfig::default();
        config.site.title = Some("Field Notes".into());
        let ctx = context_with(&tmp, config);
        write_tree(
            ctx.source_root(),
            &[
                ("index.md", "no heading"),
                ("020-blog/index.md", "no heading either"),
                ("020-blog/post.md", "plain"),
            ],
        );
        let blog = plan_dir(&ctx, "020-blog");
        assert_eq!(blog.title(), "blog");
        assert_eq!(blog.description().order(), Some(20));
        assert_eq!(find_child(&blog, "post.md").title(), "post");

        let root = DirectoryMummifier.plan(&ctx, ctx.source_root()).unwrap();
        assert_eq!(root.title(), "Field Notes");
    }

    #[test]
    fn phantom_when_no_content_file() {
        let tmp = TempDir::new().unwrap();
        let ctx = context_for(&tmp);
        write_tree(
            ctx.source_root(),
            &[("blog/post2.html", "<p>2</p>"), ("blog/post1.html", "<p>1</p>")],
        );
        let blog = plan_dir(&ctx, "blog");

        let content = blog.content_artifact().unwrap();
        assert!(content.is_phantom());
        assert_eq!(
            content.target_path(),
            ctx.target_root().join("blog").join("index.html")
        );
        assert_eq!(content.description().title(), Some("blog"));
        assert_eq!(child_names(&blog), vec!["post1.html", "post2.html"]);
    }

    #[test]
    fn base_names_tried_in_order() {
        let tmp = TempDir::new().unwrap();
        let mut config = SiteConfig::default();
        config.content.base_names = vec!["index".into(), "readme".into()];
        let ctx = context_with(&tmp, config);
        write_tree(
            ctx.source_root(),
            &[
                ("a/readme.md", "# Readme"),
                ("a/index.css", "x"),
                ("b/readme.md", "# Readme"),
                ("b/index.html", "<title>Index</title>"),
            ],
        );

        let a = plan_dir(&ctx, "a");
        assert_eq!(a.content_artifact().unwrap().source_path(), ctx.source_root().join("a/readme.md"));
        assert_eq!(child_names(&a), vec!["index.css"]);

        let b = plan_dir(&ctx, "b");
        assert_eq!(b.content_artifact().unwrap().source_path(), ctx.source_root().join("b/index.html"));
        assert_eq!(child_names(&b), vec!["readme.md"]);
    }

    #[test]
    fn phantom_uses_first_base_name() {
        let tmp = TempDir::new().unwrap();
        let mut config = SiteConfig::default();
        config.content.base_names = vec!["home".into(), "index".into()];
        let ctx = context_with(&tmp, config);
        write_tree(ctx.source_root(), &[("docs/guide.md", "# Guide")]);
        let docs = plan_dir(&ctx, "docs");
        assert_eq!(
            docs.content_artifact().unwrap().target_path(),
            ctx.target_root().join("docs/home.html")
        );
    }

    #[test]
    fn veiled_directory_gets_no_phantom_but_keeps_children() {
        let tmp = TempDir::new().unwrap();
        let ctx = context_for(&tmp);
        write_tree(
            ctx.source_root(),
            &[("_drafts/one.md", "# One"), ("_drafts/two.txt", "two")],
        );
        let drafts = plan_dir(&ctx, "_drafts");
        assert!(drafts.content_artifact().is_none());
        assert!(!drafts.is_navigable());
        assert!(drafts.description().is_empty());
        assert_eq!(child_names(&drafts), vec!["one.md", "two.txt"]);
    }

    #[test]
    fn veiled_directory_keeps_real_content() {
        let tmp = TempDir::new().unwrap();
        let ctx = context_for(&tmp);
        write_tree(ctx.source_root(), &[("_notes/index.md", "# Notes")]);
        let notes = plan_dir(&ctx, "_notes");
        assert!(!notes.content_artifact().unwrap().is_phantom());
    }

    #[test]
    fn no_base_names_means_no_content() {
        let tmp = TempDir::new().unwrap();
        let mut config = SiteConfig::default();
        config.content.base_names = vec![];
        let ctx = context_with(&tmp, config);
        write_tree(ctx.source_root(), &[("blog/index.md", "# Blog")]);
        let blog = plan_dir(&ctx, "blog");
        assert!(blog.content_artifact().is_none());
        assert_eq!(child_names(&blog), vec!["index.md"]);
    }

    #[test]
    fn only_content_file_gives_empty_children() {
        let tmp = TempDir::new().unwrap();
        let ctx = context_for(&tmp);
        write_tree(ctx.source_root(), &[("about/index.md", "# About")]);
        let about = plan_dir(&ctx, "about");
        assert!(about.content_artifact().is_some());
        assert!(about.child_artifacts().is_empty());
    }

    #[test]
    fn ignored_entries_and_sidecars_are_skipped() {
        let tmp = TempDir::new().unwrap();
        let ctx = context_for(&tmp);
        write_tree(
            ctx.source_root(),
            &[
                ("blog/.DS_Store", "x"),
                ("blog/post.md", "# Post"),
                ("blog/post.md.meta.toml", "title = \"P\""),
            ],
        );
        assert_eq!(child_names(&plan_dir(&ctx, "blog")), vec!["post.md"]);
    }

    #[test]
    fn nested_directories_are_children() {
        let tmp = TempDir::new().unwrap();
        let ctx = context_for(&tmp);
        write_tree(ctx.source_root(), &[("a/b/c/deep.md", "# Deep")]);
        let a = plan_dir(&ctx, "a");
        let b = find_child(&a, "b");
        let c = find_child(b, "c");
        assert!(b.is_directory() && c.is_directory());
        assert_eq!(child_names(c), vec!["deep.md"]);
        assert_eq!(c.target_path(), ctx.target_root().join("a/b/c"));
    }

    #[test]
    fn unreadable_directory_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let ctx = context_for(&tmp);
        let err = DirectoryMummifier
            .plan(&ctx, &ctx.source_root().join("gone"))
            .unwrap_err();
        assert!(matches!(err, PlanError::Io { path, .. } if path.ends_with("gone")));
    }

    #[test]
    fn mummify_twice_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let ctx = context_for(&tmp);
        write_tree(ctx.source_root(), &[("empty/", "")]);
        let root = planner::plan(&ctx).unwrap();

        mummify::mummify(&ctx, &root, None).unwrap();
        mummify::mummify(&ctx, &root, None).unwrap();
        assert!(ctx.target_root().join("empty").is_dir());
        assert!(ctx.target_root().join("empty/index.html").is_file());
    }

    #[test]
    fn directory_created_before_content_and_children() {
        let tmp = TempDir::new().unwrap();
        let ctx = context_for(&tmp);
        write_tree(
            ctx.source_root(),
            &[("index.md", "# Home"), ("blog/post1.md", "# One")],
        );
        let root = planner::plan(&ctx).unwrap();
        let (tx, rx) = std::sync::mpsc::channel();
        mummify::mummify(&ctx, &root, Some(tx)).unwrap();

        let targets: Vec<PathBuf> = rx.iter().map(|e| e.target).collect();
        let pos = |p: PathBuf| targets.iter().position(|t| *t == p).unwrap();
        let blog_dir = pos(ctx.target_root().join("blog"));
        assert!(pos(ctx.target_root().to_path_buf()) < blog_dir);
        assert!(blog_dir < pos(ctx.target_root().join("blog/index.html")));
        assert!(blog_dir < pos(ctx.target_root().join("blog/post1.html")));
    }
}
