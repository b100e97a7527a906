//! Page mummifier: markup sources become `.html` pages.
//!
//! Markdown (`md`, `markdown`) is rendered with pulldown-cmark and wrapped in
//! a Maud document. HTML sources (`html`, `htm`, `xhtml`) are already
//! rendered and are copied as they are.
//!
//! Relative links in markdown are resolved through the run's
//! [`ReferenceIndex`](crate::references::ReferenceIndex), so `[Blog](blog/)`
//! and `[Blog](blog/index.md)` both land on the page that represents the
//! blog directory.
//!
//! ## Phantom pages
//!
//! A directory with no content file gets a synthesized page planned by
//! [`PageMummifier::plan_phantom`]. It has no source bytes; mummifying it
//! renders a listing of the directory's navigable children.

use super::Mummifier;
use crate::artifact::{Artifact, ArtifactSource, MummifierKind};
use crate::context::Context;
use crate::description::{self, PropertyValue, ResourceDescription};
use crate::mummify::{MummifyAction, MummifyError, MummifyScope};
use crate::naming;
use crate::planner::{self, PlanError};
use crate::references::{self, ReferenceIndex};
use crate::types::MediaType;
use maud::{DOCTYPE, Markup, PreEscaped, html};
use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, html as md_html};
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use tracing::info;

/// Every extension the page mummifier claims.
pub const EXTENSIONS: &[&str] = &["md", "markdown", "html", "htm", "xhtml"];

/// The subset rendered from markdown.
const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown"];

static HTML_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("valid title pattern"));

pub struct PageMummifier;

impl PageMummifier {
    /// Plan the synthesized content page of `directory`.
    ///
    /// The nominal source is `<directory>/<base_name>.<phantom_extension>`;
    /// nothing exists there. The title is the site title for the source
    /// root, otherwise the directory's display name. A sidecar next to the
    /// directory (`blog.meta.toml`) describes the synthesized page.
    pub fn plan_phantom(
        &self,
        context: &Context,
        directory: &Path,
        base_name: &str,
    ) -> Result<Artifact, PlanError> {
        let extension = &context.config().content.phantom_extension;
        let nominal = directory.join(format!("{base_name}.{extension}"));
        let target = planner::target_path(context, &nominal, Some("html"))?;

        let is_root = directory == context.source_root();
        let mut description = if is_root {
            ResourceDescription::new()
        } else {
            planner::sidecar_description(context, directory)?
        };
        if is_root && let Some(title) = &context.config().site.title {
            description.set_if_absent(description::TITLE, PropertyValue::Text(title.clone()));
        }
        planner::apply_name_defaults(&mut description, &naming::file_name(directory));
        description.set_if_absent(
            description::CONTENT_TYPE,
            PropertyValue::MediaType(MediaType::html()),
        );

        info!(
            directory = %directory.display(),
            target_path = %target.display(),
            "synthesizing phantom content page"
        );
        Ok(Artifact::file(
            ArtifactSource::Phantom(nominal),
            target,
            MummifierKind::Page,
            description,
        )
        .with_navigable(true))
    }

    /// Plan a real page chosen as `directory`'s content. Without a sidecar
    /// or embedded title it is named after the directory (the site title
    /// for the source root), the same as a synthesized page would be.
    pub fn plan_content(
        &self,
        context: &Context,
        source_path: &Path,
        directory: &Path,
    ) -> Result<Artifact, PlanError> {
        let site_title = if directory == context.source_root() {
            context.config().site.title.as_deref()
        } else {
            None
        };
        plan_page(context, source_path, &naming::file_name(directory), site_title)
    }
}

impl Mummifier for PageMummifier {
    fn kind(&self) -> MummifierKind {
        MummifierKind::Page
    }

    fn supported_extensions(&self) -> &[&'static str] {
        EXTENSIONS
    }

    fn media_type_for(&self, path: &Path) -> Option<MediaType> {
        naming::extension_of(path)
            .filter(|ext| self.claims_extension(ext))
            .map(|_| MediaType::html())
    }

    fn plan(&self, context: &Context, source_path: &Path) -> Result<Artifact, PlanError> {
        plan_page(context, source_path, &naming::stem_of(source_path), None)
    }

    fn mummify(
        &self,
        scope: &MummifyScope<'_>,
        context_artifact: &Artifact,
        artifact: &Artifact,
    ) -> Result<(), MummifyError> {
        let target = artifact.target_path();
        let write_failed = MummifyError::write_failed(MummifierKind::Page, target);

        if artifact.is_phantom() {
            let page = render_listing(scope.context(), context_artifact, artifact);
            fs::write(target, page.into_string()).map_err(write_failed)?;
            scope.emit(MummifierKind::Page, target, MummifyAction::Generated);
            return Ok(());
        }

        let source = artifact.source_path();
        if !is_markdown(source) {
            fs::copy(source, target)
                .map_err(MummifyError::read_failed(MummifierKind::Page, source, target))?;
            scope.emit(MummifierKind::Page, target, MummifyAction::Copied);
            return Ok(());
        }

        let bytes = fs::read(source)
            .map_err(MummifyError::read_failed(MummifierKind::Page, source, target))?;
        let body = render_markdown(
            scope.references(),
            source,
            target,
            &String::from_utf8_lossy(&bytes),
        );
        let page = page_document(
            scope.context(),
            artifact.description(),
            &artifact.title(),
            PreEscaped(body),
        );
        fs::write(target, page.into_string()).map_err(write_failed)?;
        scope.emit(MummifierKind::Page, target, MummifyAction::Rendered);
        Ok(())
    }
}

/// Plan a real page. When neither the sidecar nor the page itself names it,
/// the title is `fallback_title`, else derived from `default_name` by the
/// `NNN-name` convention (which also supplies the order).
fn plan_page(
    context: &Context,
    source_path: &Path,
    default_name: &str,
    fallback_title: Option<&str>,
) -> Result<Artifact, PlanError> {
    let bytes = fs::read(source_path).map_err(PlanError::io(source_path))?;
    let text = String::from_utf8_lossy(&bytes);

    let mut description = planner::sidecar_description(context, source_path)?;
    if let Some(title) = embedded_title(source_path, &text) {
        description.set_if_absent(description::TITLE, PropertyValue::Text(title));
    }
    if let Some(title) = fallback_title {
        description.set_if_absent(description::TITLE, PropertyValue::Text(title.to_string()));
    }
    planner::apply_name_defaults(&mut description, default_name);
    description.set_if_absent(
        description::CONTENT_TYPE,
        PropertyValue::MediaType(MediaType::html()),
    );

    let target = planner::target_path(context, source_path, Some("html"))?;
    Ok(Artifact::file(
        ArtifactSource::Real(source_path.to_path_buf()),
        target,
        MummifierKind::Page,
        description,
    )
    .with_navigable(!context.is_veiled(source_path)))
}

fn is_markdown(path: &Path) -> bool {
    naming::extension_of(path).is_some_and(|ext| MARKDOWN_EXTENSIONS.contains(&ext.as_str()))
}

/// Title embedded in the source: the first `# heading` of markdown, or the
/// `<title>` of HTML.
fn embedded_title(path: &Path, text: &str) -> Option<String> {
    let found = if is_markdown(path) {
        text.lines()
            .find(|line| line.starts_with("# "))
            .map(|line| line.trim_start_matches("# "))
    } else {
        HTML_TITLE
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
    };
    description::resolve(&[found])
}

/// Render markdown to HTML, rewriting link and image destinations that
/// resolve to planned artifacts.
fn render_markdown(references: &ReferenceIndex, source: &Path, target: &Path, text: &str) -> String {
    let rewrite = |url| rewrite_url(references, source, target, url);
    let options = Options::ENABLE_TABLES | Options::ENABLE_FOOTNOTES | Options::ENABLE_STRIKETHROUGH;
    let events = Parser::new_ext(text, options).map(|event| match event {
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: rewrite(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: rewrite(dest_url),
            title,
            id,
        }),
        other => other,
    });

    let mut out = String::new();
    md_html::push_html(&mut out, events);
    out
}

fn rewrite_url<'a>(
    references: &ReferenceIndex,
    source: &Path,
    target: &Path,
    url: CowStr<'a>,
) -> CowStr<'a> {
    match references.rewrite(source, target, &url) {
        Some(link) => CowStr::from(link),
        None => url,
    }
}

/// Listing page for a directory: its title, then its navigable children.
fn render_listing(context: &Context, directory: &Artifact, page: &Artifact) -> Markup {
    let from_dir = page.target_path().parent().unwrap_or(directory.target_path());
    let mut entries: Vec<&Artifact> = directory
        .child_artifacts()
        .iter()
        .filter(|c| c.is_navigable())
        .collect();
    entries.sort_by_cached_key(|c| listing_key(c));

    let title = page.title();
    let body = html! {
        h1 { (title) }
        ul.listing {
            @for entry in &entries {
                li {
                    a href=(references::href_to(from_dir, entry)) { (entry.title()) }
                }
            }
        }
    };
    page_document(context, page.description(), &title, body)
}

/// Entries with an order come first, by order; then by file name.
fn listing_key(artifact: &Artifact) -> (bool, i64, String) {
    let name = naming::file_name(artifact.source_path());
    let order = artifact.description().order().or_else(|| {
        let stem = if artifact.is_directory() {
            name.clone()
        } else {
            naming::stem_of(artifact.source_path())
        };
        naming::parse_entry_name(&stem).order.map(i64::from)
    });
    (order.is_none(), order.unwrap_or_default(), name)
}

/// The document every rendered page shares.
fn page_document(
    context: &Context,
    description: &ResourceDescription,
    title: &str,
    body: Markup,
) -> Markup {
    let full_title = match context.lookup("site.title").and_then(|v| v.as_str()) {
        Some(site) if site != title => format!("{title} - {site}"),
        _ => title.to_string(),
    };
    let published = description.published_on().map(|d| d.to_string());
    let copyright = description.copyright();

    html! {
        (DOCTYPE)
        html lang=(context.config().site.language) {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (full_title) }
                @if let Some(text) = description.description() {
                    meta name="description" content=(text);
                }
            }
            body {
                main { (body) }
                @if published.is_some() || copyright.is_some() {
                    footer {
                        @if let Some(date) = &published {
                            time datetime=(date) { (date) }
                        }
                        @if let Some(notice) = copyright {
                            p.copyright { (notice) }
                        }
                    }
                }
            }
        }
    }
}
