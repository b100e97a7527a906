//! Cross-artifact references.
//!
//! Every artifact declares its *referent source paths*: the source paths
//! whose output it semantically is. A page's referents are its own source
//! path; a directory adds its content page's. The [`ReferenceIndex`] maps
//! each referent to the artifact's link target, so a page that links to
//! `../blog/` or `../blog/index.md` reaches the same generated file.
//!
//! Fingerprints hash the referents of an artifact, for callers that want to
//! know whether an artifact's inputs changed since a previous run.

use crate::artifact::Artifact;
use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use regex::Regex;
use sha2::{Digest, Sha256};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

/// `scheme:` prefix of an absolute URL (`https:`, `mailto:`, ...).
static URL_SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").expect("valid scheme pattern"));

/// Bytes escaped in an emitted path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Debug, Clone, PartialEq, Eq)]
struct LinkTarget {
    path: PathBuf,
    directory: bool,
}

/// Referent source path → link target, for a whole graph.
#[derive(Debug, Clone, Default)]
pub struct ReferenceIndex {
    targets: BTreeMap<PathBuf, LinkTarget>,
}

impl ReferenceIndex {
    pub fn build(root: &Artifact) -> Self {
        let mut targets = BTreeMap::new();
        for artifact in root.walk() {
            let target = LinkTarget {
                path: artifact.link_target().to_path_buf(),
                directory: links_to_directory(artifact),
            };
            for referent in artifact.referent_source_paths() {
                targets.entry(referent).or_insert_with(|| target.clone());
            }
        }
        Self { targets }
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// The link target for a source path, if any artifact claims it.
    pub fn resolve(&self, source_path: &Path) -> Option<&Path> {
        self.targets.get(source_path).map(|t| t.path.as_path())
    }

    /// Rewrite a link found in the page at `from_source`, which is written
    /// to `from_target`.
    ///
    /// Only relative links whose path resolves to a referent are rewritten.
    /// URLs with a scheme, root-relative and fragment-only links, and links
    /// to nothing known are left alone (`None`). The path is percent-decoded
    /// before lookup. A trailing `?query` or `#fragment` is carried over.
    pub fn rewrite(&self, from_source: &Path, from_target: &Path, href: &str) -> Option<String> {
        if href.is_empty()
            || href.starts_with('#')
            || href.starts_with('/')
            || href.starts_with('?')
            || URL_SCHEME.is_match(href)
        {
            return None;
        }
        let split = href.find(['?', '#']).unwrap_or(href.len());
        let (path_part, suffix) = href.split_at(split);

        let path_part = percent_decode_str(path_part)
            .decode_utf8()
            .unwrap_or(Cow::Borrowed(path_part));
        let base = from_source.parent()?;
        let source = normalize(&base.join(&*path_part));
        let target = self.targets.get(&source)?;
        let from_dir = from_target.parent()?;

        let mut link = relative_link(from_dir, &target.path);
        if target.directory {
            link.push('/');
        }
        link.push_str(suffix);
        Some(link)
    }
}

fn links_to_directory(artifact: &Artifact) -> bool {
    artifact.is_directory() && artifact.content_artifact().is_none()
}

/// Relative href from a page in `from_dir` to an artifact.
pub fn href_to(from_dir: &Path, artifact: &Artifact) -> String {
    let mut link = relative_link(from_dir, artifact.link_target());
    if links_to_directory(artifact) {
        link.push('/');
    }
    link
}

/// Lexically normalize a path: drop `.` components and fold `..` into the
/// preceding component. Nothing is read from disk.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other),
        }
    }
    out
}

/// `/`-separated relative URL from directory `from_dir` to `to`, with each
/// segment percent-encoded.
///
/// Both paths are expected to be absolute and normalized. Linking a
/// directory to itself yields `"."`.
pub fn relative_link(from_dir: &Path, to: &Path) -> String {
    let from: Vec<_> = from_dir.components().collect();
    let to_parts: Vec<_> = to.components().collect();
    let common = from
        .iter()
        .zip(&to_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let ups = std::iter::repeat_n("..".to_string(), from.len() - common);
    let downs = to_parts[common..]
        .iter()
        .map(|c| utf8_percent_encode(&c.as_os_str().to_string_lossy(), SEGMENT).to_string());
    let parts: Vec<String> = ups.chain(downs).collect();
    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

/// SHA-256 over an artifact's sorted referent paths and the bytes of the
/// ones that are files, as lower-case hex.
pub fn fingerprint(artifact: &Artifact) -> io::Result<String> {
    let mut hasher = Sha256::new();
    for path in artifact.referent_source_paths() {
        hasher.update(path.as_os_str().as_encoded_bytes());
        hasher.update(b"\0");
        if path.is_file() {
            hasher.update(fs::read(&path)?);
        }
        hasher.update(b"\0");
    }
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{ArtifactSource, MummifierKind};
    use crate::description::ResourceDescription;
    use tempfile::TempDir;

    fn page(source: &str, target: &str) -> Artifact {
        Artifact::file(
            ArtifactSource::Real(source.into()),
            target.into(),
            MummifierKind::Page,
            ResourceDescription::new(),
        )
    }

    fn site() -> Artifact {
        let blog = Artifact::directory(
            "/src/blog".into(),
            "/dst/blog".into(),
            Some(page("/src/blog/index.md", "/dst/blog/index.html")),
            vec![page("/src/blog/post1.md", "/dst/blog/post1.html")],
        );
        let bare = Artifact::directory("/src/files".into(), "/dst/files".into(), None, vec![]);
        Artifact::directory(
            "/src".into(),
            "/dst".into(),
            None,
            vec![blog, bare, page("/src/about.md", "/dst/about.html")],
        )
    }

    // =========================================================================
    // normalize / relative_link
    // =========================================================================

    #[test]
    fn normalize_folds_dots() {
        assert_eq!(
            normalize(Path::new("/src/blog/../about.md")),
            PathBuf::from("/src/about.md")
        );
        assert_eq!(
            normalize(Path::new("/src/./blog/")),
            PathBuf::from("/src/blog")
        );
        assert_eq!(normalize(Path::new("../x")), PathBuf::from("../x"));
        assert_eq!(normalize(Path::new("../../x")), PathBuf::from("../../x"));
        assert_eq!(normalize(Path::new("/src/../..")), PathBuf::from("/"));
    }

    #[test]
    fn relative_link_between_siblings_and_cousins() {
        assert_eq!(
            relative_link(Path::new("/dst/blog"), Path::new("/dst/blog/post1.html")),
            "post1.html"
        );
        assert_eq!(
            relative_link(Path::new("/dst/blog"), Path::new("/dst/about.html")),
            "../about.html"
        );
        assert_eq!(
            relative_link(Path::new("/dst/a/b"), Path::new("/dst/c/d.html")),
            "../../c/d.html"
        );
        assert_eq!(relative_link(Path::new("/dst"), Path::new("/dst")), ".");
    }

    #[test]
    fn relative_link_encodes_segments() {
        assert_eq!(
            relative_link(Path::new("/dst"), Path::new("/dst/my notes/a#1.html")),
            "my%20notes/a%231.html"
        );
    }

    // =========================================================================
    // ReferenceIndex
    // =========================================================================

    #[test]
    fn directory_and_its_content_resolve_to_content_page() {
        let index = ReferenceIndex::build(&site());
        assert_eq!(
            index.resolve(Path::new("/src/blog")),
            Some(Path::new("/dst/blog/index.html"))
        );
        assert_eq!(
            index.resolve(Path::new("/src/blog/index.md")),
            Some(Path::new("/dst/blog/index.html"))
        );
        assert_eq!(
            index.resolve(Path::new("/src/files")),
            Some(Path::new("/dst/files"))
        );
        assert!(index.resolve(Path::new("/src/missing.md")).is_none());
    }

    #[test]
    fn rewrite_decodes_escaped_hrefs() {
        let root = Artifact::directory(
            "/src".into(),
            "/dst".into(),
            None,
            vec![page("/src/my post.md", "/dst/my post.html")],
        );
        let index = ReferenceIndex::build(&root);
        let from_source = Path::new("/src/about.md");
        let from_target = Path::new("/dst/about.html");
        assert_eq!(
            index.rewrite(from_source, from_target, "my%20post.md#top"),
            Some("my%20post.html#top".to_string())
        );
        assert_eq!(
            index.rewrite(from_source, from_target, "my post.md"),
            Some("my%20post.html".to_string())
        );
    }

    #[test]
    fn rewrite_relative_links() {
        let index = ReferenceIndex::build(&site());
        let from_source = Path::new("/src/about.md");
        let from_target = Path::new("/dst/about.html");

        assert_eq!(
            index.rewrite(from_source, from_target, "blog/"),
            Some("blog/index.html".to_string())
        );
        assert_eq!(
            index.rewrite(from_source, from_target, "blog/post1.md#intro"),
            Some("blog/post1.html#intro".to_string())
        );
        assert_eq!(
            index.rewrite(from_source, from_target, "./files"),
            Some("files/".to_string())
        );
    }

    #[test]
    fn rewrite_from_nested_page() {
        let index = ReferenceIndex::build(&site());
        assert_eq!(
            index.rewrite(
                Path::new("/src/blog/post1.md"),
                Path::new("/dst/blog/post1.html"),
                "../about.md?x=1"
            ),
            Some("../about.html?x=1".to_string())
        );
    }

    #[test]
    fn rewrite_leaves_external_and_unknown_links() {
        let index = ReferenceIndex::build(&site());
        let from_source = Path::new("/src/about.md");
        let from_target = Path::new("/dst/about.html");
        for href in [
            "https://example.com/blog/",
            "mailto:me@example.com",
            "#top",
            "/blog/",
            "",
            "nowhere.md",
        ] {
            assert_eq!(index.rewrite(from_source, from_target, href), None, "{href}");
        }
    }

    #[test]
    fn href_to_directory_without_content_has_slash() {
        let root = site();
        let files = root.find(Path::new("/src/files")).unwrap();
        let blog = root.find(Path::new("/src/blog")).unwrap();
        assert_eq!(href_to(Path::new("/dst"), files), "files/");
        assert_eq!(href_to(Path::new("/dst"), blog), "blog/index.html");
    }

    // =========================================================================
    // fingerprint
    // =========================================================================

    #[test]
    fn fingerprint_changes_with_content_bytes() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("blog");
        std::fs::create_dir(&dir).unwrap();
        let index = dir.join("index.md");
        std::fs::write(&index, "# One").unwrap();

        let artifact = Artifact::directory(
            dir.clone(),
            tmp.path().join("out"),
            Some(page(index.to_str().unwrap(), "/dst/index.html")),
            vec![],
        );
        let first = fingerprint(&artifact).unwrap();
        assert_eq!(first.len(), 64);
        assert_eq!(first, fingerprint(&artifact).unwrap());

        std::fs::write(&index, "# Two").unwrap();
        assert_ne!(first, fingerprint(&artifact).unwrap());
    }

    #[test]
    fn fingerprint_of_phantom_needs_no_file() {
        let artifact = Artifact::file(
            ArtifactSource::Phantom("/nope/index.md".into()),
            "/dst/index.html".into(),
            MummifierKind::Page,
            ResourceDescription::new(),
        );
        assert!(fingerprint(&artifact).is_ok());
    }
}
