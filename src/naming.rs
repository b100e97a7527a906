//! File-name conventions.
//!
//! Source file names carry two pieces of information besides their extension:
//!
//! - an optional numeric order prefix, `NNN-name` (`020-about.md` sorts as 20)
//! - a display title, the name part with dashes read as spaces
//!   (`020-about-me.md` → "about me")
//!
//! Both are the lowest-priority source for the `order` and `title`
//! properties; sidecar and embedded metadata win over them.

use std::path::Path;

/// A file stem split along the `NNN-name` convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryName {
    /// Order prefix, if the stem starts with digits followed by a dash
    /// (or is digits only).
    pub order: Option<u32>,
    /// Name part after the prefix, dashes preserved.
    pub name: String,
    /// Display title. Never empty: a number-only stem keeps its digits.
    pub title: String,
}

/// Parse a file stem such as `"010-my-post"`.
///
/// - `"010-my-post"` → order 10, title "my post"
/// - `"post1"` → no order, title "post1"
/// - `"007"` → order 7, title "007"
/// - `"wip-notes"` → no order, title "wip notes"
pub fn parse_entry_name(stem: &str) -> EntryName {
    if let Some((prefix, rest)) = stem.split_once('-')
        && let Ok(order) = prefix.parse::<u32>()
    {
        let title = if rest.is_empty() {
            prefix.to_string()
        } else {
            rest.replace('-', " ")
        };
        return EntryName {
            order: Some(order),
            name: rest.to_string(),
            title,
        };
    }
    EntryName {
        order: stem.parse::<u32>().ok(),
        name: stem.to_string(),
        title: stem.replace('-', " "),
    }
}

/// Lossy file name of a path, empty for paths like `/`.
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Split a file name into stem and extension.
///
/// A leading dot does not start an extension: `.htaccess` has stem
/// `.htaccess` and no extension.
pub fn split_name(file_name: &str) -> (&str, Option<&str>) {
    match file_name.rfind('.') {
        Some(0) | None => (file_name, None),
        Some(pos) => (&file_name[..pos], Some(&file_name[pos + 1..])),
    }
}

/// Lower-cased extension of a path, if any.
pub fn extension_of(path: &Path) -> Option<String> {
    let name = file_name(path);
    split_name(&name).1.map(str::to_ascii_lowercase)
}

/// Stem of a path's file name.
pub fn stem_of(path: &Path) -> String {
    let name = file_name(path);
    split_name(&name).0.to_string()
}

/// Whether a path's stem is exactly `base` (e.g. `index.md` for `index`).
pub fn has_base_name(path: &Path, base: &str) -> bool {
    stem_of(path) == base
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_multi_word_name() {
        let n = parse_entry_name("020-my-best-post");
        assert_eq!(n.order, Some(20));
        assert_eq!(n.name, "my-best-post");
        assert_eq!(n.title, "my best post");
    }

    #[test]
    fn unnumbered_name_keeps_stem() {
        let n = parse_entry_name("post1");
        assert_eq!(n.order, None);
        assert_eq!(n.name, "post1");
        assert_eq!(n.title, "post1");
    }

    #[test]
    fn unnumbered_dashes_become_spaces() {
        let n = parse_entry_name("wip-notes");
        assert_eq!(n.order, None);
        assert_eq!(n.title, "wip notes");
    }

    #[test]
    fn number_only_keeps_digits_as_title() {
        let n = parse_entry_name("007");
        assert_eq!(n.order, Some(7));
        assert_eq!(n.title, "007");

        let n = parse_entry_name("007-");
        assert_eq!(n.order, Some(7));
        assert_eq!(n.name, "");
        assert_eq!(n.title, "007");
    }

    #[test]
    fn non_numeric_prefix_is_not_an_order() {
        let n = parse_entry_name("v2-release");
        assert_eq!(n.order, None);
        assert_eq!(n.title, "v2 release");
    }

    #[test]
    fn split_name_handles_dotfiles_and_multiple_dots() {
        assert_eq!(split_name("index.md"), ("index", Some("md")));
        assert_eq!(split_name("archive.tar.gz"), ("archive.tar", Some("gz")));
        assert_eq!(split_name(".htaccess"), (".htaccess", None));
        assert_eq!(split_name("README"), ("README", None));
    }

    #[test]
    fn extension_is_lowercased() {
        assert_eq!(
            extension_of(Path::new("/site/Photo.JPG")),
            Some("jpg".to_string())
        );
        assert_eq!(extension_of(Path::new("/site/LICENSE")), None);
    }

    #[test]
    fn base_name_matches_stem_exactly() {
        assert!(has_base_name(Path::new("/site/blog/index.md"), "index"));
        assert!(has_base_name(Path::new("/site/blog/index.html"), "index"));
        assert!(!has_base_name(Path::new("/site/blog/index2.md"), "index"));
        assert!(!has_base_name(Path::new("/site/blog/Index.md"), "index"));
    }
}
