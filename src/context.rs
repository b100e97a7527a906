//! The read-only build context.
//!
//! A [`Context`] is created once per run and passed by reference through
//! planning and mummification. It answers the questions every mummifier
//! asks: where the roots are, what the configuration says, which entries are
//! ignored or veiled, which base names make a directory's content, and which
//! mummifier handles a path.

use crate::artifact::MummifierKind;
use crate::config::{self, CONFIG_FILE, CompiledFilters, ConfigError, SiteConfig};
use crate::description::{self, PropertyTypeTable};
use crate::mummifier::{Mummifier, Registry};
use crate::naming;
use std::path::{Path, PathBuf};

pub struct Context {
    source_root: PathBuf,
    target_root: PathBuf,
    config: SiteConfig,
    raw_config: toml::Value,
    filters: CompiledFilters,
    properties: PropertyTypeTable,
    registry: Registry,
}

impl Context {
    /// Build a context with the stock mummifier registry.
    pub fn new(
        source_root: impl AsRef<Path>,
        target_root: impl AsRef<Path>,
        config: SiteConfig,
    ) -> Result<Self, ConfigError> {
        let registry = Registry::new(&config);
        Self::with_registry(source_root, target_root, config, registry)
    }

    /// Build a context around an explicit registry (e.g. one with a
    /// different image backend).
    pub fn with_registry(
        source_root: impl AsRef<Path>,
        target_root: impl AsRef<Path>,
        config: SiteConfig,
        registry: Registry,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let filters = config.filters.compile()?;
        let raw_config = toml::Value::try_from(&config)?;
        Ok(Self {
            source_root: std::path::absolute(source_root)?,
            target_root: std::path::absolute(target_root)?,
            config,
            raw_config,
            filters,
            properties: PropertyTypeTable::default(),
            registry,
        })
    }

    /// Load `config.toml` from the source root and build a context.
    pub fn load(
        source_root: impl AsRef<Path>,
        target_root: impl AsRef<Path>,
    ) -> Result<Self, ConfigError> {
        let config = config::load_config(source_root.as_ref())?;
        Self::new(source_root, target_root, config)
    }

    /// Replace the table that types sidecar properties.
    pub fn with_property_table(mut self, properties: PropertyTypeTable) -> Self {
        self.properties = properties;
        self
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    pub fn target_root(&self) -> &Path {
        &self.target_root
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn properties(&self) -> &PropertyTypeTable {
        &self.properties
    }

    /// Look up a dotted configuration key such as `"images.quality"`.
    pub fn lookup(&self, key: &str) -> Option<&toml::Value> {
        key.split('.')
            .try_fold(&self.raw_config, |value, segment| value.get(segment))
    }

    /// Entries never planned: filter matches, sidecars, the site
    /// configuration file itself, and the target tree when it lives inside
    /// the source tree.
    pub fn is_ignored(&self, path: &Path) -> bool {
        let name = naming::file_name(path);
        self.filters.ignore.iter().any(|re| re.is_match(&name))
            || description::is_sidecar(path)
            || (name == CONFIG_FILE && path.parent() == Some(self.source_root.as_path()))
            || path.starts_with(&self.target_root)
    }

    /// Entries planned but hidden from navigation.
    pub fn is_veiled(&self, path: &Path) -> bool {
        let name = naming::file_name(path);
        self.filters.veil.iter().any(|re| re.is_match(&name))
    }

    pub fn content_base_names(&self) -> &[String] {
        &self.config.content.base_names
    }

    pub fn mummifier_for_path(&self, path: &Path) -> Option<&dyn Mummifier> {
        self.registry.mummifier_for(path)
    }

    pub fn mummifier(&self, kind: MummifierKind) -> Option<&dyn Mummifier> {
        self.registry.get(kind)
    }

    /// Mirror a source path into the target tree, optionally replacing the
    /// file extension. `None` when the path is outside the source root.
    pub fn target_path_for(&self, source: &Path, extension: Option<&str>) -> Option<PathBuf> {
        let relative = source.strip_prefix(&self.source_root).ok()?;
        let target = self.target_root.join(relative);
        Some(match extension {
            Some(ext) if !relative.as_os_str().is_empty() => {
                let stem = naming::stem_of(source);
                target.with_file_name(format!("{stem}.{ext}"))
            }
            _ => target,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::{PropertyType, PropertyValue};
    use crate::planner;
    use crate::test_helpers::{context_for, write_tree};
    use tempfile::TempDir;

    #[test]
    fn roots_are_absolute() {
        let ctx = Context::new("site", "dist", SiteConfig::default()).unwrap();
        assert!(ctx.source_root().is_absolute());
        assert!(ctx.target_root().is_absolute());
        assert!(ctx.source_root().ends_with("site"));
    }

    #[test]
    fn lookup_dotted_keys() {
        let tmp = TempDir::new().unwrap();
        let ctx = context_for(&tmp);
        assert_eq!(
            ctx.lookup("images.quality").and_then(|v| v.as_integer()),
            Some(85)
        );
        assert_eq!(
            ctx.lookup("content.phantom_extension").and_then(|v| v.as_str()),
            Some("md")
        );
        assert!(ctx.lookup("site.title").is_none());
        assert!(ctx.lookup("images.nope").is_none());
        assert!(ctx.lookup("site").is_some());
    }

    #[test]
    fn ignores_dotfiles_sidecars_and_root_config() {
        let tmp = TempDir::new().unwrap();
        let ctx = context_for(&tmp);
        let root = ctx.source_root().to_path_buf();
        assert!(ctx.is_ignored(&root.join(".git")));
        assert!(ctx.is_ignored(&root.join("post.md.meta.toml")));
        assert!(ctx.is_ignored(&root.join(CONFIG_FILE)));
        assert!(!ctx.is_ignored(&root.join("blog").join(CONFIG_FILE)));
        assert!(!ctx.is_ignored(&root.join("post.md")));
    }

    #[test]
    fn target_tree_inside_source_is_ignored() {
        let tmp = TempDir::new().unwrap();
        let ctx = Context::new(
            tmp.path().join("site"),
            tmp.path().join("site").join("out"),
            SiteConfig::default(),
        )
        .unwrap();
        let root = ctx.source_root().to_path_buf();
        assert!(ctx.is_ignored(&root.join("out")));
        assert!(ctx.is_ignored(&root.join("out").join("index.html")));
        assert!(!ctx.is_ignored(&root.join("outline.md")));
    }

    #[test]
    fn property_table_types_sidecar_values() {
        let tmp = TempDir::new().unwrap();
        write_tree(
            &tmp.path().join("site"),
            &[
                ("post.md", "# Post"),
                ("post.md.meta.toml", "published-on = \"2024-05-06\"\nrating = \"high\"\n"),
            ],
        );
        let post = tmp.path().join("site").join("post.md");

        let stock = context_for(&tmp);
        let d = planner::sidecar_description(&stock, &post).unwrap();
        assert!(matches!(d.get("published-on"), Some(PropertyValue::Date(_))));

        let untyped = context_for(&tmp).with_property_table(PropertyTypeTable::empty());
        let d = planner::sidecar_description(&untyped, &post).unwrap();
        assert_eq!(
            d.get("published-on"),
            Some(&PropertyValue::Text("2024-05-06".into()))
        );

        let strict = context_for(&tmp).with_property_table(
            PropertyTypeTable::default()
                .with_rule("^rating$", PropertyType::Integer)
                .unwrap(),
        );
        let err = planner::sidecar_description(&strict, &post).unwrap_err();
        assert!(err.to_string().contains("rating"), "{err}");
    }

    #[test]
    fn veil_matches_file_name_only() {
        let tmp = TempDir::new().unwrap();
        let ctx = context_for(&tmp);
        let root = ctx.source_root().to_path_buf();
        assert!(ctx.is_veiled(&root.join("_drafts")));
        assert!(!ctx.is_veiled(&root.join("_drafts").join("post.md")));
    }

    #[test]
    fn target_path_mirrors_source() {
        let tmp = TempDir::new().unwrap();
        let ctx = context_for(&tmp);
        let src = ctx.source_root().join("blog").join("post.md");
        assert_eq!(
            ctx.target_path_for(&src, None).unwrap(),
            ctx.target_root().join("blog").join("post.md")
        );
        assert_eq!(
            ctx.target_path_for(&src, Some("html")).unwrap(),
            ctx.target_root().join("blog").join("post.html")
        );
        assert_eq!(
            ctx.target_path_for(ctx.source_root(), Some("html")).unwrap(),
            ctx.target_root()
        );
        assert!(ctx.target_path_for(Path::new("/elsewhere/x.md"), None).is_none());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = SiteConfig::default();
        config.filters.ignore = vec!["[".into()];
        assert!(Context::new("site", "dist", config).is_err());
    }
}
