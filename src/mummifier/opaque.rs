//! Opaque mummifier: the fallback for files nothing else claims.
//!
//! The bytes are copied unchanged. The media type comes from the extension
//! table, or from sniffing the first bytes when the extension says nothing.

use super::Mummifier;
use crate::artifact::{Artifact, ArtifactSource, MummifierKind};
use crate::context::Context;
use crate::description::{self, PropertyValue};
use crate::mummify::{MummifyAction, MummifyError, MummifyScope};
use crate::naming;
use crate::planner::{self, PlanError};
use crate::types::MediaType;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;

const SNIFF_LEN: u64 = 512;

pub struct OpaqueMummifier;

fn sniff(path: &Path) -> io::Result<Option<MediaType>> {
    let mut head = Vec::with_capacity(SNIFF_LEN as usize);
    File::open(path)?.take(SNIFF_LEN).read_to_end(&mut head)?;
    Ok(MediaType::sniff(&head))
}

impl Mummifier for OpaqueMummifier {
    fn kind(&self) -> MummifierKind {
        MummifierKind::Opaque
    }

    fn supported_extensions(&self) -> &[&'static str] {
        &[]
    }

    fn media_type_for(&self, path: &Path) -> Option<MediaType> {
        naming::extension_of(path)
            .and_then(|ext| MediaType::for_extension(&ext))
            .or_else(|| sniff(path).ok().flatten())
    }

    fn plan(&self, context: &Context, source_path: &Path) -> Result<Artifact, PlanError> {
        fs::metadata(source_path).map_err(PlanError::io(source_path))?;

        let mut description = planner::sidecar_description(context, source_path)?;
        description.set_if_absent(
            description::TITLE,
            PropertyValue::Text(naming::file_name(source_path)),
        );
        if let Some(media_type) = self.media_type_for(source_path) {
            description.set_if_absent(description::CONTENT_TYPE, PropertyValue::MediaType(media_type));
        }

        let target = planner::target_path(context, source_path, None)?;
        Ok(Artifact::file(
            ArtifactSource::Real(source_path.to_path_buf()),
            target,
            MummifierKind::Opaque,
            description,
        ))
    }

    fn mummify(
        &self,
        scope: &MummifyScope<'_>,
        _context_artifact: &Artifact,
        artifact: &Artifact,
    ) -> Result<(), MummifyError> {
        let target = artifact.target_path();
        if artifact.is_phantom() {
            return Err(MummifyError::PhantomUnsupported {
                kind: MummifierKind::Opaque,
                target: target.to_path_buf(),
            });
        }
        let source = artifact.source_path();
        fs::copy(source, target)
            .map_err(MummifyError::read_failed(MummifierKind::Opaque, source, target))?;
        scope.emit(MummifierKind::Opaque, target, MummifyAction::Copied);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mummify;
    use crate::test_helpers::{context_for, find_child, write_file, write_tree};
    use tempfile::TempDir;

    #[test]
    fn media_type_by_extension_then_sniffing() {
        let tmp = TempDir::new().unwrap();
        let css = tmp.path().join("style.CSS");
        let blob = tmp.path().join("LOGO");
        let unknown = tmp.path().join("notes");
        write_file(&css, "body{}");
        write_file(&blob, b"\x89PNG\r\n\x1a\nrest");
        write_file(&unknown, "plain words");

        assert_eq!(
            OpaqueMummifier.media_type_for(&css).map(|m| m.to_string()),
            Some("text/css".to_string())
        );
        assert_eq!(
            OpaqueMummifier.media_type_for(&blob).map(|m| m.to_string()),
            Some("image/png".to_string())
        );
        assert_eq!(OpaqueMummifier.media_type_for(&unknown), None);
        assert_eq!(OpaqueMummifier.media_type_for(&tmp.path().join("missing")), None);
    }

    #[test]
    fn plan_titles_by_file_name() {
        let tmp = TempDir::new().unwrap();
        let ctx = context_for(&tmp);
        write_tree(ctx.source_root(), &[("010-data.json", "{}")]);
        let artifact = OpaqueMummifier
            .plan(&ctx, &ctx.source_root().join("010-data.json"))
            .unwrap();
        assert_eq!(artifact.description().title(), Some("010-data.json"));
        assert_eq!(
            artifact.target_path(),
            ctx.target_root().join("010-data.json")
        );
        assert!(!artifact.is_navigable());
    }

    #[test]
    fn plan_missing_file_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let ctx = context_for(&tmp);
        let err = OpaqueMummifier
            .plan(&ctx, &ctx.source_root().join("gone.bin"))
            .unwrap_err();
        assert!(matches!(err, PlanError::Io { .. }));
    }

    #[test]
    fn bytes_round_trip() {
        let tmp = TempDir::new().unwrap();
        let ctx = context_for(&tmp);
        let bytes: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        write_tree(ctx.source_root(), &[("index.md", "# Home")]);
        write_file(&ctx.source_root().join("assets/blob.bin"), &bytes);

        let root = planner::plan(&ctx).unwrap();
        let assets = find_child(&root, "assets");
        assert_eq!(find_child(assets, "blob.bin").mummifier(), MummifierKind::Opaque);
        mummify::mummify(&ctx, &root, None).unwrap();
        assert_eq!(
            fs::read(ctx.target_root().join("assets/blob.bin")).unwrap(),
            bytes
        );
    }

    #[test]
    fn vanished_source_is_reported() {
        let tmp = TempDir::new().unwrap();
        let ctx = context_for(&tmp);
        write_tree(ctx.source_root(), &[("index.md", "# Home"), ("a.css", "x")]);
        let root = planner::plan(&ctx).unwrap();
        fs::remove_file(ctx.source_root().join("a.css")).unwrap();

        let err = mummify::mummify(&ctx, &root, None).unwrap_err();
        assert!(matches!(
            err,
            MummifyError::SourceVanished { mummifier: MummifierKind::Opaque, .. }
        ));
    }
}
