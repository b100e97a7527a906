//! The deployment boundary and the full build pipeline.
//!
//! A [`DeployTarget`] publishes a finished target tree somewhere (object
//! storage, a web host...). No concrete target lives in this crate; callers
//! plug theirs into [`build`], which runs:
//!
//! ```text
//! prepare → plan → mummify → deploy
//! ```
//!
//! `prepare` runs first so a misconfigured target fails before any work is
//! done; `deploy` runs once, after the whole tree is written.

use crate::artifact::Artifact;
use crate::config::ConfigError;
use crate::context::Context;
use crate::mummify::{self, MummifyError, MummifyEvent};
use crate::planner::{self, PlanError};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum DeployError {
    #[error("Deploy target not ready: {0}")]
    NotReady(String),
    #[error("Deploy failed: {0}")]
    Failed(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Plan(#[from] PlanError),
    #[error(transparent)]
    Mummify(#[from] MummifyError),
    #[error(transparent)]
    Deploy(#[from] DeployError),
}

/// Somewhere a mummified site can be published.
pub trait DeployTarget {
    /// Check the target is usable before anything is built.
    fn prepare(&mut self, context: &Context) -> Result<(), DeployError>;

    /// Publish the mummified tree rooted at `root`. Returns the URI the site
    /// is reachable at, if the target knows one.
    fn deploy(&mut self, context: &Context, root: &Artifact) -> Result<Option<String>, DeployError>;
}

/// Result of a complete build.
#[derive(Debug)]
pub struct BuildOutcome {
    pub root: Artifact,
    pub uri: Option<String>,
}

/// Plan and mummify the context's source tree, then deploy it if a target
/// is given.
pub fn build(
    context: &Context,
    mut target: Option<&mut dyn DeployTarget>,
    events: Option<Sender<MummifyEvent>>,
) -> Result<BuildOutcome, BuildError> {
    if let Some(target) = target.as_deref_mut() {
        target.prepare(context)?;
    }

    let root = planner::plan(context)?;
    mummify::mummify(context, &root, events)?;

    let uri = match target {
        Some(target) => target.deploy(context, &root)?,
        None => None,
    };
    if let Some(uri) = &uri {
        info!(uri = %uri, "deployed");
    }
    Ok(BuildOutcome { root, uri })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{context_for, write_tree};
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingTarget {
        calls: Vec<String>,
        refuse: bool,
    }

    impl DeployTarget for RecordingTarget {
        fn prepare(&mut self, context: &Context) -> Result<(), DeployError> {
            self.calls.push(format!("prepare exists={}", context.target_root().exists()));
            if self.refuse {
                return Err(DeployError::NotReady("no credentials".into()));
            }
            Ok(())
        }

        fn deploy(&mut self, context: &Context, root: &Artifact) -> Result<Option<String>, DeployError> {
            let index = context.target_root().join("index.html");
            self.calls.push(format!("deploy index={}", index.is_file()));
            assert_eq!(root.target_path(), context.target_root());
            Ok(Some("https://example.com/".into()))
        }
    }

    #[test]
    fn build_without_target_writes_tree() {
        let tmp = TempDir::new().unwrap();
        let ctx = context_for(&tmp);
        write_tree(ctx.source_root(), &[("about.md", "# About")]);
        let outcome = build(&ctx, None, None).unwrap();
        assert!(outcome.uri.is_none());
        assert!(ctx.target_root().join("about.html").is_file());
        assert!(ctx.target_root().join("index.html").is_file());
    }

    #[test]
    fn prepare_runs_before_and_deploy_after_mummify() {
        let tmp = TempDir::new().unwrap();
        let ctx = context_for(&tmp);
        write_tree(ctx.source_root(), &[("about.md", "# About")]);
        let mut target = RecordingTarget::default();

        let outcome = build(&ctx, Some(&mut target), None).unwrap();
        assert_eq!(outcome.uri.as_deref(), Some("https://example.com/"));
        assert_eq!(target.calls, vec!["prepare exists=false", "deploy index=true"]);
    }

    #[test]
    fn failed_prepare_builds_nothing() {
        let tmp = TempDir::new().unwrap();
        let ctx = context_for(&tmp);
        write_tree(ctx.source_root(), &[("about.md", "# About")]);
        let mut target = RecordingTarget {
            refuse: true,
            ..Default::default()
        };

        let err = build(&ctx, Some(&mut target), None).unwrap_err();
        assert!(matches!(err, BuildError::Deploy(DeployError::NotReady(_))));
        assert!(!ctx.target_root().exists());
    }

    #[test]
    fn plan_errors_pass_through() {
        let tmp = TempDir::new().unwrap();
        let ctx = context_for(&tmp);
        let err = build(&ctx, None, None).unwrap_err();
        assert!(matches!(err, BuildError::Plan(PlanError::SourceNotFound(_))));
        assert!(err.to_string().contains("Source not found"));
    }
}
