use crate::context::ReleaseContext;
use crate::error::{ReleaseError, Result};
use crate::steps::{require_version, ExecuteStep, StepEnv};
use git2::Oid;
use serde::Deserialize;
use tracing::info;

/// Tags the release and pushes it
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Publish {
    /// Falls back to `behavior.remote`
    pub remote: Option<String>,
    /// When false the tag is only created locally
    pub push: bool,
}

impl Default for Publish {
    fn default() -> Self {
        Publish {
            remote: None,
            push: true,
        }
    }
}

impl ExecuteStep for Publish {
    const NAME: &'static str = "publish";

    fn execute(&self, mut ctx: ReleaseContext, env: &StepEnv<'_>) -> Result<ReleaseContext> {
        let (_, tag) = require_version(&ctx, Self::NAME)?;
        let tag = tag.to_string();
        let remote = self.remote.as_deref().unwrap_or(env.remote);

        if env.dry_run {
            let action = if self.push {
                format!("would create tag {} and push it to '{}'", tag, remote)
            } else {
                format!("would create tag {}", tag)
            };
            crate::ui::display_dry_run(Self::NAME, &action);
            return Ok(ctx);
        }

        let target = match &ctx.release_commit {
            Some(hash) => Oid::from_str(hash).map_err(|e| {
                ReleaseError::tag(format!("Invalid release commit '{}': {}", hash, e))
            })?,
            None => env.repo.get_branch_head_oid(&ctx.branch)?,
        };

        env.repo.create_tag(&tag, target)?;
        crate::ui::display_success(&format!("Created tag: {}", tag));

        if self.push {
            if ctx.release_commit.is_some() {
                env.repo.push_branch(remote, &ctx.branch)?;
            }
            env.repo.push_tags(remote, &[tag.as_str()])?;
            crate::ui::display_success(&format!("Pushed tag {} to {}", tag, remote));
        } else {
            info!(%tag, "push disabled, tag kept local");
        }

        ctx.published = true;
        Ok(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::mock::MockEvent;
    use crate::git::{MockRepository, Repository};
    use crate::steps::test_support::{analyzed_context, EnvFixture};

    #[test]
    fn test_tags_branch_head_and_pushes() {
        let mut repo = MockRepository::default();
        let head = repo.add_commit("feat: something");
        let fixture = EnvFixture::new();
        let env = fixture.env(&repo, false);

        let ctx = Publish::default()
            .execute(analyzed_context(""), &env)
            .unwrap();

        assert!(ctx.published);
        assert_eq!(
            repo.events(),
            vec![
                MockEvent::CreateTag {
                    name: "v1.1.0".to_string(),
                    oid: head
                },
                MockEvent::PushTags {
                    remote: "origin".to_string(),
                    tags: vec!["v1.1.0".to_string()]
                },
            ]
        );
    }

    #[test]
    fn test_pushes_release_commit_before_tag() {
        let mut repo = MockRepository::default();
        repo.add_commit("feat: something");
        let release = repo.add_commit("chore(release): v1.1.0");
        let fixture = EnvFixture::new();
        let env = fixture.env(&repo, false);

        let mut ctx = analyzed_context("");
        ctx.release_commit = Some(release.to_string());
        let step = Publish {
            remote: Some("upstream".to_string()),
            push: true,
        };
        step.execute(ctx, &env).unwrap();

        let events = repo.events();
        assert_eq!(
            events[1],
            MockEvent::PushBranch {
                remote: "upstream".to_string(),
                branch: "main".to_string()
            }
        );
        assert!(matches!(events[2], MockEvent::PushTags { .. }));
        assert_eq!(repo.find_tag_oid("v1.1.0").unwrap(), Some(release));
    }

    #[test]
    fn test_local_only() {
        let mut repo = MockRepository::default();
        repo.add_commit("feat: something");
        let fixture = EnvFixture::new();
        let env = fixture.env(&repo, false);

        let step = Publish {
            remote: None,
            push: false,
        };
        let ctx = step.execute(analyzed_context(""), &env).unwrap();
        assert!(ctx.published);
        assert_eq!(repo.events().len(), 1);
    }

    #[test]
    fn test_push_failure_is_an_error() {
        let mut repo = MockRepository::default();
        repo.add_commit("feat: something");
        repo.fail_pushes();
        let fixture = EnvFixture::new();
        let env = fixture.env(&repo, false);

        let err = Publish::default()
            .execute(analyzed_context(""), &env)
            .unwrap_err();
        assert!(err.to_string().contains("remote rejected"));
    }

    #[test]
    fn test_dry_run_has_no_side_effects() {
        let mut repo = MockRepository::default();
        repo.add_commit("feat: something");
        let fixture = EnvFixture::new();
        let env = fixture.env(&repo, true);

        let ctx = Publish::default()
            .execute(analyzed_context(""), &env)
            .unwrap();
        assert!(!ctx.published);
        assert!(repo.events().is_empty());
        assert!(repo.tags().is_empty());
    }
}
