//! Git operations abstraction layer
//!
//! The pipeline and its steps talk to version control only through the
//! [Repository] trait, so the whole release flow can run against either a
//! real repository or an in-memory one.
//!
//! - [repository::Git2Repository]: a real implementation using the `git2` crate
//! - [mock::MockRepository]: a linear-history mock that records side effects
//!
//! ```rust
//! # use git_release::git::Repository;
//! # fn example(repo: &dyn Repository) -> git_release::Result<()> {
//! let head = repo.get_branch_head_oid("main")?;
//! let commits = repo.get_commits_between(None, head)?;
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod repository;

pub use mock::MockRepository;
pub use repository::Git2Repository;

use crate::error::Result;
use git2::Oid;
use std::path::Path;

/// Commit information for analysis
#[derive(Debug, Clone, PartialEq)]
pub struct CommitInfo {
    /// The full commit hash
    pub hash: String,
    /// The commit message
    pub message: String,
    /// The commit author
    pub author: String,
}

impl CommitInfo {
    /// Abbreviated hash used in notes and log output
    pub fn short_hash(&self) -> &str {
        if self.hash.len() > 7 {
            &self.hash[..7]
        } else {
            &self.hash
        }
    }
}

/// Common git operation trait for abstraction
///
/// All methods return [crate::error::Result<T>]. Implementations map
/// underlying errors (like `git2::Error`) to the matching
/// [crate::error::ReleaseError] variants.
pub trait Repository {
    /// Name of the branch HEAD points at
    ///
    /// # Returns
    /// * `Err` - If HEAD is detached or unborn
    fn current_branch(&self) -> Result<String>;

    /// Get the OID of a branch's HEAD
    fn get_branch_head_oid(&self, branch_name: &str) -> Result<Oid>;

    /// Get commits between two OIDs
    ///
    /// Returns commits reachable from `to_oid` (inclusive) but not from
    /// `from_oid`, oldest first. With `from_oid` of `None` the whole history
    /// of `to_oid` is returned.
    fn get_commits_between(&self, from_oid: Option<Oid>, to_oid: Oid) -> Result<Vec<CommitInfo>>;

    /// Find a tag by name and get the OID of the commit it points at
    ///
    /// # Returns
    /// * `Ok(None)` - If the tag doesn't exist
    fn find_tag_oid(&self, tag_name: &str) -> Result<Option<Oid>>;

    /// Get all tag names in the repository
    fn list_tags(&self) -> Result<Vec<String>>;

    /// Whether `ancestor` is `descendant` or one of its ancestors
    fn is_ancestor(&self, ancestor: Oid, descendant: Oid) -> Result<bool>;

    /// Create a lightweight tag at given OID
    ///
    /// # Returns
    /// * `Err` - If the tag already exists or the OID doesn't exist
    fn create_tag(&self, name: &str, oid: Oid) -> Result<()>;

    /// Stage `paths` and commit them on `branch`, which must be checked out
    ///
    /// # Returns
    /// * `Ok(Some(oid))` - The new commit
    /// * `Ok(None)` - Nothing changed, so no commit was made
    /// * `Err` - If `branch` is not the checked-out branch
    fn commit_paths(&self, branch: &str, paths: &[&Path], message: &str) -> Result<Option<Oid>>;

    /// Push tags to remote
    fn push_tags(&self, remote: &str, tag_names: &[&str]) -> Result<()>;

    /// Push a local branch to the same-named branch on remote
    fn push_branch(&self, remote: &str, branch: &str) -> Result<()>;

    /// Fetch branches and tags from remote
    fn fetch_from_remote(&self, remote: &str, branch: &str) -> Result<()>;
}
