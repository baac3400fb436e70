use crate::error::{ReleaseError, Result};
use crate::git::{CommitInfo, Repository};
use git2::Oid;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Side effect recorded by [MockRepository]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockEvent {
    Fetch { remote: String, branch: String },
    Commit { message: String, paths: Vec<PathBuf> },
    CreateTag { name: String, oid: Oid },
    PushTags { remote: String, tags: Vec<String> },
    PushBranch { remote: String, branch: String },
}

/// Mock repository with a single linear history.
///
/// Ancestry follows insertion order. Every mutating call is recorded as a
/// [MockEvent] so tests can assert exactly which side effects happened.
pub struct MockRepository {
    state: RefCell<MockState>,
}

struct MockState {
    current_branch: String,
    history: Vec<(Oid, CommitInfo)>,
    branch_heads: HashMap<String, Oid>,
    tags: BTreeMap<String, Oid>,
    events: Vec<MockEvent>,
    next_id: u8,
    fail_push: bool,
}

impl MockState {
    fn next_oid(&mut self) -> Oid {
        self.next_id = self.next_id.wrapping_add(1);
        Oid::from_bytes(&[self.next_id; 20]).unwrap_or_else(|_| Oid::zero())
    }

    fn position(&self, oid: Oid) -> Result<usize> {
        self.history
            .iter()
            .position(|(id, _)| *id == oid)
            .ok_or_else(|| ReleaseError::branch(format!("Unknown commit {}", oid)))
    }

    fn append(&mut self, message: &str) -> Oid {
        let oid = self.next_oid();
        self.history.push((
            oid,
            CommitInfo {
                hash: oid.to_string(),
                message: message.to_string(),
                author: "Mock Author".to_string(),
            },
        ));
        let branch = self.current_branch.clone();
        self.branch_heads.insert(branch, oid);
        oid
    }
}

impl MockRepository {
    /// Create an empty mock repository checked out on `branch`
    pub fn new(branch: impl Into<String>) -> Self {
        MockRepository {
            state: RefCell::new(MockState {
                current_branch: branch.into(),
                history: Vec::new(),
                branch_heads: HashMap::new(),
                tags: BTreeMap::new(),
                events: Vec::new(),
                next_id: 0,
                fail_push: false,
            }),
        }
    }

    /// Append a commit on the current branch and return its OID
    pub fn add_commit(&mut self, message: &str) -> Oid {
        self.state.get_mut().append(message)
    }

    /// Add a tag pointing to an OID
    pub fn add_tag(&mut self, name: impl Into<String>, oid: Oid) {
        self.state.get_mut().tags.insert(name.into(), oid);
    }

    /// Point a branch at an existing commit
    pub fn set_branch_head(&mut self, branch: impl Into<String>, oid: Oid) {
        self.state.get_mut().branch_heads.insert(branch.into(), oid);
    }

    /// Switch the branch new commits are appended to
    pub fn checkout(&mut self, branch: impl Into<String>) {
        self.state.get_mut().current_branch = branch.into();
    }

    /// Make every subsequent push fail
    pub fn fail_pushes(&mut self) {
        self.state.get_mut().fail_push = true;
    }

    /// Side effects recorded so far, in order
    pub fn events(&self) -> Vec<MockEvent> {
        self.state.borrow().events.clone()
    }

    /// Tags currently in the repository, by name
    pub fn tags(&self) -> BTreeMap<String, Oid> {
        self.state.borrow().tags.clone()
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new("main")
    }
}

impl Repository for MockRepository {
    fn current_branch(&self) -> Result<String> {
        Ok(self.state.borrow().current_branch.clone())
    }

    fn get_branch_head_oid(&self, branch_name: &str) -> Result<Oid> {
        self.state
            .borrow()
            .branch_heads
            .get(branch_name)
            .copied()
            .ok_or_else(|| ReleaseError::branch(format!("Branch not found: {}", branch_name)))
    }

    fn get_commits_between(&self, from_oid: Option<Oid>, to_oid: Oid) -> Result<Vec<CommitInfo>> {
        let state = self.state.borrow();
        let end = state.position(to_oid)?;
        let start = match from_oid {
            Some(from) => state.position(from)? + 1,
            None => 0,
        };

        if start > end {
            return Ok(Vec::new());
        }
        Ok(state.history[start..=end]
            .iter()
            .map(|(_, info)| info.clone())
            .collect())
    }

    fn find_tag_oid(&self, tag_name: &str) -> Result<Option<Oid>> {
        Ok(self.state.borrow().tags.get(tag_name).copied())
    }

    fn list_tags(&self) -> Result<Vec<String>> {
        Ok(self.state.borrow().tags.keys().cloned().collect())
    }

    fn is_ancestor(&self, ancestor: Oid, descendant: Oid) -> Result<bool> {
        let state = self.state.borrow();
        Ok(state.position(ancestor)? <= state.position(descendant)?)
    }

    fn create_tag(&self, name: &str, oid: Oid) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if state.tags.contains_key(name) {
            return Err(ReleaseError::tag(format!("Tag '{}' already exists", name)));
        }
        state.tags.insert(name.to_string(), oid);
        state.events.push(MockEvent::CreateTag {
            name: name.to_string(),
            oid,
        });
        Ok(())
    }

    fn commit_paths(&self, branch: &str, paths: &[&Path], message: &str) -> Result<Option<Oid>> {
        let mut state = self.state.borrow_mut();
        if state.current_branch != branch {
            return Err(ReleaseError::branch(format!(
                "Cannot commit to '{}' while '{}' is checked out",
                branch, state.current_branch
            )));
        }
        if paths.is_empty() {
            return Ok(None);
        }

        let oid = state.append(message);
        state.events.push(MockEvent::Commit {
            message: message.to_string(),
            paths: paths.iter().map(|p| p.to_path_buf()).collect(),
        });
        Ok(Some(oid))
    }

    fn push_tags(&self, remote: &str, tag_names: &[&str]) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if state.fail_push {
            return Err(ReleaseError::remote("Push failed: remote rejected"));
        }
        state.events.push(MockEvent::PushTags {
            remote: remote.to_string(),
            tags: tag_names.iter().map(|t| t.to_string()).collect(),
        });
        Ok(())
    }

    fn push_branch(&self, remote: &str, branch: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if state.fail_push {
            return Err(ReleaseError::remote("Push failed: remote rejected"));
        }
        state.events.push(MockEvent::PushBranch {
            remote: remote.to_string(),
            branch: branch.to_string(),
        });
        Ok(())
    }

    fn fetch_from_remote(&self, remote: &str, branch: &str) -> Result<()> {
        self.state.borrow_mut().events.push(MockEvent::Fetch {
            remote: remote.to_string(),
            branch: branch.to_string(),
        });
        Ok(())
    }
}
