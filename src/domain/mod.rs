//! Domain logic - pure release rules independent of git operations

pub mod branch;
pub mod commit;
pub mod prerelease;
pub mod tag;
pub mod version;

pub use branch::BranchRule;
pub use commit::ParsedCommit;
pub use prerelease::PreRelease;
pub use tag::TagFormat;
pub use version::VersionBump;
