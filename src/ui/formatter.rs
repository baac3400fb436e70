//! Formatting functions for terminal output.
//!
//! `format_*` functions are pure and return the text; `display_*` functions
//! print it.

use console::style;

use crate::boundary::BoundaryWarning;
use crate::context::ReleaseContext;
use crate::domain::BranchRule;
use crate::steps::Step;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Display a boundary warning to the user.
pub fn display_boundary_warning(warning: &BoundaryWarning) {
    eprintln!("{} {}", style("⚠").yellow(), warning);
}

/// Print what a step would have done in a dry run.
pub fn display_dry_run(step: &str, action: &str) {
    println!("{} [{}] {}", style("(dry run)").dim(), step, action);
}

/// Print the header for step `index` (1-based) of `total`.
pub fn display_step(index: usize, total: usize, name: &str) {
    println!(
        "{} {}",
        style(format!("[{}/{}]", index, total)).dim(),
        style(name).bold()
    );
}

pub fn format_branch_rule(rule: &BranchRule) -> String {
    let mut line = rule.name.clone();
    if let Some(channel) = &rule.channel {
        line.push_str(&format!(" (channel: {})", channel));
    }
    if rule.prerelease {
        line.push_str(" [prerelease]");
    }
    line
}

/// Display configured branches and the resolved pipeline.
pub fn display_configuration(rules: &[BranchRule], steps: &[Step]) {
    println!("{}", style("Configured branches:").bold());
    for rule in rules {
        println!("  - {}", format_branch_rule(rule));
    }

    println!("{}", style("Pipeline:").bold());
    for (i, step) in steps.iter().enumerate() {
        println!("  {}. {}", i + 1, step.name());
    }
}

/// One-line description of the release a context describes.
///
/// Shows either:
/// - If updating: "v1.2.0 -> v1.3.0 (minor)"
/// - If initial: "v1.0.0 (initial release)"
pub fn format_release_summary(ctx: &ReleaseContext) -> String {
    let next = ctx.git_tag.as_deref().unwrap_or("?");
    let mut summary = match (&ctx.last_release, ctx.release_type) {
        (Some(last), Some(kind)) => format!("{} -> {} ({})", last.git_tag, next, kind),
        (None, _) => format!("{} (initial release)", next),
        (Some(last), None) => format!("{} -> {}", last.git_tag, next),
    };
    if let Some(channel) = &ctx.channel {
        summary.push_str(&format!(" on channel '{}'", channel));
    }
    summary
}

/// Display the commits being analyzed.
///
/// Shows the branch name and up to 10 commit headers from the provided list.
/// If more than 10 commits exist, displays count of remaining commits.
pub fn display_commit_analysis(ctx: &ReleaseContext) {
    println!(
        "\n{}",
        style(format!("Analyzing commits on branch '{}'", ctx.branch)).bold()
    );
    println!(
        "{}",
        style(format!("{} commits since last release:", ctx.commits.len())).underlined()
    );

    for (i, commit) in ctx.commits.iter().take(10).enumerate() {
        let header = commit.message.lines().next().unwrap_or_default();
        let short_msg: String = header.chars().take(60).collect();
        println!("  {}. {} {}", i + 1, style(commit.short_hash()).dim(), short_msg);
    }

    if ctx.commits.len() > 10 {
        println!("  ... and {} more commits", ctx.commits.len() - 10);
    }
}
