//! Follow-up task rules.
//!
//! Everything here is a pure function of the submitted payload and its status
//! classification, so it can be exercised without a store.

use crate::models::{FollowUp, Priority, ReportPayload, ReportStatus};

/// Blogs with fewer interlinks than this are flagged on warning reports.
pub const MIN_INTERLINKS: u32 = 3;

pub const IRRELEVANT_LINK_ISSUE: &str = "irrelevant_link";

/// Derives the follow-up tasks for a report, in a fixed order.
///
/// Only `critical` and `warning` reports produce follow-ups, and the two rule
/// sets never mix: a critical report is not checked against warning rules.
pub fn evaluate(payload: &ReportPayload, status: ReportStatus) -> Vec<FollowUp> {
    match status {
        ReportStatus::Critical => critical_rules(payload),
        ReportStatus::Warning => warning_rules(payload),
        ReportStatus::Healthy => Vec::new(),
    }
}

fn critical_rules(payload: &ReportPayload) -> Vec<FollowUp> {
    let mut tasks = Vec::new();

    let dead_links = payload.summary.dead_links;
    if dead_links > 0 {
        tasks.push(FollowUp {
            title: "Fix dead backlink URLs".into(),
            description: format!(
                "{} dead backlink URL(s) were found in the latest report. Replace or restore them.",
                dead_links
            ),
            priority: Priority::High,
        });
    }

    let broken_blogs = payload
        .indexed_blogs
        .iter()
        .filter(|blog| !blog.is_indexed || blog.has_dead_interlink())
        .count();
    if broken_blogs > 0 {
        tasks.push(FollowUp {
            title: "Fix critical blog interlinks".into(),
            description: format!(
                "{} blog(s) are not indexed or contain dead interlinks. Fix indexing and repair the broken interlinks.",
                broken_blogs
            ),
            priority: Priority::High,
        });
    }

    let dead_interlinks = payload.summary.dead_interlinks;
    if dead_interlinks > 0 {
        tasks.push(FollowUp {
            title: "Replace dead interlinks".into(),
            description: format!(
                "{} dead interlink(s) need to be replaced with working URLs.",
                dead_interlinks
            ),
            priority: Priority::High,
        });
    }

    tasks
}

fn warning_rules(payload: &ReportPayload) -> Vec<FollowUp> {
    let mut tasks = Vec::new();

    let thin_blogs = payload
        .indexed_blogs
        .iter()
        .filter(|blog| blog.interlink_count < MIN_INTERLINKS)
        .count();
    if thin_blogs > 0 {
        tasks.push(FollowUp {
            title: "Improve interlinking".into(),
            description: format!(
                "{} blog(s) have fewer than {} interlinks. Add more internal links between related posts.",
                thin_blogs, MIN_INTERLINKS
            ),
            priority: Priority::Medium,
        });
    }

    let irrelevant = payload
        .issues
        .iter()
        .filter(|issue| issue.kind == IRRELEVANT_LINK_ISSUE)
        .count();
    if irrelevant > 0 {
        tasks.push(FollowUp {
            title: "Improve link relevance".into(),
            description: format!(
                "{} link(s) were flagged as irrelevant. Replace them with placements on topically related pages.",
                irrelevant
            ),
            priority: Priority::Medium,
        });
    }

    tasks
}
