//! Text renderings of the dashboard pages.
//!
//! Every function here is a pure projection of already-fetched state.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use console::style;

use super::icons::{CROSS, ISSUE, LINK, REPO, ROBOT, SPARKLE, USER};
use crate::filter::FilterSnapshot;
use crate::fixes::{FixEntry, FixPhase};
use crate::models::{Issue, Repository};
use crate::session::Session;

/// Format a server timestamp as `Mar 5, 2024`; unparseable input is returned as-is.
pub fn format_date(raw: &str) -> String {
    let date = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|dt| dt.date()))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f").map(|dt| dt.date()))
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"));

    match date {
        Ok(date) => date.format("%b %-d, %Y").to_string(),
        Err(_) => raw.to_string(),
    }
}

pub fn render_session(session: &Session) -> String {
    if session.is_authenticated() {
        format!(
            "{}Signed in as {} (user {})",
            USER,
            style(session.username()).bold(),
            session.user_id()
        )
    } else {
        "Not signed in. Run `automerge login` to connect your GitHub account.".to_string()
    }
}

pub fn render_welcome(login_url: &str) -> String {
    format!(
        "{}Welcome to AutoMerge AI\n\nLogin with GitHub: {}\n",
        SPARKLE,
        style(login_url).underlined()
    )
}

pub fn render_error(message: &str) -> String {
    format!("{}{}", CROSS, style(message).red())
}

pub fn render_repos(repos: &[Repository]) -> String {
    let mut out = format!("{}\n\n", style("Your Repositories").bold());
    if repos.is_empty() {
        out.push_str("No repositories found.\n");
        return out;
    }
    for repo in repos {
        out.push_str(&format!("  {}{}\n", REPO, style(&repo.full_name).cyan()));
        if let Some(desc) = repo.description.as_deref().filter(|d| !d.is_empty()) {
            out.push_str(&format!("      {}\n", style(desc).dim()));
        }
    }
    out
}

fn render_labels(labels: &[String]) -> Option<String> {
    if labels.is_empty() {
        return None;
    }
    Some(
        labels
            .iter()
            .map(|l| format!("[{}]", l))
            .collect::<Vec<_>>()
            .join(" "),
    )
}

fn render_state(issue: &Issue) -> String {
    if issue.state.is_open() {
        style(issue.state.as_str()).green().to_string()
    } else {
        style(issue.state.as_str()).magenta().to_string()
    }
}

pub fn render_issue_list(snapshot: &FilterSnapshot) -> String {
    let heading = match snapshot.filter.repo_scope.as_deref() {
        Some(repo) => format!("Issues for {}", repo),
        None => "All Issues".to_string(),
    };
    let mut out = format!("{}\n\n", style(heading).bold());

    if snapshot.loading {
        out.push_str("Loading issues...\n");
        return out;
    }
    if let Some(error) = &snapshot.error {
        out.push_str(&render_error(error));
        out.push('\n');
        return out;
    }
    if snapshot.issues.is_empty() {
        out.push_str("No issues found matching your criteria.\n");
        return out;
    }

    for issue in &snapshot.issues {
        out.push_str(&format!(
            "{}#{} {} ({})\n",
            ISSUE,
            issue.id,
            style(&issue.title).blue().bold(),
            render_state(issue)
        ));
        out.push_str(&format!(
            "    {} • Created on {}\n",
            issue.repo_full_name,
            format_date(&issue.created_at)
        ));
        if let Some(labels) = render_labels(&issue.labels) {
            out.push_str(&format!("    {}\n", labels));
        }
        if issue.is_ai_fixable {
            out.push_str(&format!("    {}AI-Fixable\n", ROBOT));
        }
    }
    out
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn phase_label(phase: FixPhase) -> String {
    let label = capitalize(phase.as_str());
    match phase {
        FixPhase::Approved | FixPhase::Submitted => style(label).green().to_string(),
        FixPhase::Rejected => style(label).red().to_string(),
        _ => style(label).yellow().to_string(),
    }
}

pub fn render_issue_detail(issue: &Issue, fixes: &[FixEntry]) -> String {
    let mut out = format!(
        "{} ({})\n",
        style(&issue.title).bold(),
        render_state(issue)
    );
    out.push_str(&format!(
        "{} • Created on {}\n",
        issue.repo_full_name,
        format_date(&issue.created_at)
    ));
    if let Some(labels) = render_labels(&issue.labels) {
        out.push_str(&format!("{}\n", labels));
    }

    let description = if issue.description.trim().is_empty() {
        "No description provided."
    } else {
        issue.description.as_str()
    };
    out.push_str(&format!("\n{}\n\n", description));
    out.push_str(&format!("{}View on GitHub: {}\n\n", LINK, issue.html_url));

    out.push_str(&format!("{}\n", style("AI Generated Fixes").bold()));
    if fixes.is_empty() {
        out.push_str("No fixes generated yet.\n");
        if issue.is_ai_fixable {
            out.push_str(&format!(
                "Run `automerge fix generate {}` to generate one.\n",
                issue.id
            ));
        }
        return out;
    }

    for (index, entry) in fixes.iter().enumerate() {
        let fix = &entry.fix;
        out.push_str(&format!(
            "\nFix #{} (id {}) {}\n",
            index + 1,
            fix.id,
            phase_label(entry.phase())
        ));
        out.push_str(&format!("Generated on {}\n", format_date(&fix.created_at)));
        for line in fix.content.lines() {
            out.push_str(&format!("  │ {}\n", line));
        }
        if fix.was_submitted() {
            match fix.pr_url.as_deref() {
                Some(url) => out.push_str(&format!("Submitted as PR: {}\n", url)),
                None => out.push_str("Submitted to GitHub\n"),
            }
            if let Some(message) = fix.submission_message.as_deref() {
                out.push_str(&format!("Message: {}\n", message));
            }
        }
    }
    out
}
