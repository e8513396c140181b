//! Issue browsing commands — `automerge issues` and `automerge issue <id>`.

use anyhow::Result;
use automerge_ai::filter::{FetchOutcome, IssueFilterState};
use automerge_ai::fixes::FixLifecycleController;
use automerge_ai::models::FilterUpdate;
use automerge_ai::ui::views::{render_issue_detail, render_issue_list};

use super::AppContext;

pub async fn cmd_issues(
    ctx: &AppContext,
    repo: Option<&str>,
    search: Option<&str>,
    label: Option<&str>,
    ai_fixable: bool,
) -> Result<()> {
    let session = ctx.require_session().await?;

    let mut update = FilterUpdate::default().ai_fixable_only(ai_fixable);
    if let Some(repo) = repo {
        update = update.repo_scope(repo);
    }
    if let Some(search) = search {
        update = update.search(search);
    }
    if let Some(label) = label {
        update = update.label(label);
    }

    let state = IssueFilterState::new(ctx.gateway.clone(), session.user_id());
    let outcome = state.set_filter(update).await;
    print!("{}", render_issue_list(&state.snapshot()));

    if let FetchOutcome::Failed { error, .. } = outcome {
        return Err(anyhow::Error::new(error).context("Failed to load issues"));
    }
    Ok(())
}

pub async fn cmd_issue(ctx: &AppContext, issue_id: u64) -> Result<()> {
    let session = ctx.require_session().await?;
    let controller = FixLifecycleController::new(ctx.gateway.clone(), session.user_id(), issue_id);

    if let Err(e) = controller.open().await {
        let message = controller
            .last_error()
            .unwrap_or_else(|| "Failed to load issue details.".to_string());
        return Err(anyhow::Error::new(e).context(message));
    }

    if let Some(issue) = controller.issue() {
        print!("{}", render_issue_detail(&issue, &controller.fixes()));
    }
    Ok(())
}
