//! Fix lifecycle commands — `automerge fix generate|submit|delete`.

use anyhow::{Context, Result};
use automerge_ai::fixes::FixLifecycleController;
use automerge_ai::ui::ActivitySpinner;
use automerge_ai::ui::views::render_issue_detail;
use console::style;
use dialoguer::Confirm;

use super::super::FixCommands;
use super::AppContext;

pub async fn cmd_fix(ctx: &AppContext, command: FixCommands) -> Result<()> {
    let session = ctx.require_session().await?;
    let issue_id = match &command {
        FixCommands::Generate { issue }
        | FixCommands::Submit { issue, .. }
        | FixCommands::Delete { issue, .. } => *issue,
    };

    let controller = FixLifecycleController::new(ctx.gateway.clone(), session.user_id(), issue_id);
    controller
        .open()
        .await
        .with_context(|| format!("Failed to load issue {}", issue_id))?;

    match command {
        FixCommands::Generate { .. } => {
            let spinner = ActivitySpinner::start(format!("Generating fix for issue #{}...", issue_id));
            match controller.generate().await {
                Ok(fix) => spinner.success(&format!("Generated fix {}", fix.id)),
                Err(e) => {
                    spinner.fail("Fix generation failed");
                    return Err(e.into());
                }
            }
        }
        FixCommands::Submit { fix, message, .. } => {
            let spinner = ActivitySpinner::start(format!("Submitting fix {} to GitHub...", fix));
            match controller.submit(fix, &message).await {
                Ok(submitted) => match submitted.pr_url.as_deref() {
                    Some(url) => spinner.success(&format!("Submitted as PR: {}", url)),
                    None => spinner.success("Submitted to GitHub"),
                },
                Err(e) => {
                    spinner.fail("Submission failed");
                    return Err(e.into());
                }
            }
        }
        FixCommands::Delete { fix, yes, .. } => {
            if !yes {
                let confirm = Confirm::new()
                    .with_prompt(format!("Delete fix {} of issue #{}?", fix, issue_id))
                    .default(false)
                    .interact()
                    .unwrap_or(false);

                if !confirm {
                    println!("Deletion cancelled.");
                    return Ok(());
                }
            }

            controller.delete(fix).await?;
            println!("Deleted fix {}", style(fix).cyan());
        }
    }

    if let Some(issue) = controller.issue() {
        println!();
        print!("{}", render_issue_detail(&issue, &controller.fixes()));
    }
    Ok(())
}
