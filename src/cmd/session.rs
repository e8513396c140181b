//! Login, session and dashboard home commands — `automerge login|session|logout|repos`.

use anyhow::{Context, Result};
use automerge_ai::dashboard::Dashboard;
use automerge_ai::gateway::{Gateway, login_url};
use automerge_ai::models::split_full_name;
use automerge_ai::ui::icons::CHECK;
use automerge_ai::ui::views::{render_repos, render_session, render_welcome};
use console::style;

use super::AppContext;

pub fn cmd_login(ctx: &AppContext, no_browser: bool) -> Result<()> {
    let url = login_url(&ctx.config.api_base_url());
    println!("{}", render_welcome(&url));

    if !no_browser && let Err(e) = open::that(&url) {
        tracing::warn!(error = %e, "failed to open browser");
        println!("Could not open a browser. Visit the URL above manually.");
    }

    println!("After signing in, complete the login with:");
    println!(
        "  {}",
        style("automerge session --url '<redirect URL>'").cyan()
    );
    Ok(())
}

pub async fn cmd_session(ctx: &AppContext, url: Option<&str>) -> Result<()> {
    let resolution = ctx.resolver.resolve_reporting(url).await;
    let session = resolution.session;
    println!("{}", render_session(&session));
    if let Some(e) = resolution.storage_error {
        return Err(e).context("Signed in for this run only, the session was not saved");
    }
    if url.is_some() && session.is_authenticated() {
        println!("{}Session saved.", CHECK);
    }
    Ok(())
}

pub fn cmd_logout(ctx: &AppContext) -> Result<()> {
    let logged_out = ctx.resolver.logout();
    if let Some(e) = logged_out.storage_error {
        return Err(e).context("Failed to sign out, the stored session is still present");
    }
    let session = logged_out.session;
    println!("{}Signed out. {}", CHECK, render_session(&session));
    Ok(())
}

pub async fn cmd_repos(ctx: &AppContext, full_name: Option<&str>) -> Result<()> {
    if let Some(full_name) = full_name {
        let session = ctx.require_session().await?;
        let (owner, repo) = split_full_name(full_name)
            .with_context(|| format!("Expected owner/name, got '{}'", full_name))?;
        let repo = ctx
            .gateway
            .get_repository(session.user_id(), owner, repo)
            .await
            .with_context(|| format!("Failed to load repository {}", full_name))?;
        print!("{}", render_repos(std::slice::from_ref(&repo)));
        if let Some(url) = &repo.html_url {
            println!("  {}", style(url).underlined());
        }
        return Ok(());
    }

    let dashboard = Dashboard::load(&ctx.resolver, ctx.gateway.clone(), None).await;
    if !dashboard.session.is_authenticated() {
        anyhow::bail!("Not signed in. Run 'automerge login' first.");
    }

    println!("{}", render_session(&dashboard.session));
    println!();
    if let Some(error) = dashboard.error {
        anyhow::bail!(error);
    }
    print!("{}", render_repos(&dashboard.repos));
    Ok(())
}
