//! Account commands

use std::sync::Arc;

use anyhow::{Context, anyhow};

use roster_core::AuthSession;
use roster_core::client::TOKEN_KEY;
use roster_core::domain::{FormValues, login_fields, register_fields};
use roster_core::form::Form;

use crate::output::OutputFormat;
use crate::prompt::Prompter;
use crate::state::AppState;

pub async fn health(state: &AppState, format: OutputFormat) -> anyhow::Result<()> {
    state.require_online()?;
    let health = state.auth.health().await.context("API is not healthy")?;
    format.health(&health)
}

pub async fn register(state: &AppState, format: OutputFormat) -> anyhow::Result<()> {
    state.require_online()?;
    let values = ask(state, Form::new(register_fields())).await?;

    let session = AuthSession::start(Arc::new(state.auth.clone())).await;
    let ok = session
        .register(field(&values, "username"), field(&values, "email"), field(&values, "password"))
        .await;
    signed_in(&session, ok, format).await
}

pub async fn login(state: &AppState, format: OutputFormat) -> anyhow::Result<()> {
    state.require_online()?;
    let values = ask(state, Form::new(login_fields())).await?;

    let session = AuthSession::start(Arc::new(state.auth.clone())).await;
    let ok = session
        .login(field(&values, "username"), field(&values, "password"))
        .await;
    signed_in(&session, ok, format).await
}

pub async fn logout(state: &AppState, format: OutputFormat) -> anyhow::Result<()> {
    if !state.network.is_online() {
        state.store.delete(TOKEN_KEY).await?;
        return format.message("Signed out locally.");
    }

    let session = AuthSession::new(Arc::new(state.auth.clone()));
    match session.logout().await {
        Ok(()) => format.message("Signed out."),
        Err(_) => format.message("Signed out locally; the server could not be reached."),
    }
}

pub async fn whoami(state: &AppState, format: OutputFormat) -> anyhow::Result<()> {
    state.require_online()?;
    let session = AuthSession::start(Arc::new(state.auth.clone())).await;
    match session.user().await {
        Some(user) => format.user(&user),
        None => format.message("Not signed in."),
    }
}

async fn ask(state: &AppState, mut form: Form) -> anyhow::Result<FormValues> {
    Prompter::stdio().fill(&mut form, state.files.as_ref(), None).await
}

fn field<'a>(values: &'a FormValues, name: &str) -> &'a str {
    values.get(name).map(String::as_str).unwrap_or_default()
}

async fn signed_in(session: &AuthSession, ok: bool, format: OutputFormat) -> anyhow::Result<()> {
    if !ok {
        let message = session
            .error()
            .await
            .unwrap_or_else(|| "Authentication failed".to_string());
        return Err(anyhow!(message));
    }
    match session.user().await {
        Some(user) => format.user(&user),
        None => format.message("Signed in."),
    }
}
