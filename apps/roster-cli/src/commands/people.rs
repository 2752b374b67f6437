//! People commands

use std::path::Path;

use anyhow::Context;

use roster_core::domain::{NewPerson, person_fields};
use roster_core::form::Form;
use roster_shared::dto::PageQuery;

use crate::PeopleCommands;
use crate::output::OutputFormat;
use crate::prompt::Prompter;
use crate::state::AppState;

pub async fn handle(
    action: PeopleCommands,
    state: &AppState,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match action {
        PeopleCommands::List { page, limit } => {
            state.require_online()?;
            if page.is_none() && limit.is_none() {
                let people = state.people.list().await?;
                format.people(&people)
            } else {
                let defaults = PageQuery::default();
                let query = PageQuery {
                    page: page.unwrap_or(defaults.page).max(1),
                    limit: limit.unwrap_or(defaults.limit).max(1),
                };
                let page = state.people.page(query).await?;
                format.page(&page)
            }
        }
        PeopleCommands::Show { id } => {
            state.require_online()?;
            let person = state.people.get(&id).await?;
            format.person(&person)
        }
        PeopleCommands::Add { photo } => add(state, photo.as_deref(), format).await,
        PeopleCommands::Edit { id } => edit(state, &id, format).await,
        PeopleCommands::Delete { id, yes } => {
            state.require_online()?;
            if !yes
                && !Prompter::stdio()
                    .confirm(&format!("Delete person {}?", id))
                    .await?
            {
                return format.message("Cancelled.");
            }
            state.people.delete(&id).await?;
            format.message(&format!("Deleted person {}.", id))
        }
        PeopleCommands::Search { query } => {
            state.require_online()?;
            let people = state.people.search(&query).await?;
            format.people(&people)
        }
        PeopleCommands::Export { format: export, out } => {
            state.require_online()?;
            let text = state.people.export(export.into()).await?;
            match out {
                Some(path) => {
                    tokio::fs::write(&path, &text)
                        .await
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    format.message(&format!("Exported {} bytes to {}.", text.len(), path.display()))
                }
                None => {
                    print!("{}", text);
                    if !text.ends_with('\n') {
                        println!();
                    }
                    Ok(())
                }
            }
        }
    }
}

/// Interactive create. Answers are kept as a draft until the server accepts
/// them, so an interrupted or offline session can be resumed.
async fn add(state: &AppState, photo: Option<&Path>, format: OutputFormat) -> anyhow::Result<()> {
    let restored = state.drafts.restore().await;
    if restored.is_some() {
        eprintln!("Resuming your unsaved entry.");
    }
    let mut form = Form::with_values(person_fields(), restored.unwrap_or_default());

    if let Some(path) = photo {
        form.load_file("photo", state.files.as_ref(), path).await?;
    }

    let values = Prompter::stdio()
        .fill(&mut form, state.files.as_ref(), Some(&state.drafts))
        .await?;
    let person = NewPerson::from_values(&values)?;

    state
        .require_online()
        .context("your entry was saved and will be offered next time")?;
    let created = state.people.create_with_photo(person).await?;

    if let Err(e) = state.drafts.clear().await {
        tracing::warn!(error = %e, "Failed to clear draft");
    }
    format.person(&created)
}

async fn edit(state: &AppState, id: &str, format: OutputFormat) -> anyhow::Result<()> {
    state.require_online()?;
    let existing = state.people.get(id).await?;

    let mut form = Form::with_values(person_fields(), existing.to_values());
    let values = Prompter::stdio()
        .fill(&mut form, state.files.as_ref(), None)
        .await?;
    let person = NewPerson::from_values(&values)?;

    let updated = state.people.update_with_photo(id, person).await?;
    format.person(&updated)
}

pub async fn upload(state: &AppState, path: &Path, format: OutputFormat) -> anyhow::Result<()> {
    state.require_online()?;
    let file = state.files.read(path).await?;
    let url = state.people.upload_photo(file).await?;
    format.upload(&url)
}
