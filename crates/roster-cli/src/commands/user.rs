//! User command handlers

use anyhow::{Context, Result};

use roster_core::{NewUser, RecordSource, SyncEngine, User};

use crate::avatar::data_uri_from_file;
use crate::editor::{confirm, prompt_with_default};
use crate::output::Output;

/// Optional field overrides shared by create and edit
#[derive(Debug, Clone, Default, clap::Args)]
pub struct UserFields {
    /// Full name
    #[arg(long)]
    pub name: Option<String>,
    /// Username
    #[arg(long)]
    pub username: Option<String>,
    /// Email address
    #[arg(long)]
    pub email: Option<String>,
    /// Phone number
    #[arg(long)]
    pub phone: Option<String>,
    /// Website
    #[arg(long)]
    pub website: Option<String>,
    /// Company name
    #[arg(long)]
    pub company: Option<String>,
    /// Path to an avatar image (png, jpg, gif, webp, svg; max 5 MB)
    #[arg(long)]
    pub avatar: Option<std::path::PathBuf>,
}

impl UserFields {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.username.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.website.is_none()
            && self.company.is_none()
            && self.avatar.is_none()
    }
}

/// List users, optionally filtered by a search query
pub async fn list(engine: &mut SyncEngine, search: Option<String>, output: &Output) -> Result<()> {
    let users = engine.fetch_all().await.context("Failed to load users")?;

    let filtered: Vec<User> = match search {
        Some(ref query) => users.iter().filter(|u| u.matches(query)).cloned().collect(),
        None => users.to_vec(),
    };

    output.print_users(&filtered);
    Ok(())
}

/// Show a single user
pub async fn show(engine: &mut SyncEngine, id: u64, output: &Output) -> Result<()> {
    let fetched = engine.fetch_one(id).await?;

    output.print_user(&fetched.user);
    if fetched.source == RecordSource::Cache {
        output.message("(served from local cache)");
    }
    Ok(())
}

/// Create a new user
pub async fn create(engine: &mut SyncEngine, fields: UserFields, output: &Output) -> Result<()> {
    // Hydrate so fallback-id and collision rules see the full collection
    hydrate(engine, output).await;

    let mut payload = NewUser::new(
        fields.name.clone().context("--name is required")?,
        fields.username.clone().context("--username is required")?,
        fields.email.clone().context("--email is required")?,
        fields.phone.clone().context("--phone is required")?,
    );
    if let Some(website) = fields.website {
        payload = payload.with_website(website);
    }
    if let Some(company) = fields.company {
        payload = payload.with_company(company);
    }
    if let Some(ref path) = fields.avatar {
        payload = payload.with_avatar(data_uri_from_file(path)?);
    }

    let outcome = engine.create_user(payload).await;

    if !outcome.remote_synced {
        output.warning("Remote create failed; record kept locally");
    }
    output.success(&format!("Created user {}", outcome.user.id));
    output.print_user(&outcome.user);
    Ok(())
}

/// Edit a user, from flags or interactively
pub async fn edit(
    engine: &mut SyncEngine,
    id: u64,
    fields: UserFields,
    output: &Output,
) -> Result<()> {
    hydrate(engine, output).await;

    let current = engine.fetch_one(id).await?.user;

    let payload = if fields.is_empty() && output.should_prompt() {
        prompt_payload(&current)?
    } else {
        merge_fields(&current, fields)?
    };

    let outcome = engine.update_user(id, payload).await;

    if !outcome.remote_synced {
        output.warning("Remote update failed; change kept locally");
    }
    output.success("User updated");
    output.print_user(&outcome.user);
    Ok(())
}

/// Delete a user
pub async fn delete(engine: &mut SyncEngine, id: u64, output: &Output) -> Result<()> {
    hydrate(engine, output).await;

    if output.should_prompt() {
        let name = engine
            .list()
            .iter()
            .find(|u| u.id == id)
            .map(|u| u.name.clone())
            .unwrap_or_else(|| format!("user {}", id));
        println!("Delete {} ({})", name, id);
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let outcome = engine.delete_user(id).await?;

    if !outcome.remote_synced {
        output.warning("Remote delete failed; removed locally");
    }
    output.success(&format!("Deleted user {}", id));
    Ok(())
}

/// Re-fetch the collection from the remote
pub async fn refresh(engine: &mut SyncEngine, output: &Output) -> Result<()> {
    let users = engine.fetch_all().await.context("Failed to refresh users")?;
    output.success(&format!("Refreshed {} user(s)", users.len()));
    Ok(())
}

/// Load the collection before a mutation; failure here is non-fatal
async fn hydrate(engine: &mut SyncEngine, output: &Output) {
    if let Err(e) = engine.fetch_all().await {
        output.warning(&format!("Could not load existing users: {}", e));
    }
}

/// Apply flag overrides on top of the current record
fn merge_fields(current: &User, fields: UserFields) -> Result<NewUser> {
    let mut payload: NewUser = current.clone().into();

    if let Some(name) = fields.name {
        payload.name = name;
    }
    if let Some(username) = fields.username {
        payload.username = username;
    }
    if let Some(email) = fields.email {
        payload.email = email;
    }
    if let Some(phone) = fields.phone {
        payload.phone = phone;
    }
    if let Some(website) = fields.website {
        payload.website = Some(website);
    }
    if let Some(company) = fields.company {
        payload = payload.with_company(company);
    }
    if let Some(ref path) = fields.avatar {
        payload.avatar_url = Some(data_uri_from_file(path)?);
    }

    Ok(payload)
}

/// Interactive editing: Enter keeps the current value
fn prompt_payload(current: &User) -> Result<NewUser> {
    println!("Editing user: {}", current.id);
    println!("Press Enter to keep current value, or type new value.\n");

    let mut payload: NewUser = current.clone().into();

    if let Some(name) = prompt_with_default("Name", &payload.name)? {
        payload.name = name;
    }
    if let Some(username) = prompt_with_default("Username", &payload.username)? {
        payload.username = username;
    }
    if let Some(email) = prompt_with_default("Email", &payload.email)? {
        payload.email = email;
    }
    if let Some(phone) = prompt_with_default("Phone", &payload.phone)? {
        payload.phone = phone;
    }
    if let Some(website) = prompt_with_default("Website", payload.website.as_deref().unwrap_or(""))?
    {
        payload.website = if website.is_empty() { None } else { Some(website) };
    }
    let current_company = current.company_name().unwrap_or("");
    if let Some(company) = prompt_with_default("Company", current_company)? {
        if !company.is_empty() {
            payload = payload.with_company(company);
        }
    }

    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_core::NewUser;

    #[test]
    fn test_user_fields_is_empty() {
        assert!(UserFields::default().is_empty());

        let fields = UserFields {
            name: Some("X".to_string()),
            ..UserFields::default()
        };
        assert!(!fields.is_empty());
    }

    #[test]
    fn test_merge_fields_keeps_unset_values() {
        let current = User::from_payload(
            1,
            NewUser::new("Old Name", "old", "old@example.com", "111").with_company("OldCo"),
        );

        let fields = UserFields {
            name: Some("New Name".to_string()),
            ..UserFields::default()
        };

        let payload = merge_fields(&current, fields).unwrap();
        assert_eq!(payload.name, "New Name");
        assert_eq!(payload.username, "old");
        assert_eq!(payload.company.unwrap().name.as_deref(), Some("OldCo"));
    }
}
