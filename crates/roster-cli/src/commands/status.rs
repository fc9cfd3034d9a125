//! Status command handler

use anyhow::Result;

use roster_core::{AvatarStore, Config, UserStore};

use crate::output::{Output, OutputFormat};

/// Show cache and configuration status
pub fn show(config: &Config, output: &Output) -> Result<()> {
    let users = UserStore::new(config.users_path());
    let avatars = AvatarStore::new(config.avatars_path());

    let cached_users = users.read();
    let avatar_count = avatars.read().len();
    let saved_at = users.saved_at();

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "api_base_url": config.api_base_url,
                    "data_dir": config.data_dir,
                    "snapshot_exists": users.exists(),
                    "saved_at": saved_at,
                    "counts": {
                        "users": cached_users.len(),
                        "avatars": avatar_count
                    }
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", cached_users.len());
        }
        OutputFormat::Human => {
            println!("Roster Status");
            println!("=============");
            println!();
            println!("Remote:");
            println!("  API: {}", config.api_base_url);
            println!();
            println!("Local cache:");
            println!("  Location: {}", config.data_dir.display());
            match saved_at {
                Some(ts) => println!("  Saved:    {}", ts.format("%Y-%m-%d %H:%M:%S UTC")),
                None => println!("  Saved:    (no snapshot yet)"),
            }
            println!();
            println!("Contents:");
            println!("  Users:   {}", cached_users.len());
            println!("  Avatars: {}", avatar_count);
        }
    }

    Ok(())
}
