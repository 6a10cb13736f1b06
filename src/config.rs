use std::env;

use crate::domain::ids::{GroupId, RoleId};
use crate::error::{AppError, AppResult};

const DEFAULT_PORT: u16 = 3000;

/// Process configuration, read from the environment (a `.env` file is
/// honored by main before this runs).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub discord_token: String,
    /// Also the bot's own user id on current-generation applications.
    pub application_id: String,
    pub public_key: String,
    pub guild_id: String,
    pub active_group: GroupId,
    pub closed_group: GroupId,
    pub staff_role: RoleId,
    pub port: u16,
}

impl AppConfig {
    pub fn load() -> AppResult<Self> {
        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| AppError::Configuration(format!("invalid PORT value '{raw}'")))?,
            Err(_) => DEFAULT_PORT,
        };

        Ok(Self {
            discord_token: required("DISCORD_TOKEN")?,
            application_id: required("DISCORD_APPLICATION_ID")?,
            public_key: required("DISCORD_PUBLIC_KEY")?,
            guild_id: required("GUILD_ID")?,
            active_group: GroupId(required("TICKETS_CATEGORY_ID")?),
            closed_group: GroupId(required("CLOSED_CATEGORY_ID")?),
            staff_role: RoleId(required("STAFF_ROLE_ID")?),
            port,
        })
    }
}

fn required(name: &str) -> AppResult<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(AppError::Configuration(format!("{name} is not set"))),
    }
}

/// `ticketd config show`: print the resolved configuration with the token
/// masked, so a misconfigured deployment can be inspected safely.
pub fn show() -> AppResult<()> {
    let config = AppConfig::load()?;

    println!("Token: {}", mask_secret(&config.discord_token));
    println!("Application id: {}", config.application_id);
    println!("Public key: {}", mask_secret(&config.public_key));
    println!("Guild: {}", config.guild_id);
    println!("Active group: {}", config.active_group.as_str());
    println!("Closed group: {}", config.closed_group.as_str());
    println!("Staff role: {}", config.staff_role.as_str());
    println!("Port: {}", config.port);

    Ok(())
}

fn mask_secret(value: &str) -> String {
    if value.len() > 6 {
        format!("{}***{}", &value[..3], &value[value.len() - 3..])
    } else if value.is_empty() {
        "<not set>".to_string()
    } else {
        "***".to_string()
    }
}
