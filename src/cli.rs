// Command layer: clap verbs for every API action, console output, and the
// saved login session. The functions are small and synchronous; each verb
// is one client call followed by printing its result.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use dialoguer::Password;
use indicatif::{ProgressBar, ProgressStyle};

use crate::api::KerbalStuff;
use crate::config::ClientConfig;
use crate::http::CookieSet;
use crate::json::JsonValue;
use crate::model::{NewMod, NewVersion};

const SESSION_FILE: &str = ".kerbalstuff_session";

/// Command-line client for the KerbalStuff mod hosting API.
#[derive(Parser, Debug)]
#[command(name = "kerbalstuff")]
pub struct Cli {
    /// Site root to talk to (defaults to $KERBALSTUFF_URL or https://kerbalstuff.com).
    #[arg(long, global = true)]
    pub root: Option<String>,

    /// Log requests and responses to stderr.
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone, Default)]
pub struct Credentials {
    /// Log in as this user instead of using the saved session.
    #[arg(short = 'u', long, visible_alias = "user")]
    pub username: Option<String>,

    /// Password for --username; prompted for when omitted.
    #[arg(short = 'p', long, visible_alias = "pass", requires = "username")]
    pub password: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show a mod and its versions.
    #[command(name = "modinfo", visible_aliases = ["mod", "m"])]
    ModInfo { mod_id: i64 },

    /// Show the latest version of a mod.
    #[command(name = "modlatest", visible_aliases = ["latest", "l"])]
    ModLatest { mod_id: i64 },

    /// Search mods by name.
    #[command(name = "modsearch", visible_aliases = ["search", "s"])]
    ModSearch { query: String },

    /// Show a user and their mods.
    #[command(name = "userinfo", visible_aliases = ["user", "u"])]
    UserInfo { username: String },

    /// Search users by name.
    #[command(name = "usersearch", visible_alias = "us")]
    UserSearch { query: String },

    /// Log in and save the session for later uploads.
    Login {
        #[arg(short = 'u', long)]
        username: String,
        #[arg(short = 'p', long)]
        password: Option<String>,
    },

    /// Forget the saved session.
    Logout,

    /// Create a new mod from a zipball.
    #[command(visible_alias = "c")]
    Create {
        #[command(flatten)]
        credentials: Credentials,
        #[arg(short = 'n', long)]
        name: String,
        #[arg(short = 'd', long, visible_alias = "desc")]
        short_description: String,
        #[arg(long, visible_alias = "ver")]
        version: String,
        #[arg(short = 'k', long, visible_alias = "ksp")]
        ksp_version: String,
        #[arg(short = 'l', long, visible_alias = "lic")]
        license: String,
        #[arg(short = 'f', long)]
        file: PathBuf,
    },

    /// Upload a new version of an existing mod.
    #[command(visible_alias = "up")]
    Update {
        #[command(flatten)]
        credentials: Credentials,
        #[arg(short = 'm', long)]
        mod_id: i64,
        #[arg(long, visible_alias = "ver")]
        version: String,
        #[arg(short = 'k', long, visible_alias = "ksp")]
        ksp_version: String,
        #[arg(short = 'l', long, visible_alias = "log")]
        changelog: Option<String>,
        /// Email followers about the update.
        #[arg(short = 'n', long)]
        notify: bool,
        #[arg(short = 'f', long)]
        file: PathBuf,
    },
}

pub fn run(args: Cli) -> Result<()> {
    let mut config = ClientConfig::from_env();
    if let Some(root) = args.root {
        config = config.with_root(root);
    }
    let client = KerbalStuff::new(config).context("Failed to build HTTP client")?;

    match args.command {
        Command::ModInfo { mod_id } => {
            let m = client
                .mod_info(mod_id)
                .with_context(|| format!("Couldn't get mod info for mod {mod_id}"))?;
            println!("{m}");
        }
        Command::ModLatest { mod_id } => {
            let version = client
                .mod_latest(mod_id)
                .with_context(|| format!("Couldn't get version info for mod {mod_id}"))?;
            println!("{version}");
        }
        Command::ModSearch { query } => {
            let mods = client.mod_search(&query).context("Mod search failed")?;
            print_results(&mods);
        }
        Command::UserInfo { username } => {
            let user = client
                .user_info(&username)
                .with_context(|| format!("Couldn't get user info for username '{username}'"))?;
            println!("{user}");
        }
        Command::UserSearch { query } => {
            let users = client.user_search(&query).context("User search failed")?;
            print_results(&users);
        }
        Command::Login { username, password } => {
            let session = login(&client, &username, password)?;
            let path = session_path();
            save_session(&path, &session)?;
            println!("Logged in as {username}; session saved to {}", path.display());
        }
        Command::Logout => {
            let path = session_path();
            if clear_session(&path)? {
                println!("Session removed.");
            } else {
                println!("No saved session.");
            }
        }
        Command::Create {
            credentials,
            name,
            short_description,
            version,
            ksp_version,
            license,
            file,
        } => {
            let session = acquire_session(&client, credentials)?;
            let new_mod = NewMod {
                name,
                short_description,
                license,
                version: NewVersion::new(version, ksp_version),
            };
            let spinner = spinner("Uploading...");
            let reply = client.create(&session, &new_mod, &file);
            spinner.finish_and_clear();
            let reply = reply.context("Could not complete creation attempt")?;
            println!("{}", create_report(&client, &reply)?);
        }
        Command::Update {
            credentials,
            mod_id,
            version,
            ksp_version,
            changelog,
            notify,
            file,
        } => {
            let session = acquire_session(&client, credentials)?;
            let mut new_version = NewVersion::new(version, ksp_version);
            if let Some(changelog) = changelog {
                new_version = new_version.with_changelog(changelog);
            }
            let spinner = spinner("Uploading...");
            let reply = client.update(&session, mod_id, &new_version, notify, &file);
            spinner.finish_and_clear();
            let reply = reply.context("Could not complete update attempt")?;
            println!("{}", update_report(&client, &reply)?);
        }
    }
    Ok(())
}

fn print_results<T: std::fmt::Display>(items: &[T]) {
    if items.is_empty() {
        println!("Query yielded no results.");
        return;
    }
    for item in items {
        println!("{item}");
        println!();
    }
}

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Log in, prompting for the password if needed, and return the session.
fn login(client: &KerbalStuff, username: &str, password: Option<String>) -> Result<CookieSet> {
    let password = match password {
        Some(password) => password,
        None => Password::new()
            .with_prompt(format!("Password for {username}"))
            .interact()
            .context("Failed to read password")?,
    };

    let response = client
        .login(username, &password)
        .context("Could not complete login attempt")?;
    if let Some(reason) = response
        .json
        .as_ref()
        .and_then(|json| client.config().error_convention.application_error(json))
    {
        bail!("Login failed: {reason}");
    }
    if response.cookies.is_empty() {
        bail!("Login failed: server answered {} without a session cookie", response.status);
    }
    Ok(response.cookies)
}

/// Fresh login when a username is given, otherwise the saved session.
fn acquire_session(client: &KerbalStuff, credentials: Credentials) -> Result<CookieSet> {
    match credentials.username {
        Some(username) => login(client, &username, credentials.password),
        None => load_session(&session_path())?
            .context("Not logged in: run `kerbalstuff login` first or pass --username"),
    }
}

/// Summary line for a create reply, or the server's error.
pub fn create_report(client: &KerbalStuff, reply: &JsonValue) -> Result<String> {
    if let Some(reason) = client.config().error_convention.application_error(reply) {
        bail!("Creation failed: {reason}");
    }
    Ok(format!(
        "New mod '{}' created with id #{}!  You can view and publish the mod at {}",
        field(reply, "name"),
        field(reply, "id"),
        client.absolute_url(reply).unwrap_or_default()
    ))
}

/// Summary line for an update reply, or the server's error.
pub fn update_report(client: &KerbalStuff, reply: &JsonValue) -> Result<String> {
    if let Some(reason) = client.config().error_convention.application_error(reply) {
        bail!("Update failed: {reason}");
    }
    Ok(format!(
        "Mod #{} updated!  You can view the update at {}",
        field(reply, "id"),
        client.absolute_url(reply).unwrap_or_default()
    ))
}

fn field(reply: &JsonValue, key: &str) -> String {
    reply.get(key).map(JsonValue::to_string).unwrap_or_default()
}

/// Saved session location in the user's home directory.
pub fn session_path() -> PathBuf {
    let dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    dir.join(SESSION_FILE)
}

pub fn save_session(path: &Path, session: &CookieSet) -> Result<()> {
    let data = serde_json::to_string_pretty(session).context("Failed to serialize session")?;
    fs::write(path, data).with_context(|| format!("Failed to write session to {}", path.display()))?;
    Ok(())
}

/// `None` when no session has been saved yet.
pub fn load_session(path: &Path) -> Result<Option<CookieSet>> {
    if !path.exists() {
        return Ok(None);
    }
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read session from {}", path.display()))?;
    let session: CookieSet = serde_json::from_str(&data)
        .with_context(|| format!("Saved session in {} is corrupt", path.display()))?;
    Ok(Some(session).filter(|s| !s.is_empty()))
}

/// Returns whether a session file was removed.
pub fn clear_session(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    Ok(true)
}
