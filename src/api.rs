// API client module: a small blocking client for the KerbalStuff API.
// Reads need no session. Writes take the cookie set returned by `login`,
// which stays with the caller; the client itself holds no per-user state.

use std::fs;
use std::path::Path;

use reqwest::blocking::Client;
use tracing::info;

use crate::action::Action;
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::http::{CookieSet, Executor, RawResponse};
use crate::json::JsonValue;
use crate::model::{Mod, ModVersion, NewMod, NewVersion, User};
use crate::multipart::{self, FieldValue, FormParams};

/// Client for one KerbalStuff site. Cheap to clone; clones share the
/// underlying connection pool.
#[derive(Debug, Clone)]
pub struct KerbalStuff {
    executor: Executor,
    config: ClientConfig,
}

impl KerbalStuff {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(Error::Client)?;
        Ok(Self {
            executor: Executor::new(client),
            config,
        })
    }

    /// Client configured from the environment, see `ClientConfig::from_env`.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env())
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The executor, for requests outside the fixed action set.
    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    pub fn mod_info(&self, mod_id: i64) -> Result<Mod> {
        let json = self.get(Action::ModInfo(mod_id))?.into_json()?;
        Mod::from_json(&json)
    }

    pub fn mod_latest(&self, mod_id: i64) -> Result<ModVersion> {
        let json = self.get(Action::ModLatest(mod_id))?.into_json()?;
        ModVersion::from_json(&json)
    }

    /// Matching mods. Entries that are not objects are skipped.
    pub fn mod_search(&self, query: &str) -> Result<Vec<Mod>> {
        let json = self.get(Action::ModSearch(query))?.into_json()?;
        json.as_list()
            .unwrap_or_default()
            .iter()
            .filter(|entry| matches!(entry, JsonValue::Map(_)))
            .map(Mod::from_json)
            .collect()
    }

    pub fn user_info(&self, username: &str) -> Result<User> {
        let json = self.get(Action::UserInfo(username))?.into_json()?;
        User::from_json(&json)
    }

    /// Matching users. Every entry must decode as a user.
    pub fn user_search(&self, query: &str) -> Result<Vec<User>> {
        let json = self.get(Action::UserSearch(query))?.into_json()?;
        json.as_list()
            .unwrap_or_default()
            .iter()
            .map(User::from_json)
            .collect()
    }

    /// Log in and return the whole response. Its `cookies` are the session
    /// for `create` and `update`; its `json` is the server's verdict, which
    /// may be an application error even on a 200.
    pub fn login(&self, username: &str, password: &str) -> Result<RawResponse> {
        let params = FormParams::new()
            .text("username", username)
            .text("password", password);
        let response = self.post(Action::Login, &params, None)?;
        info!(
            "login for '{}' returned {} with {} cookies",
            username,
            response.status,
            response.cookies.len()
        );
        Ok(response)
    }

    /// Create a mod with its first version. Returns the server's JSON reply
    /// unchanged.
    pub fn create(&self, session: &CookieSet, new_mod: &NewMod, zipball: &Path) -> Result<JsonValue> {
        new_mod.validate()?;
        require_session(session)?;
        let file = read_zipball(zipball)?;

        let params = FormParams::new()
            .text("name", new_mod.name.as_str())
            .text("short-description", new_mod.short_description.as_str())
            .text("license", new_mod.license.as_str())
            .text("version", new_mod.version.friendly_version.as_str())
            .text("ksp-version", new_mod.version.ksp_version.as_str())
            .file("zipball", file);

        let reply = self.post(Action::Create, &params, Some(session))?.into_json()?;
        info!("create '{}' answered", new_mod.name);
        Ok(reply)
    }

    /// Upload a new version of an existing mod. Returns the server's JSON
    /// reply unchanged.
    pub fn update(
        &self,
        session: &CookieSet,
        mod_id: i64,
        version: &NewVersion,
        notify_followers: bool,
        zipball: &Path,
    ) -> Result<JsonValue> {
        version.validate()?;
        require_session(session)?;
        let file = read_zipball(zipball)?;

        let mut params = FormParams::new()
            .text("version", version.friendly_version.as_str())
            .text("ksp-version", version.ksp_version.as_str());
        if let Some(changelog) = version.changelog.as_deref().filter(|c| !c.is_empty()) {
            params = params.text("changelog", changelog);
        }
        let params = params
            .text("notify-followers", if notify_followers { "yes" } else { "no" })
            .file("zipball", file);

        let reply = self
            .post(Action::Update(mod_id), &params, Some(session))?
            .into_json()?;
        info!("update of mod #{} answered", mod_id);
        Ok(reply)
    }

    /// Site root joined with the `url` field of a create/update reply.
    pub fn absolute_url(&self, reply: &JsonValue) -> Option<String> {
        let path = reply.get("url")?.as_str()?;
        Some(format!("{}{}", self.config.root_uri.trim_end_matches('/'), path))
    }

    fn get(&self, action: Action<'_>) -> Result<RawResponse> {
        let url = action.url(&self.config.root_uri)?;
        self.executor.execute(action.method(), url.as_str(), None, None)
    }

    fn post(&self, action: Action<'_>, params: &FormParams, session: Option<&CookieSet>) -> Result<RawResponse> {
        let url = action.url(&self.config.root_uri)?;
        let body = multipart::encode(params, &multipart::generate_boundary());
        self.executor.execute(action.method(), url.as_str(), Some(body), session)
    }
}

fn require_session(session: &CookieSet) -> Result<()> {
    if session.is_empty() {
        return Err(Error::InvalidRequest("must log in first".into()));
    }
    Ok(())
}

/// Read the whole archive; the file handle is closed before returning.
fn read_zipball(path: &Path) -> Result<FieldValue> {
    if !path.is_file() {
        return Err(Error::InvalidRequest(format!("file '{}' does not exist", path.display())));
    }
    let data = fs::read(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("mod.zip")
        .to_string();
    Ok(FieldValue::zip(file_name, data))
}
