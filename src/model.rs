// Entities returned by the KerbalStuff API (mods, mod versions, users) and
// the inputs used to create or update a mod. Decoding is strict: a missing
// or mistyped required field fails the whole entity.

use std::fmt;

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::json::JsonValue;

/// Typed access to the fields of one JSON object, with errors that name
/// the entity and field.
struct Fields<'a> {
    entity: &'static str,
    map: &'a IndexMap<String, JsonValue>,
}

impl<'a> Fields<'a> {
    fn of(entity: &'static str, value: &'a JsonValue) -> Result<Self> {
        match value {
            JsonValue::Map(map) => Ok(Fields { entity, map }),
            _ => Err(Error::NotAnObject { entity }),
        }
    }

    fn required(&self, field: &'static str) -> Result<&'a JsonValue> {
        self.map.get(field).ok_or(Error::MissingField {
            entity: self.entity,
            field,
        })
    }

    fn wrong_type(&self, field: &'static str, expected: &'static str) -> Error {
        Error::WrongType {
            entity: self.entity,
            field,
            expected,
        }
    }

    fn string(&self, field: &'static str) -> Result<String> {
        match self.required(field)? {
            JsonValue::String(s) => Ok(s.clone()),
            _ => Err(self.wrong_type(field, "a string")),
        }
    }

    fn integer(&self, field: &'static str) -> Result<i64> {
        match self.required(field)? {
            JsonValue::Integer(n) => Ok(*n),
            _ => Err(self.wrong_type(field, "an integer")),
        }
    }

    fn list(&self, field: &'static str) -> Result<&'a [JsonValue]> {
        match self.required(field)? {
            JsonValue::List(items) => Ok(items),
            _ => Err(self.wrong_type(field, "a list")),
        }
    }

    /// Absent and `null` both read as `None`.
    fn optional_string(&self, field: &'static str) -> Result<Option<String>> {
        match self.map.get(field) {
            None | Some(JsonValue::Null) => Ok(None),
            Some(JsonValue::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(self.wrong_type(field, "a string")),
        }
    }

    fn optional_list(&self, field: &'static str) -> Result<Option<&'a [JsonValue]>> {
        match self.map.get(field) {
            None | Some(JsonValue::Null) => Ok(None),
            Some(JsonValue::List(items)) => Ok(Some(items)),
            Some(_) => Err(self.wrong_type(field, "a list")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModVersion {
    pub id: i64,
    pub friendly_version: String,
    pub ksp_version: String,
    pub download_path: String,
    pub changelog: Option<String>,
}

impl ModVersion {
    pub fn from_json(value: &JsonValue) -> Result<Self> {
        let fields = Fields::of("ModVersion", value)?;
        Ok(ModVersion {
            id: fields.integer("id")?,
            friendly_version: fields.string("friendly_version")?,
            ksp_version: fields.string("ksp_version")?,
            download_path: fields.string("download_path")?,
            changelog: fields.optional_string("changelog")?,
        })
    }
}

impl fmt::Display for ModVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ModVersion {}:", self.friendly_version)?;
        writeln!(f, "id: {}", self.id)?;
        writeln!(f, "ksp_version: {}", self.ksp_version)?;
        writeln!(f, "download_path: {}", self.download_path)?;
        write!(f, "changelog: {}", self.changelog.as_deref().unwrap_or(""))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mod {
    pub id: i64,
    pub name: String,
    pub author: String,
    pub short_description: String,
    pub license: Option<String>,
    pub downloads: i64,
    pub followers: i64,
    pub default_version_id: i64,
    pub versions: Vec<ModVersion>,
}

impl Mod {
    /// Entries of `versions` that are not objects are skipped; entries that
    /// are objects must decode in full.
    pub fn from_json(value: &JsonValue) -> Result<Self> {
        let fields = Fields::of("Mod", value)?;
        let mut m = Mod {
            id: fields.integer("id")?,
            name: fields.string("name")?,
            author: fields.string("author")?,
            short_description: fields.string("short_description")?,
            license: fields.optional_string("license")?,
            downloads: fields.integer("downloads")?,
            followers: fields.integer("followers")?,
            default_version_id: fields.integer("default_version_id")?,
            versions: Vec::new(),
        };

        for entry in fields.optional_list("versions")?.unwrap_or_default() {
            if let JsonValue::Map(_) = entry {
                m.versions.push(ModVersion::from_json(entry)?);
            }
        }
        Ok(m)
    }
}

impl fmt::Display for Mod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Mod: {}", self.name)?;
        writeln!(f, "id: {}", self.id)?;
        writeln!(f, "author: {}", self.author)?;
        writeln!(f, "downloads: {}", self.downloads)?;
        writeln!(f, "followers: {}", self.followers)?;
        writeln!(f, "short_description: {}", self.short_description)?;
        if let Some(license) = &self.license {
            writeln!(f, "license: {license}")?;
        }
        writeln!(f, "default_version_id: {}", self.default_version_id)?;
        writeln!(f, "versions:")?;
        writeln!(f, "[")?;
        for version in &self.versions {
            writeln!(f, "{version}")?;
        }
        write!(f, "]")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub username: String,
    pub twitter_username: String,
    pub reddit_username: String,
    pub irc_nick: String,
    pub forum_username: String,
    pub description: String,
    pub mods: Vec<Mod>,
}

impl User {
    /// Every entry of `mods` must be a mod object.
    pub fn from_json(value: &JsonValue) -> Result<Self> {
        let fields = Fields::of("User", value)?;
        let mut user = User {
            username: fields.string("username")?,
            twitter_username: fields.string("twitterUsername")?,
            reddit_username: fields.string("redditUsername")?,
            irc_nick: fields.string("ircNick")?,
            forum_username: fields.string("forumUsername")?,
            description: fields.string("description")?,
            mods: Vec::new(),
        };

        user.mods = fields
            .list("mods")?
            .iter()
            .map(Mod::from_json)
            .collect::<Result<Vec<_>>>()?;
        Ok(user)
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "User: username={}, twitterUsername={}, redditUsername={}, ircNick={}, description={}, forumUsername={}",
            self.username,
            self.twitter_username,
            self.reddit_username,
            self.irc_nick,
            self.description,
            self.forum_username
        )?;
        write!(f, "mods:")?;
        for m in &self.mods {
            write!(f, "\n{m}")?;
        }
        Ok(())
    }
}

/// A version to upload, either as the first version of a new mod or as an
/// update to an existing one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVersion {
    pub friendly_version: String,
    pub ksp_version: String,
    pub changelog: Option<String>,
}

impl NewVersion {
    pub fn new(friendly_version: impl Into<String>, ksp_version: impl Into<String>) -> Self {
        Self {
            friendly_version: friendly_version.into(),
            ksp_version: ksp_version.into(),
            changelog: None,
        }
    }

    pub fn with_changelog(mut self, changelog: impl Into<String>) -> Self {
        self.changelog = Some(changelog.into());
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        require("version.friendly_version", &self.friendly_version)?;
        require("version.ksp_version", &self.ksp_version)
    }
}

/// A mod to create together with its first version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMod {
    pub name: String,
    pub short_description: String,
    pub license: String,
    pub version: NewVersion,
}

impl NewMod {
    pub(crate) fn validate(&self) -> Result<()> {
        require("mod.name", &self.name)?;
        require("mod.license", &self.license)?;
        require("mod.short_description", &self.short_description)?;
        self.version.validate()
    }
}

fn require(what: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::InvalidRequest(format!("{what} cannot be empty")));
    }
    Ok(())
}
