// The fixed set of API actions. Each action knows its HTTP method, its path
// template and how to turn its arguments into a fully escaped URL.

use std::fmt;

use reqwest::Url;

use crate::error::{Error, Result};
use crate::http::Method;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action<'a> {
    Login,
    Create,
    Update(i64),
    ModInfo(i64),
    ModLatest(i64),
    ModSearch(&'a str),
    UserInfo(&'a str),
    UserSearch(&'a str),
}

impl Action<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Login => "login",
            Action::Create => "create",
            Action::Update(_) => "update",
            Action::ModInfo(_) => "modinfo",
            Action::ModLatest(_) => "modlatest",
            Action::ModSearch(_) => "modsearch",
            Action::UserInfo(_) => "userinfo",
            Action::UserSearch(_) => "usersearch",
        }
    }

    pub fn method(&self) -> Method {
        match self {
            Action::Login | Action::Create | Action::Update(_) => Method::Post,
            _ => Method::Get,
        }
    }

    pub fn path_template(&self) -> &'static str {
        match self {
            Action::Login => "/api/login",
            Action::Create => "/api/mod/create",
            Action::Update(_) => "/api/mod/{modId}/update",
            Action::ModInfo(_) => "/api/mod/{modId}",
            Action::ModLatest(_) => "/api/mod/{modId}/latest",
            Action::ModSearch(_) => "/api/search/mod?query={query}",
            Action::UserInfo(_) => "/api/user/{username}",
            Action::UserSearch(_) => "/api/search/user?query={query}",
        }
    }

    /// Resolve against the site root. Path segments and the query value
    /// are percent-escaped.
    pub fn url(&self, root: &str) -> Result<Url> {
        let mut url = Url::parse(root)
            .map_err(|e| Error::InvalidRequest(format!("invalid root uri '{root}': {e}")))?;
        url.set_query(None);
        url.set_fragment(None);

        let id;
        let (segments, query): (Vec<&str>, Option<&str>) = match self {
            Action::Login => (vec!["login"], None),
            Action::Create => (vec!["mod", "create"], None),
            Action::Update(mod_id) => {
                id = mod_id.to_string();
                (vec!["mod", id.as_str(), "update"], None)
            }
            Action::ModInfo(mod_id) => {
                id = mod_id.to_string();
                (vec!["mod", id.as_str()], None)
            }
            Action::ModLatest(mod_id) => {
                id = mod_id.to_string();
                (vec!["mod", id.as_str(), "latest"], None)
            }
            Action::ModSearch(query) => (vec!["search", "mod"], Some(*query)),
            Action::UserInfo(username) => (vec!["user", *username], None),
            Action::UserSearch(query) => (vec!["search", "user"], Some(*query)),
        };

        url.path_segments_mut()
            .map_err(|_| Error::InvalidRequest(format!("root uri '{root}' cannot hold a path")))?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        if let Some(query) = query {
            url.query_pairs_mut().append_pair("query", query);
        }
        Ok(url)
    }
}

impl fmt::Display for Action<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method(), self.path_template())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT: &str = "https://kerbalstuff.com";

    #[test]
    fn every_action_resolves_to_its_template() {
        let cases = [
            (Action::Login, Method::Post, "https://kerbalstuff.com/api/login"),
            (Action::Create, Method::Post, "https://kerbalstuff.com/api/mod/create"),
            (Action::Update(42), Method::Post, "https://kerbalstuff.com/api/mod/42/update"),
            (Action::ModInfo(42), Method::Get, "https://kerbalstuff.com/api/mod/42"),
            (Action::ModLatest(42), Method::Get, "https://kerbalstuff.com/api/mod/42/latest"),
            (Action::ModSearch("mechjeb"), Method::Get, "https://kerbalstuff.com/api/search/mod?query=mechjeb"),
            (Action::UserInfo("toadicus"), Method::Get, "https://kerbalstuff.com/api/user/toadicus"),
            (Action::UserSearch("toad"), Method::Get, "https://kerbalstuff.com/api/search/user?query=toad"),
        ];
        for (action, method, expected) in cases {
            assert_eq!(action.method(), method, "{}", action.name());
            assert_eq!(action.url(ROOT).unwrap().as_str(), expected);
        }
    }

    #[test]
    fn arguments_are_percent_escaped() {
        let url = Action::ModSearch("kerbal engineer & co").url(ROOT).unwrap();
        assert_eq!(url.query(), Some("query=kerbal+engineer+%26+co"));

        let url = Action::UserInfo("a/b c").url(ROOT).unwrap();
        assert_eq!(url.path(), "/api/user/a%2Fb%20c");
    }

    #[test]
    fn trailing_slash_on_root_is_tolerated() {
        let url = Action::ModInfo(1).url("http://localhost:5000/").unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/mod/1");
    }

    #[test]
    fn bad_root_is_a_caller_error() {
        for root in ["", "kerbalstuff.com", "mailto:jeb@ksc"] {
            let err = Action::Login.url(root).unwrap_err();
            assert!(matches!(err, Error::InvalidRequest(_)), "{root}");
        }
    }

    #[test]
    fn display_shows_method_and_template() {
        assert_eq!(Action::Update(1).to_string(), "POST /api/mod/{modId}/update");
    }
}
