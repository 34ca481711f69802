// Library root
// ------------
// Client library for the KerbalStuff mod hosting API, plus the command
// layer used by the `kerbalstuff` binary.
//
// Module responsibilities:
// - `multipart`: encodes form fields and zipball uploads.
// - `json`: the decoded JSON value tree.
// - `http`: the blocking request executor, responses and cookies.
// - `model`: mods, mod versions and users decoded from JSON.
// - `action`: the fixed endpoint table and URL building.
// - `api`: the `KerbalStuff` client tying the above together.
// - `config` / `error`: configuration and the shared error type.
// - `cli`: command-line verbs and console output.
pub mod action;
pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod json;
pub mod model;
pub mod multipart;

pub use action::Action;
pub use api::KerbalStuff;
pub use config::{ClientConfig, ErrorConvention};
pub use error::{Error, Result};
pub use http::{CookieSet, Executor, Method, RawResponse, SessionCookie};
pub use json::JsonValue;
pub use model::{Mod, ModVersion, NewMod, NewVersion, User};
pub use multipart::{FieldValue, FormParams, MultipartBody};
