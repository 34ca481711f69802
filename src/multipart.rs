// multipart/form-data encoding for login, create and update requests.
// Bodies are built in memory so the exact bytes can be inspected and the
// same parameters always produce the same body for a given boundary.

use indexmap::IndexMap;
use uuid::Uuid;

/// MIME type attached to mod zipball uploads.
pub const ZIP_CONTENT_TYPE: &str = "application/zip";

/// One form field: plain text, or a file payload passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    File {
        file_name: String,
        content_type: String,
        data: Vec<u8>,
    },
}

impl FieldValue {
    pub fn zip(file_name: impl Into<String>, data: Vec<u8>) -> Self {
        FieldValue::File {
            file_name: file_name.into(),
            content_type: ZIP_CONTENT_TYPE.to_string(),
            data,
        }
    }
}

/// Ordered, uniquely named form fields. Inserting an existing name replaces
/// its value and keeps the original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormParams {
    fields: IndexMap<String, FieldValue>,
}

impl FormParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.insert(name.into(), value);
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, FieldValue::Text(value.into()));
        self
    }

    pub fn file(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }
}

/// An encoded body and the `Content-Type` header value that goes with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartBody {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// A fresh boundary token. Long and random enough that a collision with
/// field content is not worth checking for.
pub fn generate_boundary() -> String {
    format!("------------------------{}", Uuid::new_v4().simple())
}

/// Encode `params` in order. Names and filenames are written verbatim;
/// callers must not pass values containing quotes or line breaks.
pub fn encode(params: &FormParams, boundary: &str) -> MultipartBody {
    let mut bytes = Vec::new();

    for (name, value) in params.iter() {
        bytes.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        match value {
            FieldValue::Text(text) => {
                bytes.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                bytes.extend_from_slice(text.as_bytes());
            }
            FieldValue::File {
                file_name,
                content_type,
                data,
            } => {
                bytes.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                         Content-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                bytes.extend_from_slice(data);
            }
        }
        bytes.extend_from_slice(b"\r\n");
    }
    bytes.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    MultipartBody {
        content_type: format!("multipart/form-data; boundary={boundary}"),
        bytes,
    }
}
