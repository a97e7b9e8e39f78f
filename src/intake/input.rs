//! What a farmer can send in one turn: text, a file, or both.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

/// A user-supplied file, held only until the turn that consumes it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub name: String,
    pub mime_type: String,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

impl Attachment {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Build an attachment, inferring the MIME type from the file name.
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Self {
        let name = name.into();
        let mime_type = mime_guess::from_path(&name)
            .first_or_octet_stream()
            .to_string();
        Self::new(name, mime_type, data)
    }

    /// Read a file from disk.
    pub async fn read(path: &Path) -> std::io::Result<Self> {
        let data = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        Ok(Self::from_bytes(name, data))
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    /// `data:<mime>;base64,<payload>` form, as vision models expect.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, BASE64.encode(&self.data))
    }

    pub fn meta(&self) -> AttachmentMeta {
        AttachmentMeta {
            name: self.name.clone(),
            mime_type: self.mime_type.clone(),
            size: self.size(),
        }
    }
}

// Bytes stay out of logs.
impl std::fmt::Debug for Attachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attachment")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.size())
            .finish()
    }
}

/// Attachment description kept in the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentMeta {
    pub name: String,
    pub mime_type: String,
    pub size: usize,
}

/// One turn of user input.
#[derive(Debug, Clone, PartialEq)]
pub enum UserInput {
    Text(String),
    File(Attachment),
    Both { text: String, file: Attachment },
}

impl UserInput {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Combine an optional caption and an optional file into one input.
    /// Blank text next to a file is dropped.
    pub fn from_parts(text: impl Into<String>, file: Option<Attachment>) -> Self {
        let text = text.into();
        match file {
            None => Self::Text(text),
            Some(file) if text.trim().is_empty() => Self::File(file),
            Some(file) => Self::Both { text, file },
        }
    }

    /// The text part, empty when only a file was sent.
    pub fn text_part(&self) -> &str {
        match self {
            Self::Text(text) | Self::Both { text, .. } => text,
            Self::File(_) => "",
        }
    }

    pub fn file(&self) -> Option<&Attachment> {
        match self {
            Self::Text(_) => None,
            Self::File(file) | Self::Both { file, .. } => Some(file),
        }
    }
}

mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        BASE64
            .decode(encoded.trim())
            .map_err(serde::de::Error::custom)
    }
}
