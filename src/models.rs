use serde::{Deserialize, Serialize};

/// A listed file and the absolute URL it can be downloaded from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub name: String,
    pub url: String,
}

/// Response body shared by every operation that touches the store.
/// `file_infos` always holds the listing read after the operation ran.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payload {
    pub message: Option<String>,
    pub messages: Option<Vec<String>>,
    pub file_infos: Vec<FileRecord>,
}

impl Payload {
    pub fn message(message: impl Into<String>, file_infos: Vec<FileRecord>) -> Self {
        Self {
            message: Some(message.into()),
            messages: None,
            file_infos,
        }
    }

    pub fn messages(messages: Vec<String>, file_infos: Vec<FileRecord>) -> Self {
        Self {
            message: None,
            messages: Some(messages),
            file_infos,
        }
    }

    pub fn listing(file_infos: Vec<FileRecord>) -> Self {
        Self {
            file_infos,
            ..Self::default()
        }
    }
}
