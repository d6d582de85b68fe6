use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StartSandboxResponse {
    Started {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
    Failed {
        error: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExecuteSandboxRequest {
    pub session_id: Option<String>,
    pub command: Option<String>,
}

impl ExecuteSandboxRequest {
    pub fn new(session_id: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            session_id: Some(session_id.into()),
            command: Some(command.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExecuteSandboxResponse {
    Output { output: String },
    Failed { error: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StopSandboxRequest {
    pub session_id: Option<String>,
}

impl StopSandboxRequest {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: Some(session_id.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopSandboxResponse {
    pub message: String,
}
