//! Inbound command protocol consumed from the orchestrator.

use serde::{Deserialize, Serialize};

use crate::LogicalElementRef;

/// Closed set of actions the core executes. Dispatch is exhaustive pattern
/// matching; unknown action names fail at deserialization time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Command {
    /// Click the referenced element.
    #[serde(rename = "click", rename_all = "camelCase")]
    Click {
        element_id: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        selector_path: Option<String>,
    },

    /// Replace the referenced input's value.
    #[serde(rename = "setValue", rename_all = "camelCase")]
    SetValue {
        element_id: u32,
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        selector_path: Option<String>,
    },
}

impl Command {
    /// Action name used in error reporting and logs.
    pub fn action_name(&self) -> &'static str {
        match self {
            Command::Click { .. } => "click",
            Command::SetValue { .. } => "setValue",
        }
    }

    /// The element index this command targets.
    pub fn element_index(&self) -> u32 {
        match self {
            Command::Click { element_id, .. } => *element_id,
            Command::SetValue { element_id, .. } => *element_id,
        }
    }

    /// Build the logical reference this command targets.
    pub fn element_ref(&self) -> LogicalElementRef {
        let (index, path) = match self {
            Command::Click {
                element_id,
                selector_path,
            } => (*element_id, selector_path.clone()),
            Command::SetValue {
                element_id,
                selector_path,
                ..
            } => (*element_id, selector_path.clone()),
        };
        LogicalElementRef {
            index,
            selector_path: path,
        }
    }
}
