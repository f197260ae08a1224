use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::context::CommandInfo;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub status: CommandStatus,
    pub message: String,
    #[serde(default)]
    pub details: Value,
}

impl ExecutionOutcome {
    pub fn success(message: impl Into<String>, details: Value) -> Self {
        Self {
            status: CommandStatus::Ok,
            message: message.into(),
            details,
        }
    }

    pub fn failure(message: impl Into<String>, details: Value) -> Self {
        Self {
            status: CommandStatus::Failure,
            message: message.into(),
            details,
        }
    }

    pub fn user_error(message: impl Into<String>, details: Value) -> Self {
        Self {
            status: CommandStatus::UserError,
            message: message.into(),
            details,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CommandStatus {
    Ok,
    UserError,
    Failure,
}

impl CommandStatus {
    #[must_use]
    pub fn exit_code(self) -> i32 {
        match self {
            CommandStatus::Ok => 0,
            CommandStatus::UserError => 1,
            CommandStatus::Failure => 2,
        }
    }
}

#[must_use]
pub fn to_json_response(info: CommandInfo, outcome: &ExecutionOutcome) -> Value {
    let status = match outcome.status {
        CommandStatus::Ok => "ok",
        CommandStatus::UserError => "user-error",
        CommandStatus::Failure => "error",
    };
    let details = match &outcome.details {
        Value::Object(_) => outcome.details.clone(),
        Value::Null => json!({}),
        other => json!({ "value": other }),
    };
    json!({
        "status": status,
        "message": format_status_message(info, &outcome.message),
        "details": details,
    })
}

#[must_use]
pub fn format_status_message(info: CommandInfo, message: &str) -> String {
    let prefix = format!("repkg {}", info.name);
    if message.is_empty() {
        prefix
    } else if message.starts_with(&prefix) {
        message.to_string()
    } else {
        format!("{prefix}: {message}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::context::CommandGroup;

    #[test]
    fn json_response_wraps_non_object_details() {
        let info = CommandInfo::new(CommandGroup::Reinstall, "reinstall");
        let outcome = ExecutionOutcome::failure("boom", json!("raw"));
        let payload = to_json_response(info, &outcome);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["message"], "repkg reinstall: boom");
        assert_eq!(payload["details"]["value"], "raw");
    }

    #[test]
    fn status_message_is_not_prefixed_twice() {
        let info = CommandInfo::new(CommandGroup::Install, "install");
        assert_eq!(
            format_status_message(info, "repkg install: done"),
            "repkg install: done"
        );
        assert_eq!(format_status_message(info, ""), "repkg install");
    }
}
