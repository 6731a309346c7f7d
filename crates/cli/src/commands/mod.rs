pub mod doctor;
pub mod migrate;

use serde::Serialize;

/// Failure categories with stable process exit codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    ConfigValidation,
    RuntimeInit,
    DbConnectivity,
    Migration,
}

impl ErrorClass {
    pub fn exit_code(self) -> u8 {
        match self {
            Self::ConfigValidation => 2,
            Self::RuntimeInit => 3,
            Self::DbConnectivity => 4,
            Self::Migration => 5,
        }
    }
}

/// Printed output plus the process exit code for one command invocation.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome<'a> {
    command: &'a str,
    status: &'static str,
    error_class: Option<ErrorClass>,
    message: String,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let outcome =
            CommandOutcome { command, status: "ok", error_class: None, message: message.into() };
        Self { exit_code: 0, output: render(&outcome) }
    }

    pub fn failure(command: &str, class: ErrorClass, message: impl Into<String>) -> Self {
        let outcome = CommandOutcome {
            command,
            status: "error",
            error_class: Some(class),
            message: message.into(),
        };
        Self { exit_code: class.exit_code(), output: render(&outcome) }
    }

    pub fn from_outcome(command: &str, outcome: Result<String, (ErrorClass, String)>) -> Self {
        match outcome {
            Ok(message) => Self::success(command, message),
            Err((class, message)) => Self::failure(command, class, message),
        }
    }
}

fn render(outcome: &CommandOutcome<'_>) -> String {
    serde_json::to_string(outcome).unwrap_or_else(|error| {
        serde_json::json!({
            "command": outcome.command,
            "status": "error",
            "error_class": "serialization",
            "message": error.to_string(),
        })
        .to_string()
    })
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::{CommandResult, ErrorClass};

    #[test]
    fn failure_carries_class_and_exit_code() {
        let result = CommandResult::failure("migrate", ErrorClass::DbConnectivity, "unreachable");
        let payload: Value = serde_json::from_str(&result.output).expect("json");

        assert_eq!(result.exit_code, 4);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "db_connectivity");
        assert_eq!(payload["message"], "unreachable");
    }

    #[test]
    fn exit_codes_are_distinct_and_non_zero() {
        let codes: Vec<u8> = [
            ErrorClass::ConfigValidation,
            ErrorClass::RuntimeInit,
            ErrorClass::DbConnectivity,
            ErrorClass::Migration,
        ]
        .into_iter()
        .map(ErrorClass::exit_code)
        .collect();

        assert_eq!(codes, [2, 3, 4, 5]);
    }

    #[test]
    fn from_outcome_maps_ok_to_success() {
        let result = CommandResult::from_outcome("migrate", Ok("done".to_string()));
        let payload: Value = serde_json::from_str(&result.output).expect("json");

        assert_eq!(result.exit_code, 0);
        assert_eq!(payload["error_class"], Value::Null);
    }
}
