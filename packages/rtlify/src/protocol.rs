//! JSON command protocol
//!
//! Other contexts (a settings page, a popup) control an engine by sending single JSON
//! requests such as `{"action": "getStats"}`. Every request gets exactly one reply of the
//! shape `{"success": bool, "stats"?: Stats, "error"?: string}`.

use serde::{Deserialize, Serialize};

use crate::{Engine, Stats};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Command {
    Enable,
    Disable,
    GetStats,
    Rescan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<Stats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    pub fn ok() -> Self {
        Self {
            success: true,
            stats: None,
            error: None,
        }
    }

    pub fn with_stats(stats: Stats) -> Self {
        Self {
            stats: Some(stats),
            ..Self::ok()
        }
    }

    pub fn failure(error: impl ToString) -> Self {
        Self {
            success: false,
            stats: None,
            error: Some(error.to_string()),
        }
    }
}

/// Apply a command to the engine of the receiving context, if it has one
pub fn dispatch(engine: Option<&mut Engine>, command: Command) -> Response {
    let Some(engine) = engine else {
        return Response::failure("No engine in this context");
    };

    let result = match command {
        Command::Enable => engine.enable().map(|()| Response::ok()),
        Command::Disable => engine.disable().map(|()| Response::ok()),
        Command::GetStats => engine.stats().map(Response::with_stats),
        Command::Rescan => engine.rescan().map(|_| Response::ok()),
    };
    result.unwrap_or_else(|err| {
        tracing::debug!("Command {command:?} failed: {err}");
        Response::failure(err)
    })
}

/// Parse a JSON request, dispatch it and serialize the reply
pub fn dispatch_json(engine: Option<&mut Engine>, request: &str) -> String {
    let response = match serde_json::from_str::<Command>(request) {
        Ok(command) => dispatch(engine, command),
        Err(err) => Response::failure(format!("Malformed request: {err}")),
    };
    serde_json::to_string(&response)
        .unwrap_or_else(|_| r#"{"success":false,"error":"Unserializable reply"}"#.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_wire_format() {
        let command: Command = serde_json::from_str(r#"{"action":"getStats"}"#).unwrap();
        assert_eq!(command, Command::GetStats);
        assert_eq!(
            serde_json::to_string(&Command::Rescan).unwrap(),
            r#"{"action":"rescan"}"#
        );
        assert!(serde_json::from_str::<Command>(r#"{"action":"explode"}"#).is_err());
    }

    #[test]
    fn test_response_omits_empty_fields() {
        assert_eq!(serde_json::to_string(&Response::ok()).unwrap(), r#"{"success":true}"#);
        assert_eq!(
            serde_json::to_string(&Response::failure("nope")).unwrap(),
            r#"{"success":false,"error":"nope"}"#
        );
    }

    #[test]
    fn test_missing_engine_fails() {
        let reply = dispatch_json(None, r#"{"action":"rescan"}"#);
        let reply: Response = serde_json::from_str(&reply).unwrap();
        assert!(!reply.success);
        assert!(reply.error.is_some());
    }
}
