//! Interpretation of the agent's JSON log records.

use serde::Deserialize;

const STARTED_TUNNEL: &str = "started tunnel";

#[derive(Debug, Deserialize)]
struct AgentRecord {
    #[serde(default)]
    lvl: String,
    #[serde(default)]
    msg: String,
    url: Option<String>,
    err: Option<String>,
}

/// What a single log line means to the launcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AgentEvent {
    TunnelStarted { url: String },
    Failed { message: String },
    /// The log stream ended.
    Exited,
    Other,
}

pub(crate) fn parse_agent_line(line: &str) -> AgentEvent {
    let Ok(record) = serde_json::from_str::<AgentRecord>(line) else {
        return AgentEvent::Other;
    };
    if matches!(record.lvl.as_str(), "eror" | "crit") {
        let message = match record.err {
            Some(err) if !err.is_empty() && err != "<nil>" => err,
            _ => record.msg,
        };
        return AgentEvent::Failed { message };
    }
    match record.url {
        Some(url) if record.msg == STARTED_TUNNEL => AgentEvent::TunnelStarted { url },
        _ => AgentEvent::Other,
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn started_tunnel_record_carries_url() {
        let line = r#"{"addr":"http://localhost:3000","lvl":"info","msg":"started tunnel","name":"command_line","obj":"tunnels","url":"https://a1b2.ngrok-free.app"}"#;
        assert_eq!(
            parse_agent_line(line),
            AgentEvent::TunnelStarted {
                url: String::from("https://a1b2.ngrok-free.app"),
            }
        );
    }

    #[rstest]
    #[case(
        r#"{"lvl":"eror","msg":"session closing","err":"authentication failed: invalid token"}"#,
        "authentication failed: invalid token"
    )]
    #[case(r#"{"lvl":"crit","msg":"command failed","err":"<nil>"}"#, "command failed")]
    fn error_records_fail_with_reported_cause(#[case] line: &str, #[case] expected: &str) {
        assert_eq!(
            parse_agent_line(line),
            AgentEvent::Failed {
                message: expected.to_owned(),
            }
        );
    }

    #[rstest]
    #[case("not json at all")]
    #[case(r#"{"lvl":"info","msg":"client session established"}"#)]
    #[case(r#"{"lvl":"info","msg":"update available","url":"https://ngrok.com/download"}"#)]
    fn unrelated_lines_are_ignored(#[case] line: &str) {
        assert_eq!(parse_agent_line(line), AgentEvent::Other);
    }
}
