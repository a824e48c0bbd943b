use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Logging detail for a client configuration.
///
/// `Request*` levels only cover the outgoing side, `Answer*` levels only the
/// response side, `Min`/`Max` cover both. The `*Max` variants add bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DebugLevel {
    #[default]
    None,
    RequestMin,
    RequestMax,
    AnswerMin,
    AnswerMax,
    Min,
    Max,
}

impl DebugLevel {
    pub const ALL: [DebugLevel; 7] = [
        DebugLevel::None,
        DebugLevel::RequestMin,
        DebugLevel::RequestMax,
        DebugLevel::AnswerMin,
        DebugLevel::AnswerMax,
        DebugLevel::Min,
        DebugLevel::Max,
    ];

    /// Whether method, URL and send time are logged for each attempt.
    pub fn logs_request(self) -> bool {
        matches!(
            self,
            DebugLevel::RequestMin | DebugLevel::RequestMax | DebugLevel::Min | DebugLevel::Max
        )
    }

    pub fn logs_request_body(self) -> bool {
        matches!(self, DebugLevel::RequestMax | DebugLevel::Max)
    }

    /// Whether elapsed time, status and reason are logged for each response.
    pub fn logs_answer(self) -> bool {
        matches!(
            self,
            DebugLevel::AnswerMin | DebugLevel::AnswerMax | DebugLevel::Min | DebugLevel::Max
        )
    }

    pub fn logs_answer_body(self) -> bool {
        matches!(self, DebugLevel::AnswerMax | DebugLevel::Max)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DebugLevel::None => "NONE",
            DebugLevel::RequestMin => "REQUEST_MIN",
            DebugLevel::RequestMax => "REQUEST_MAX",
            DebugLevel::AnswerMin => "ANSWER_MIN",
            DebugLevel::AnswerMax => "ANSWER_MAX",
            DebugLevel::Min => "MIN",
            DebugLevel::Max => "MAX",
        }
    }
}

impl fmt::Display for DebugLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DebugLevel {
    type Err = anyhow::Error;

    /// Accepts `REQUEST_MAX`, `request_max` and `request-max`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        DebugLevel::ALL
            .into_iter()
            .find(|level| level.as_str() == normalized)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Invalid debug level '{}'. Expected one of: none, request-min, request-max, answer-min, answer-max, min, max.",
                    s
                )
            })
    }
}
