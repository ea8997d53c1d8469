use serde::Deserialize;
use serde::Serialize;

/// Closed, ordered risk classification for a gateway operation.
///
/// Ordering matters: callers compare levels (e.g. "at least PROMPT") and the
/// classifier resolves conflicting pattern matches by taking the highest
/// level that matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sensitivity {
    Auto,
    Prompt,
    High,
    Blocked,
}

impl Sensitivity {
    pub fn requires_approval(self) -> bool {
        matches!(self, Sensitivity::Prompt | Sensitivity::High)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Sensitivity::Auto => "auto",
            Sensitivity::Prompt => "prompt",
            Sensitivity::High => "high",
            Sensitivity::Blocked => "blocked",
        }
    }
}

impl std::fmt::Display for Sensitivity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
