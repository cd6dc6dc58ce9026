use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Parameters of a creation or re-entry invocation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LaunchRequest {
    /// Address to show.
    pub url: Option<String>,
    /// Extra switches and arguments; honored only at the first creation.
    pub command_line: Option<Vec<String>>,
    /// Debug action offered to the UI before anything else.
    pub debug_action: Option<String>,
}

impl LaunchRequest {
    /// Request that only carries a URL.
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// URL if present and non-empty.
    pub fn non_empty_url(&self) -> Option<&str> {
        self.url.as_deref().filter(|u| !u.is_empty())
    }
}

/// State persisted across suspend/restore of the UI unit.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedState {
    /// Address of the active view.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_url: Option<String>,
    /// Opaque window state owned by the UI.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub window: BTreeMap<String, String>,
}

impl SavedState {
    /// Serializes to JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Parses from JSON.
    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saved_state_json_shape() {
        let mut state = SavedState {
            active_url: Some("http://example.test/".into()),
            ..SavedState::default()
        };
        state.window.insert("zoom".into(), "1.5".into());

        let json = state.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["active_url"], "http://example.test/");
        assert_eq!(value["window"]["zoom"], "1.5");

        assert_eq!(SavedState::from_json(&json).unwrap(), state);
    }

    #[test]
    fn test_empty_saved_state_parses_from_empty_object() {
        assert_eq!(SavedState::from_json("{}").unwrap(), SavedState::default());
    }

    #[test]
    fn test_empty_url_is_treated_as_absent() {
        assert_eq!(LaunchRequest::with_url("").non_empty_url(), None);
        assert_eq!(LaunchRequest::with_url("a").non_empty_url(), Some("a"));
    }
}
