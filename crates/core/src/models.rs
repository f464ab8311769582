use providers::{MatchPayload, SearchResponse};
use serde::{Deserialize, Serialize};

pub const UNKNOWN_APPLICATION: &str = "Unknown";

/// One search hit. Immutable once built from the response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub image_path: String,
    pub application_name: String,
    pub timestamp: String,
    pub distance: f64,
}

impl MatchRecord {
    pub fn display_name(&self) -> &str {
        if self.application_name.trim().is_empty() {
            UNKNOWN_APPLICATION
        } else {
            &self.application_name
        }
    }

    pub fn alt_text(&self) -> String {
        format!("Screenshot from {}", self.display_name())
    }

    /// Key used to request the image bytes; see [`resource_key`].
    pub fn resource_key(&self) -> Option<&str> {
        resource_key(&self.image_path)
    }
}

impl From<MatchPayload> for MatchRecord {
    fn from(p: MatchPayload) -> Self {
        Self {
            image_path: p.image_path,
            application_name: p.application_name,
            timestamp: p.timestamp,
            distance: p.distance,
        }
    }
}

/// The final path segment of an image path. Image paths are opaque server
/// identifiers, so both separators are honoured and nothing is resolved
/// against the local filesystem.
pub fn resource_key(image_path: &str) -> Option<&str> {
    image_path
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .filter(|key| !key.is_empty())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    pub query_text: String,
    matches: Vec<MatchRecord>,
}

impl ResultSet {
    /// Matches are stably ordered by ascending distance; a response the
    /// server already sorted keeps its order.
    pub fn new(query_text: impl Into<String>, mut matches: Vec<MatchRecord>) -> Self {
        matches.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        Self {
            query_text: query_text.into(),
            matches,
        }
    }

    pub fn matches(&self) -> &[MatchRecord] {
        &self.matches
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&MatchRecord> {
        self.matches.get(index)
    }

    /// Image paths in display order; this is the viewer's navigable sequence.
    pub fn image_paths(&self) -> Vec<String> {
        self.matches.iter().map(|m| m.image_path.clone()).collect()
    }
}

impl From<SearchResponse> for ResultSet {
    fn from(resp: SearchResponse) -> Self {
        ResultSet::new(
            resp.text_query,
            resp.image_list_with_metadata
                .into_iter()
                .map(MatchRecord::from)
                .collect(),
        )
    }
}
