use serde::Deserialize;

use crate::types::ContentType;

/// Words that mark a status label as a finished single release, and a
/// duration label as episodic. Matched case-insensitively as substrings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Markers {
    #[serde(default = "default_completed")]
    pub completed: Vec<String>,
    #[serde(default = "default_episodic")]
    pub episodic: Vec<String>,
}

impl Default for Markers {
    fn default() -> Self {
        Self { completed: default_completed(), episodic: default_episodic() }
    }
}

fn default_completed() -> Vec<String> {
    vec!["full".to_string()]
}

fn default_episodic() -> Vec<String> {
    vec!["episode".to_string(), "tập".to_string()]
}

fn mentions(label: &str, markers: &[String]) -> bool {
    if label.is_empty() {
        return false;
    }
    let label = label.to_lowercase();
    markers
        .iter()
        .filter(|m| !m.is_empty())
        .any(|m| label.contains(&m.to_lowercase()))
}

/// Classify with the default markers.
pub fn classify(episode_count: usize, duration_label: &str, status_label: &str) -> ContentType {
    classify_with(&Markers::default(), episode_count, duration_label, status_label)
}

/// First rule that matches wins: completed status, more than one episode,
/// episodic duration, otherwise a movie.
pub fn classify_with(
    markers: &Markers,
    episode_count: usize,
    duration_label: &str,
    status_label: &str,
) -> ContentType {
    if mentions(status_label, &markers.completed) {
        ContentType::Movie
    } else if episode_count > 1 {
        ContentType::Series
    } else if mentions(duration_label, &markers.episodic) {
        ContentType::Series
    } else {
        ContentType::Movie
    }
}
