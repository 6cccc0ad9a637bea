use std::collections::{HashMap, HashSet};

use provider_interface::raw::EpisodeRow;

use crate::types::{Episode, StreamSource};

/// Merge scattered (episode, server) rows into one [`Episode`] per name.
///
/// Rows without an episode name are dropped. The first key and sort key seen
/// for a name are kept; later rows only add a server. Servers keep input order
/// and episodes are ordered by sort key as plain strings, so "10" lands before
/// "2". `reference` is left empty for the caller to fill.
pub fn aggregate<I>(rows: I) -> Vec<Episode>
where
    I: IntoIterator<Item = EpisodeRow>,
{
    let mut episodes: Vec<Episode> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for mut row in rows {
        if row.episode_name.is_empty() {
            continue;
        }
        let display_name = std::mem::take(&mut row.episode_name);
        let key = std::mem::take(&mut row.key);
        let sort_key = std::mem::take(&mut row.sort_key);
        let source = StreamSource::from(row);
        match index.get(&display_name) {
            Some(&i) => episodes[i].servers.push(source),
            None => {
                index.insert(display_name.clone(), episodes.len());
                episodes.push(Episode {
                    display_name,
                    key,
                    sort_key,
                    reference: String::new(),
                    servers: vec![source],
                });
            }
        }
    }

    // stable: equal keys keep first-seen order
    episodes.sort_by(|a, b| a.sort_key.cmp(&b.sort_key));
    episodes
}

/// Make every episode key unique within `episodes`, in order. A key already
/// taken falls back to the display name, then to `name#n`.
pub fn assign_unique_keys(episodes: &mut [Episode]) {
    let mut taken: HashSet<String> = HashSet::new();
    for (n, episode) in episodes.iter_mut().enumerate() {
        if episode.key.is_empty() || taken.contains(&episode.key) {
            episode.key = if taken.contains(&episode.display_name) {
                format!("{}#{n}", episode.display_name)
            } else {
                episode.display_name.clone()
            };
        }
        taken.insert(episode.key.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn servers(e: &Episode) -> Vec<(&str, &str)> {
        e.servers
            .iter()
            .map(|s| (s.server_label.as_str(), s.stream_url.as_str()))
            .collect()
    }

    #[test]
    fn groups_mirrors_and_drops_nameless_rows() {
        let rows = vec![
            EpisodeRow::new("E1", "1", "SvA", "u1", false),
            EpisodeRow::new("E1", "1", "SvB", "u2", false),
            EpisodeRow::new("", "1", "SvC", "u3", false),
            EpisodeRow::new("E2", "2", "SvA", "u4", false),
        ];
        let out = aggregate(rows);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].display_name, "E1");
        assert_eq!(servers(&out[0]), vec![("SvA", "u1"), ("SvB", "u2")]);
        assert_eq!(out[1].display_name, "E2");
        assert_eq!(servers(&out[1]), vec![("SvA", "u4")]);
    }

    #[test]
    fn first_sort_key_wins() {
        let rows = vec![
            EpisodeRow::new("Full", "full-a", "SvA", "u1", true).with_sort_key("0"),
            EpisodeRow::new("Full", "full-b", "SvB", "u2", true).with_sort_key("9"),
        ];
        let out = aggregate(rows);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].key, "full-a");
        assert_eq!(out[0].sort_key, "0");
        assert_eq!(out[0].servers.len(), 2);
    }

    #[test]
    fn orders_lexicographically_not_numerically() {
        let rows = vec![
            EpisodeRow::new("Ep 2", "2", "S", "b", true),
            EpisodeRow::new("Ep 10", "10", "S", "c", true),
            EpisodeRow::new("Ep 1", "1", "S", "a", true),
        ];
        let names: Vec<_> = aggregate(rows).into_iter().map(|e| e.display_name).collect();
        assert_eq!(names, vec!["Ep 1", "Ep 10", "Ep 2"]);
    }

    #[test]
    fn servers_interleaved_across_episodes_keep_input_order() {
        let rows = vec![
            EpisodeRow::new("E1", "1", "Vietsub", "v1", true),
            EpisodeRow::new("E2", "2", "Vietsub", "v2", true),
            EpisodeRow::new("E1", "1", "Thuyet minh", "t1", true).with_referer("r"),
        ];
        let out = aggregate(rows);
        assert_eq!(servers(&out[0]), vec![("Vietsub", "v1"), ("Thuyet minh", "t1")]);
        assert_eq!(out[0].servers[1].referer, "r");
        assert!(out[0].servers[0].is_segmented);
    }

    #[test]
    fn orders_by_name_not_by_slug() {
        let rows = vec![
            EpisodeRow::new("10", "tap-10", "S", "b", true),
            EpisodeRow::new("09", "tap-9", "S", "a", true),
        ];
        let out = aggregate(rows);
        let names: Vec<_> = out.iter().map(|e| e.display_name.as_str()).collect();
        assert_eq!(names, vec!["09", "10"]);
        assert_eq!(out[0].key, "tap-9");
    }

    #[test]
    fn shared_keys_fall_back_to_names() {
        let rows = vec![
            EpisodeRow::new("1", "tap", "S", "a", true),
            EpisodeRow::new("2", "tap", "S", "b", true),
            EpisodeRow::new("3", "2", "S", "c", true),
        ];
        let mut out = aggregate(rows);
        assign_unique_keys(&mut out);
        let keys: Vec<_> = out.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["tap", "2", "3"]);
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(aggregate(Vec::new()).is_empty());
        assert!(aggregate(vec![EpisodeRow::new("", "", "S", "u", false)]).is_empty());
    }
}
