use super::snapshot::{Snapshot, WatchKind};
use crate::store::PersistedHash;

/// A watched field whose value differs from the stored snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub field: &'static str,
    pub label: &'static str,
    pub old: String,
    pub new: String,
}

impl ChangeEvent {
    /// The alert sentence for this change.
    pub fn describe(&self) -> String {
        let Self { label, old, new, .. } = self;
        format!("{label} changed from `{old}` to `{new}`")
    }
}

/// Boolean text as accepted by Go's `strconv.ParseBool`, which is what other
/// readers of the store use.
pub fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Compares the watched fields of `current` against `previous`.
///
/// Fields missing from `previous` compare as empty text, so the first
/// snapshot ever seen reports its text fields as changed. A stored boolean
/// that does not parse is logged and skipped; it becomes the baseline once a
/// parsable value has been written over it.
pub fn diff<S: Snapshot>(current: &S, previous: &PersistedHash) -> Vec<ChangeEvent> {
    let mut events = Vec::new();

    for watch in S::WATCHED {
        let Some(new) = current.value_of(watch.field) else {
            log::error!(
                "{} watches unknown field {}, skipping",
                S::HASH_NAME, watch.field
            );
            continue;
        };
        let old = previous.get(watch.field).map(String::as_str).unwrap_or("");

        let old = match watch.kind {
            WatchKind::Text if old == new => continue,
            WatchKind::Text => old.to_string(),
            WatchKind::Bool => match parse_bool(old) {
                None => {
                    log::error!(
                        "Stored {}.{} is not a boolean: {old:?}, skipping comparison",
                        S::HASH_NAME, watch.field
                    );
                    continue;
                }
                Some(old) if Some(old) == parse_bool(&new) => continue,
                Some(old) => old.to_string(),
            },
        };

        log::debug!(
            "{}.{} changed from {old:?} to {new:?}",
            S::HASH_NAME, watch.field
        );
        events.push(ChangeEvent {
            field: watch.field,
            label: watch.label,
            old,
            new,
        });
    }

    events
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::watcher::model::{ContainerSnapshot, GameStateSnapshot};

    fn container(state: &str) -> ContainerSnapshot {
        ContainerSnapshot {
            id: "abc123".to_string(),
            state: state.to_string(),
            status: "Up 2 hours".to_string(),
            ..Default::default()
        }
    }

    fn game_state(session: &str, running: bool, paused: bool) -> GameStateSnapshot {
        GameStateSnapshot {
            active_session_name: session.to_string(),
            tech_tier: 2,
            total_game_duration: Duration::from_secs(600),
            num_connected_players: 1,
            player_limit: 4,
            is_game_running: running,
            is_game_paused: paused,
        }
    }

    fn hash(entries: &[(&str, &str)]) -> PersistedHash {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_state_change() {
        let events = diff(&container("running"), &hash(&[("State", "exited")]));
        assert_eq!(
            events,
            vec![ChangeEvent {
                field: "State",
                label: "Server state",
                old: "exited".to_string(),
                new: "running".to_string(),
            }]
        );
        assert_eq!(
            events[0].describe(),
            "Server state changed from `exited` to `running`"
        );
    }

    #[test]
    fn test_only_watched_fields_raise_events() {
        let previous = hash(&[
            ("State", "running"),
            ("Status", "Up 1 minute"),
            ("ID", "old"),
        ]);
        assert!(diff(&container("running"), &previous).is_empty());
    }

    #[test]
    fn test_unchanged_store_is_idempotent() {
        let snapshot = game_state("Factory", true, false);
        let previous = snapshot.to_hash();
        assert!(diff(&snapshot, &previous).is_empty());
        assert!(diff(&snapshot, &previous).is_empty());

        let snapshot = container("running");
        let previous = snapshot.to_hash();
        assert!(diff(&snapshot, &previous).is_empty());
    }

    #[test]
    fn test_first_observation_reports_text_fields_only() {
        let events = diff(&game_state("Factory", true, false), &PersistedHash::new());
        assert_eq!(
            events,
            vec![ChangeEvent {
                field: "ActiveSessionName",
                label: "Active session name",
                old: String::new(),
                new: "Factory".to_string(),
            }]
        );

        let events = diff(&container("running"), &PersistedHash::new());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].old, "");
    }

    #[test]
    fn test_each_changed_field_yields_one_event_in_order() {
        let previous = game_state("Old", false, true).to_hash();
        let events = diff(&game_state("New", true, false), &previous);

        let fields: Vec<_> = events.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            ["ActiveSessionName", "IsGameRunning", "IsGamePaused"]
        );
        assert_eq!(events[1].old, "false");
        assert_eq!(events[1].new, "true");
        assert_eq!(
            events[2].describe(),
            "Game paused changed from `true` to `false`"
        );
    }

    #[test]
    fn test_unparsable_stored_bool_is_skipped() {
        // Assumption: an unparsable stored value is never compared later on;
        // the next persisted value becomes the baseline.
        let previous = hash(&[
            ("ActiveSessionName", "Factory"),
            ("IsGameRunning", "notabool"),
            ("IsGamePaused", "true"),
        ]);
        let events = diff(&game_state("Factory", true, false), &previous);
        assert_eq!(
            events,
            vec![ChangeEvent {
                field: "IsGamePaused",
                label: "Game paused",
                old: "true".to_string(),
                new: "false".to_string(),
            }]
        );
    }

    #[test]
    fn test_go_style_stored_bools() {
        let previous = hash(&[
            ("ActiveSessionName", "Factory"),
            ("IsGameRunning", "1"),
            ("IsGamePaused", "F"),
        ]);
        let events = diff(&game_state("Factory", true, false), &previous);
        assert!(events.is_empty());
    }

    #[test]
    fn test_parse_bool() {
        for text in ["1", "t", "T", "TRUE", "true", "True"] {
            assert_eq!(parse_bool(text), Some(true), "{text}");
        }
        for text in ["0", "f", "F", "FALSE", "false", "False"] {
            assert_eq!(parse_bool(text), Some(false), "{text}");
        }
        for text in ["", "yes", "tRUE", " true", "notabool"] {
            assert_eq!(parse_bool(text), None, "{text:?}");
        }
    }
}
