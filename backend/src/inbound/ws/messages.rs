//! Wire-level frames pushed to WebSocket clients.
//!
//! Change events are sent as
//! `{ "event": "INSERT", "schema": "public", "table": .., "record": {..} }`.

use serde::Serialize;
use serde_json::Value;

use crate::domain::ports::MatchResult;
use crate::domain::{ChangeEvent, Error, FeedNotice, LiveSnapshot, RefreshTrigger};

const SCHEMA: &str = "public";

/// A committed row change.
#[derive(Debug, Serialize)]
pub struct ChangeEnvelope {
    pub event: &'static str,
    pub schema: &'static str,
    pub table: &'static str,
    pub record: Value,
}

impl From<ChangeEvent> for ChangeEnvelope {
    fn from(event: ChangeEvent) -> Self {
        Self {
            event: event.operation.as_str(),
            schema: SCHEMA,
            table: event.table.as_str(),
            record: event.record,
        }
    }
}

/// Out-of-band feed state: `reconnected`, `lagged` or `lost`.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct NoticeFrame {
    pub notice: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<u64>,
}

impl NoticeFrame {
    pub const fn reconnected() -> Self {
        Self {
            notice: "reconnected",
            skipped: None,
        }
    }

    pub const fn lagged(skipped: u64) -> Self {
        Self {
            notice: "lagged",
            skipped: Some(skipped),
        }
    }

    pub const fn lost() -> Self {
        Self {
            notice: "lost",
            skipped: None,
        }
    }
}

/// What the session should push for one feed notice.
#[derive(Debug)]
pub enum FeedFrame {
    Change(ChangeEnvelope),
    Notice(NoticeFrame),
}

impl From<FeedNotice> for FeedFrame {
    fn from(notice: FeedNotice) -> Self {
        match notice {
            FeedNotice::Change(event) => Self::Change(event.into()),
            FeedNotice::Reconnected => Self::Notice(NoticeFrame::reconnected()),
            FeedNotice::Lagged { skipped } => Self::Notice(NoticeFrame::lagged(skipped)),
            FeedNotice::Lost => Self::Notice(NoticeFrame::lost()),
        }
    }
}

/// One refreshed match list, or the error the refresh produced.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSnapshotFrame {
    pub revision: u64,
    pub trigger: &'static str,
    #[serde(flatten)]
    pub outcome: MatchOutcome,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum MatchOutcome {
    Matches(MatchResult),
    Failed { error: Error },
}

fn trigger_label(trigger: RefreshTrigger) -> &'static str {
    match trigger {
        RefreshTrigger::Initial => "initial",
        RefreshTrigger::Change => "change",
        RefreshTrigger::Resync => "resync",
        RefreshTrigger::Poll => "poll",
    }
}

impl From<LiveSnapshot<MatchResult>> for MatchSnapshotFrame {
    fn from(snapshot: LiveSnapshot<MatchResult>) -> Self {
        Self {
            revision: snapshot.revision,
            trigger: trigger_label(snapshot.trigger),
            outcome: match snapshot.result {
                Ok(matches) => MatchOutcome::Matches(matches),
                Err(error) => MatchOutcome::Failed { error },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChangeOperation, Table};
    use insta::assert_json_snapshot;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn change_events_use_the_wire_envelope() {
        let event = ChangeEvent::new(
            Table::BloodRequests,
            ChangeOperation::Insert,
            json!({ "id": "r-1", "status": "pending" }),
        );

        let FeedFrame::Change(envelope) = FeedFrame::from(FeedNotice::Change(event)) else {
            panic!("expected a change frame");
        };
        assert_json_snapshot!(envelope, @r#"
        {
          "event": "INSERT",
          "schema": "public",
          "table": "blood_requests",
          "record": {
            "id": "r-1",
            "status": "pending"
          }
        }
        "#);
    }

    #[rstest]
    #[case(FeedNotice::Reconnected, json!({ "notice": "reconnected" }))]
    #[case(FeedNotice::Lagged { skipped: 3 }, json!({ "notice": "lagged", "skipped": 3 }))]
    #[case(FeedNotice::Lost, json!({ "notice": "lost" }))]
    fn notices_serialize_compactly(#[case] notice: FeedNotice, #[case] expected: Value) {
        let FeedFrame::Notice(frame) = FeedFrame::from(notice) else {
            panic!("expected a notice frame");
        };
        assert_eq!(serde_json::to_value(frame).expect("serializes"), expected);
    }

    #[rstest]
    fn failed_snapshots_carry_the_error() {
        let frame = MatchSnapshotFrame::from(LiveSnapshot {
            revision: 2,
            trigger: RefreshTrigger::Poll,
            result: Err(Error::service_unavailable("store offline")),
        });

        let value = serde_json::to_value(frame).expect("serializes");
        assert_eq!(value["revision"], 2);
        assert_eq!(value["trigger"], "poll");
        assert_eq!(value["error"]["code"], "service_unavailable");
        assert!(value.get("local").is_none());
    }

    #[rstest]
    fn successful_snapshots_flatten_both_partitions() {
        let frame = MatchSnapshotFrame::from(LiveSnapshot {
            revision: 0,
            trigger: RefreshTrigger::Initial,
            result: Ok(MatchResult::default()),
        });

        assert_json_snapshot!(frame, @r#"
        {
          "revision": 0,
          "trigger": "initial",
          "local": [],
          "other": []
        }
        "#);
    }
}
