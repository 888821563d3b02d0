//! WebSocket message types.
//!
//! Every frame a viewer receives is one JSON-encoded [`RoomEvent`].

use serde::{Deserialize, Serialize};

use crate::slide::{OptionTally, Slide, Tally};

// ============================================================================
// Events (Server -> Client)
// ============================================================================

/// Events pushed to the members of a presentation room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoomEvent {
    /// Sent once, right after the socket joined its room.
    Connected { room_id: String },

    /// Vote counts of a poll after a vote landed.
    TallyUpdated {
        presentation_id: i64,
        content_id: i64,
        options: Vec<OptionTally>,
    },

    /// A slide was created or edited.
    SlideUpdated {
        presentation_id: i64,
        slide: serde_json::Value,
    },

    SlideDeleted { presentation_id: i64, slide_id: i64 },
}

impl RoomEvent {
    pub fn tally(tally: Tally) -> Self {
        RoomEvent::TallyUpdated {
            presentation_id: tally.presentation_id,
            content_id: tally.content_id,
            options: tally.options,
        }
    }

    pub fn slide_updated(slide: &Slide) -> serde_json::Result<Self> {
        Ok(RoomEvent::SlideUpdated {
            presentation_id: slide.presentation_id,
            slide: serde_json::to_value(slide)?,
        })
    }

    /// Encode as the text frame payload.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tally_event_shape() {
        let event = RoomEvent::tally(Tally {
            presentation_id: 1,
            content_id: 7,
            options: vec![OptionTally {
                id: 3,
                name: "Yes".to_string(),
                total_votes: 2,
            }],
        });
        let value: serde_json::Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "tally_updated",
                "presentation_id": 1,
                "content_id": 7,
                "options": [{"id": 3, "name": "Yes", "total_votes": 2}]
            })
        );
    }

    #[test]
    fn test_connected_event_shape() {
        let text = RoomEvent::Connected {
            room_id: "12".to_string(),
        }
        .to_json()
        .unwrap();
        assert_eq!(text, r#"{"type":"connected","room_id":"12"}"#);
    }
}
