use serde::{Deserialize, Serialize};
use tracing::debug;

/// Requests sent to a page session by menus, shortcuts or the popup.
/// Serialized with the same `type` tags the extension's messages use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Command {
    SaveManual,
    JumpToLast,
    ClearMarkers,
    /// The page changed URL without a full reload.
    NavigationChanged { url: String },
}

/// Reader activity reported by the host page.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum ViewportMessage {
    /// `center` is a selector for the element now in the middle of the viewport.
    Scrolled {
        y: f64,
        #[serde(default)]
        center: Option<String>,
    },
    /// `anchor` is a selector for the element holding the selection.
    Selected {
        #[serde(default)]
        anchor: Option<String>,
    },
}

/// Everything a session reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    Command(Command),
    Scrolled { y: f64, center: Option<String> },
    Selected { anchor: Option<String> },
}

impl PageEvent {
    /// Parses one JSON message. Unknown or malformed messages yield `None`.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }

        if let Ok(command) = serde_json::from_str::<Command>(input) {
            return Some(PageEvent::Command(command));
        }

        match serde_json::from_str::<ViewportMessage>(input) {
            Ok(ViewportMessage::Scrolled { y, center }) => Some(PageEvent::Scrolled { y, center }),
            Ok(ViewportMessage::Selected { anchor }) => Some(PageEvent::Selected { anchor }),
            Err(e) => {
                debug!(message = input, "Ignoring unrecognized page message: {}", e);
                None
            }
        }
    }
}

impl From<Command> for PageEvent {
    fn from(command: Command) -> Self {
        PageEvent::Command(command)
    }
}
