use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};

/// Severity of a user-facing notice, mirroring the toast levels a UI would
/// render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

/// Which derived view must be regenerated after a mutation. Rendering is
/// always a full rebuild of the scope from current state, never a patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Cover,
    Days,
    Preview,
    Stats,
    All,
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    Toast { level: NoticeLevel, message: String },
    Rerender(Scope),
}

#[derive(Clone)]
pub struct EventBus {
    tx: Sender<UiEvent>,
}

impl EventBus {
    pub fn new() -> (Self, Receiver<UiEvent>) {
        let (tx, rx) = unbounded();
        (Self { tx }, rx)
    }

    pub fn toast(&self, level: NoticeLevel, message: impl Into<String>) {
        let _ = self.tx.send(UiEvent::Toast {
            level,
            message: message.into(),
        });
    }

    pub fn rerender(&self, scope: Scope) {
        let _ = self.tx.send(UiEvent::Rerender(scope));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_arrive_in_order() {
        let (bus, rx) = EventBus::new();
        bus.toast(NoticeLevel::Error, "bad file");
        bus.rerender(Scope::Days);

        match rx.try_recv().unwrap() {
            UiEvent::Toast { level, message } => {
                assert_eq!(level, NoticeLevel::Error);
                assert_eq!(message, "bad file");
            }
            other => panic!("Expected toast, got {other:?}"),
        }
        match rx.try_recv().unwrap() {
            UiEvent::Rerender(scope) => assert_eq!(scope, Scope::Days),
            other => panic!("Expected rerender, got {other:?}"),
        }
    }

    #[test]
    fn send_without_receiver_does_not_panic() {
        let (bus, rx) = EventBus::new();
        drop(rx);
        bus.toast(NoticeLevel::Success, "ignored");
        bus.rerender(Scope::All);
    }
}
