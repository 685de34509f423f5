use tokio::sync::mpsc::{self, error::TryRecvError};

use crate::state::arbiter::ButtonFrame;

/// Non-blocking source of controller frames.
pub trait ControllerInput: Send {
    /// Next pending frame, or `None` when nothing is available right now.
    fn poll(&mut self) -> Option<ButtonFrame>;

    /// Whether the source will never produce another frame.
    fn is_closed(&self) -> bool {
        false
    }
}

/// Input fed through a channel, used by the virtual controllers.
pub struct ChannelInput {
    receiver: mpsc::UnboundedReceiver<ButtonFrame>,
    closed: bool,
}

impl ChannelInput {
    /// Create the input together with the sender that feeds it.
    pub fn new() -> (mpsc::UnboundedSender<ButtonFrame>, Self) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            sender,
            Self {
                receiver,
                closed: false,
            },
        )
    }
}

impl ControllerInput for ChannelInput {
    fn poll(&mut self) -> Option<ButtonFrame> {
        match self.receiver.try_recv() {
            Ok(frame) => Some(frame),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.closed = true;
                None
            }
        }
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::arbiter::{Button, single_press};

    #[test]
    fn frames_come_out_in_order() {
        let (tx, mut input) = ChannelInput::new();
        assert_eq!(input.poll(), None);

        tx.send(single_press(1, Button::Red)).unwrap();
        tx.send(ButtonFrame::default()).unwrap();
        assert_eq!(input.poll(), Some(single_press(1, Button::Red)));
        assert_eq!(input.poll(), Some(ButtonFrame::default()));
        assert_eq!(input.poll(), None);
        assert!(!input.is_closed());

        drop(tx);
        assert_eq!(input.poll(), None);
        assert!(input.is_closed());
    }
}
