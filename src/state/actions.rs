/// Presentation cues raised by the last unit of work (command or admitted buzz).
///
/// The flags are cleared together before each unit of work, so a consumer only ever sees the
/// cues caused by the latest change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionSignals {
    pub play_correct_sound: bool,
    pub play_wrong_sound: bool,
    pub play_start_accepting: bool,
    pub play_buzzer_sound: bool,
    pub play_end_sound: bool,
    pub stop_timer: bool,
    pub show_split_or_steal: bool,
}

impl ActionSignals {
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_resets_every_flag() {
        let mut actions = ActionSignals {
            play_correct_sound: true,
            play_end_sound: true,
            stop_timer: true,
            show_split_or_steal: true,
            ..Default::default()
        };
        actions.clear();
        assert_eq!(actions, ActionSignals::default());
    }
}
