use winit::keyboard::KeyCode;

/// A navigation command decoded from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavAction {
    NextSlide,
    PreviousSlide,
    /// Zero-based slide index; number row keys are one-based on the keycap.
    SelectSlide(usize),
    GoHome,
}

/// Maps a pressed key to its navigation command, if it has one.
pub fn nav_action(key: KeyCode) -> Option<NavAction> {
    let action = match key {
        KeyCode::ArrowRight => NavAction::NextSlide,
        KeyCode::ArrowLeft => NavAction::PreviousSlide,
        KeyCode::Escape | KeyCode::Home => NavAction::GoHome,
        KeyCode::Digit1 => NavAction::SelectSlide(0),
        KeyCode::Digit2 => NavAction::SelectSlide(1),
        KeyCode::Digit3 => NavAction::SelectSlide(2),
        KeyCode::Digit4 => NavAction::SelectSlide(3),
        KeyCode::Digit5 => NavAction::SelectSlide(4),
        KeyCode::Digit6 => NavAction::SelectSlide(5),
        KeyCode::Digit7 => NavAction::SelectSlide(6),
        KeyCode::Digit8 => NavAction::SelectSlide(7),
        KeyCode::Digit9 => NavAction::SelectSlide(8),
        _ => return None,
    };
    Some(action)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrows_step_between_slides() {
        assert_eq!(nav_action(KeyCode::ArrowRight), Some(NavAction::NextSlide));
        assert_eq!(
            nav_action(KeyCode::ArrowLeft),
            Some(NavAction::PreviousSlide)
        );
    }

    #[test]
    fn digits_are_one_based_on_the_keycap() {
        assert_eq!(nav_action(KeyCode::Digit1), Some(NavAction::SelectSlide(0)));
        assert_eq!(nav_action(KeyCode::Digit9), Some(NavAction::SelectSlide(8)));
    }

    #[test]
    fn escape_and_home_return_to_the_overview() {
        assert_eq!(nav_action(KeyCode::Escape), Some(NavAction::GoHome));
        assert_eq!(nav_action(KeyCode::Home), Some(NavAction::GoHome));
    }

    #[test]
    fn unbound_keys_are_ignored() {
        assert_eq!(nav_action(KeyCode::KeyW), None);
        assert_eq!(nav_action(KeyCode::Digit0), None);
    }
}
