use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::App;

/// Handle one key event. Returns true when the app should quit.
pub fn handle_key_event(app: &mut App, key: KeyEvent) -> bool {
    // Overlays swallow keys while visible.
    if app.show_info {
        match key.code {
            KeyCode::Esc | KeyCode::F(1) | KeyCode::Enter => app.show_info = false,
            _ => {}
        }
        return false;
    }

    if app.show_mode_picker {
        match key.code {
            KeyCode::Esc => app.show_mode_picker = false,
            KeyCode::Up => app.mode_cursor_up(),
            KeyCode::Down => app.mode_cursor_down(),
            KeyCode::Enter => app.confirm_mode(),
            _ => {}
        }
        return false;
    }

    match (key.modifiers, key.code) {
        (KeyModifiers::CONTROL, KeyCode::Char('c')) => return true,
        (_, KeyCode::Esc) => return true,

        (_, KeyCode::F(1)) => app.show_info = true,
        (KeyModifiers::CONTROL, KeyCode::Char('m')) => app.toggle_mode_picker(),

        (_, KeyCode::PageUp) => app.scroll_up(5),
        (_, KeyCode::PageDown) => app.scroll_down(5),

        (KeyModifiers::SHIFT, KeyCode::Enter) => {
            if !app.typing {
                app.textarea.insert_newline();
            }
        }
        (_, KeyCode::Enter) => app.submit_question(),

        _ => {
            // Everything else edits the input, which is frozen mid-reveal.
            if !app.typing {
                app.textarea.input(key);
            }
        }
    }

    false
}
