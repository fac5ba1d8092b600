use serenity::{
    all::ButtonStyle,
    builder::{CreateActionRow, CreateButton},
};

use crate::audio::controls::{ControlButton, ControlSet};

/// IDs personalizados para los botones
pub mod button_ids {
    pub const REPLAY: &str = "music_replay";
    pub const PAUSE_RESUME: &str = "music_pause_resume";
    pub const SKIP: &str = "music_skip";
    pub const STOP: &str = "music_stop";
    pub const AUTOPLAY: &str = "music_autoplay";
}

/// Acción asociada a un botón del reproductor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    Replay,
    PauseResume,
    Skip,
    Stop,
    Autoplay,
}

impl ControlAction {
    pub fn from_custom_id(custom_id: &str) -> Option<Self> {
        match custom_id {
            button_ids::REPLAY => Some(Self::Replay),
            button_ids::PAUSE_RESUME => Some(Self::PauseResume),
            button_ids::SKIP => Some(Self::Skip),
            button_ids::STOP => Some(Self::Stop),
            button_ids::AUTOPLAY => Some(Self::Autoplay),
            _ => None,
        }
    }
}

fn button(id: &str, emoji: char, control: &ControlButton, style: ButtonStyle) -> CreateButton {
    CreateButton::new(id)
        .label(control.label)
        .emoji(emoji)
        .style(style)
        .disabled(control.disabled)
}

/// Fila de controles del mensaje "Now Playing"
pub fn control_rows(controls: &ControlSet) -> Vec<CreateActionRow> {
    let mut buttons = Vec::with_capacity(5);

    if let Some(replay) = &controls.replay {
        buttons.push(button(button_ids::REPLAY, '⏪', replay, ButtonStyle::Secondary));
    }

    let pause_emoji = if controls.pause_resume.label == "Resume" {
        '▶'
    } else {
        '⏸'
    };
    buttons.push(button(
        button_ids::PAUSE_RESUME,
        pause_emoji,
        &controls.pause_resume,
        ButtonStyle::Primary,
    ));
    buttons.push(button(button_ids::SKIP, '⏩', &controls.skip, ButtonStyle::Secondary));
    buttons.push(button(button_ids::STOP, '⏹', &controls.stop, ButtonStyle::Danger));

    if let Some(autoplay) = &controls.autoplay {
        let style = if autoplay.active {
            ButtonStyle::Success
        } else {
            ButtonStyle::Secondary
        };
        buttons.push(button(button_ids::AUTOPLAY, '🔁', autoplay, style));
    }

    vec![CreateActionRow::Buttons(buttons)]
}
