use serenity::model::id::{ChannelId, UserId};

use super::state::GuildPlaybackState;

/// Botones opcionales habilitados en esta instancia
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureSet {
    pub replay: bool,
    pub autoplay: bool,
}

impl Default for FeatureSet {
    fn default() -> Self {
        Self {
            replay: true,
            autoplay: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlButton {
    pub label: &'static str,
    pub disabled: bool,
    /// Solo lo usa el toggle de autoplay (estilo "success" cuando está activo)
    pub active: bool,
}

impl ControlButton {
    fn new(label: &'static str, enabled: bool) -> Self {
        Self {
            label,
            disabled: !enabled,
            active: false,
        }
    }
}

/// Estado de los controles del mensaje "Now Playing"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlSet {
    pub replay: Option<ControlButton>,
    pub pause_resume: ControlButton,
    pub skip: ControlButton,
    pub stop: ControlButton,
    pub autoplay: Option<ControlButton>,
}

/// Calcula los controles a partir del estado de la guild
pub fn render(state: &GuildPlaybackState, features: FeatureSet) -> ControlSet {
    let active = state.phase.is_active();
    let paused = state.phase == super::state::PlaybackPhase::Paused;

    let replay = features
        .replay
        .then(|| ControlButton::new("Replay", active && state.last_played.is_some()));

    let autoplay = features.autoplay.then(|| ControlButton {
        label: if state.autoplay_enabled {
            "Autoplay: ON"
        } else {
            "Autoplay: OFF"
        },
        disabled: false,
        active: state.autoplay_enabled,
    });

    ControlSet {
        replay,
        pause_resume: ControlButton::new(if paused { "Resume" } else { "Pause" }, active),
        skip: ControlButton::new("Skip", active),
        stop: ControlButton::new("Stop", state.voice.is_some()),
        autoplay,
    }
}

/// Un usuario puede usar los controles si pidió la canción actual o si está
/// en el mismo canal de voz que el bot
pub fn may_control(
    invoker: UserId,
    requester: Option<UserId>,
    invoker_channel: Option<ChannelId>,
    bot_channel: Option<ChannelId>,
) -> bool {
    if requester == Some(invoker) {
        return true;
    }

    matches!((invoker_channel, bot_channel), (Some(a), Some(b)) if a == b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{
        state::{GuildRegistry, PlaybackPhase},
        track::{QueueItem, TrackDescriptor},
    };
    use pretty_assertions::assert_eq;
    use serenity::model::id::GuildId;

    fn with_state<R>(f: impl FnOnce(&mut GuildPlaybackState) -> R) -> R {
        let registry = GuildRegistry::new(10);
        let slot = registry.get_or_create(GuildId::new(1));
        let mut state = slot.state.lock();
        f(&mut state)
    }

    #[test]
    fn idle_guild_disables_transport() {
        let controls = with_state(|state| render(state, FeatureSet::default()));

        assert_eq!(controls.pause_resume.label, "Pause");
        assert!(controls.pause_resume.disabled);
        assert!(controls.skip.disabled);
        assert!(controls.stop.disabled);
        assert!(controls.replay.as_ref().is_some_and(|b| b.disabled));
        assert_eq!(controls.autoplay.as_ref().map(|b| b.label), Some("Autoplay: OFF"));
    }

    #[test]
    fn paused_guild_offers_resume_and_replay() {
        let controls = with_state(|state| {
            state.phase = PlaybackPhase::Paused;
            state.autoplay_enabled = true;
            state.last_played = Some(QueueItem::new(
                TrackDescriptor::Query("song".to_string()),
                UserId::new(2),
            ));
            render(state, FeatureSet::default())
        });

        assert_eq!(controls.pause_resume.label, "Resume");
        assert!(!controls.pause_resume.disabled);
        assert!(!controls.skip.disabled);
        assert!(controls.replay.as_ref().is_some_and(|b| !b.disabled));

        let autoplay = controls.autoplay.unwrap();
        assert_eq!(autoplay.label, "Autoplay: ON");
        assert!(autoplay.active);
    }

    #[test]
    fn reduced_feature_set_hides_optional_buttons() {
        let features = FeatureSet {
            replay: false,
            autoplay: false,
        };
        let controls = with_state(|state| render(state, features));

        assert_eq!(controls.replay, None);
        assert_eq!(controls.autoplay, None);
    }

    #[test]
    fn authorization_rules() {
        let user = UserId::new(1);
        let other = UserId::new(2);
        let vc = Some(ChannelId::new(10));
        let elsewhere = Some(ChannelId::new(11));

        assert!(may_control(user, Some(user), None, vc));
        assert!(may_control(user, Some(other), vc, vc));
        assert!(!may_control(user, Some(other), elsewhere, vc));
        assert!(!may_control(user, None, None, None));
        assert!(!may_control(user, None, vc, None));
    }
}
