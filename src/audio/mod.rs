//! # Audio Module
//!
//! Per-guild playback queue and state machine.
//!
//! ## Architecture
//!
//! ### [`track`] - Track model
//! - Descriptors (free-text query or catalog track) and resolved metadata
//!
//! ### [`queue`] / [`state`] - Queue Store
//! - Bounded FIFO per guild
//! - Guild registry keyed by `GuildId`, with the per-guild advance lock
//!
//! ### [`player`] - Playback Controller
//! - `advance` is the only way a track starts
//! - Completions arrive over a channel and are checked against the guild
//!   generation before they can move the queue
//!
//! ### [`controls`] / [`notice`] - Presentation contract
//! - Pure control rendering and authorization
//! - Notices the controller publishes through a [`notice::Notifier`]
//!
//! ### [`voice`] - Voice session
//! - Songbird-backed stream playback with a one-shot completion hook
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! let (controller, completions) = PlaybackController::new(backend, notifier, settings);
//! let controller = Arc::new(controller);
//! controller.clone().spawn_completion_loop(completions);
//!
//! controller.attach_session(guild_id, session, Some(channel_id));
//! controller.enqueue(request).await;
//! controller.skip(guild_id).await?;
//! ```

pub mod controls;
pub mod notice;
pub mod player;
pub mod queue;
pub mod state;
#[cfg(test)]
pub mod testing;
pub mod track;
pub mod voice;
