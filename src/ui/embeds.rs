use serenity::{
    all::Timestamp,
    builder::{CreateEmbed, CreateEmbedFooter},
};
use std::time::Duration;

use crate::{
    audio::{
        notice::{ExhaustedReason, QueuedSummary},
        player::QueueSnapshot,
        track::NowPlaying,
    },
    bot::commands::{CommandSpec, COMMANDS},
};

/// Paleta de colores estandarizada para el bot
pub mod colors {
    use serenity::all::Colour;

    pub const SUCCESS_GREEN: Colour = Colour::from_rgb(67, 181, 129);
    pub const ERROR_RED: Colour = Colour::from_rgb(220, 53, 69);
    pub const WARNING_ORANGE: Colour = Colour::from_rgb(255, 147, 7);
    pub const GOLD: Colour = Colour::from_rgb(241, 196, 15);
    pub const INFO_BLUE: Colour = Colour::from_rgb(52, 144, 220);
    pub const MUSIC_PURPLE: Colour = Colour::from_rgb(138, 43, 226);
    pub const BLURPLE: Colour = Colour::from_rgb(88, 101, 242);
    pub const NEUTRAL_GRAY: Colour = Colour::from_rgb(108, 117, 125);
}

/// Límites de Discord para el valor de un campo y para la descripción
const FIELD_MAX_CHARS: usize = 1024;
const DESCRIPTION_MAX_CHARS: usize = 4096;
/// Cada etiqueta de una lista se corta a este largo
const LABEL_MAX_CHARS: usize = 80;
const TITLE_MAX_CHARS: usize = 200;

/// Corta `text` a `max` caracteres, terminando en `…` si sobraba
fn clip(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut clipped: String = text.chars().take(max.saturating_sub(1)).collect();
    clipped.push('…');
    clipped
}

/// Lista numerada de etiquetas que cabe en un campo de embed
fn numbered_list(labels: &[String]) -> String {
    let list = labels
        .iter()
        .enumerate()
        .map(|(i, label)| format!("`{}.` {}", i + 1, clip(label, LABEL_MAX_CHARS)))
        .collect::<Vec<_>>()
        .join("\n");
    clip(&list, FIELD_MAX_CHARS)
}

fn base(footer: &str) -> CreateEmbed {
    CreateEmbed::default()
        .footer(CreateEmbedFooter::new(footer))
        .timestamp(Timestamp::now())
}

/// Embed de "Now Playing"
pub fn now_playing_embed(track: &NowPlaying, footer: &str) -> CreateEmbed {
    let title = match &track.page_url {
        Some(url) => format!("**[{}]({})**", track.title, url),
        None => format!("**{}**", track.title),
    };
    let description = match &track.source_url {
        Some(source) => format!("{}\n[Abrir en Spotify]({})", title, source),
        None => title,
    };

    let mut embed = base(footer)
        .title("🎧 Reproduciendo Ahora")
        .description(description)
        .color(colors::SUCCESS_GREEN);

    embed = match track.duration {
        Some(duration) => embed.field("⏱️ Duración", format_duration(duration), true),
        None => embed.field("⏱️ Duración", "🔴 En vivo", true),
    };

    if let Some(uploader) = &track.uploader {
        embed = embed.field("📺 Canal", uploader, true);
    }

    embed = embed.field("👤 Solicitado por", format!("<@{}>", track.requested_by()), true);

    if let Some(thumbnail) = &track.thumbnail {
        embed = embed.thumbnail(thumbnail);
    }

    embed
}

/// Mensaje de "Now Playing" retirado por `stop`
pub fn stopped_embed(footer: &str) -> CreateEmbed {
    base(footer)
        .title("⏹️ Reproducción Detenida")
        .description("Salí del canal de voz y limpié la cola.")
        .color(colors::ERROR_RED)
}

pub fn queued_embed(summary: &QueuedSummary, footer: &str) -> CreateEmbed {
    let mut embed = base(footer)
        .title(summary_title(summary))
        .color(colors::BLURPLE);

    let description = summary_description(summary);
    if !description.is_empty() {
        embed = embed.description(description);
    }

    if summary.dropped > 0 {
        embed = embed.field(
            "⚠️ Cola llena",
            format!(
                "{} canciones no entraron (la cola tiene {} en total)",
                summary.dropped, summary.queue_len
            ),
            false,
        );
    }

    if let Some(thumbnail) = &summary.thumbnail {
        embed = embed.thumbnail(thumbnail);
    }

    embed
}

fn summary_title(summary: &QueuedSummary) -> String {
    let mut title = match summary.queued {
        0 => "⚠️ No se agregó nada".to_string(),
        1 => "➕ 1 canción agregada".to_string(),
        n => format!("➕ {} canciones agregadas", n),
    };

    if let Some(batch) = &summary.batch_label {
        title.push_str(&format!(" de {}", clip(batch, TITLE_MAX_CHARS)));
    }
    title
}

fn summary_description(summary: &QueuedSummary) -> String {
    let mut description = numbered_list(&summary.preview);

    if summary.more > 0 {
        if !description.is_empty() {
            description.push('\n');
        }
        description.push_str(&format!("...y {} más.", summary.more));
    }
    clip(&description, DESCRIPTION_MAX_CHARS)
}

pub fn autoplay_embed(seed: &str, footer: &str) -> CreateEmbed {
    base(footer)
        .title("🔁 Autoplay")
        .description(format!("Buscando algo parecido a **{}**...", seed))
        .color(colors::INFO_BLUE)
}

pub fn resolution_failed_embed(label: &str, reason: &str, footer: &str) -> CreateEmbed {
    base(footer)
        .title("⚠️ No se pudo reproducir")
        .description(format!("**{}**\nError: `{}`", label, reason))
        .color(colors::ERROR_RED)
}

pub fn playback_error_embed(reason: &str, footer: &str) -> CreateEmbed {
    base(footer)
        .title("⚠️ Error de Reproducción")
        .description(format!("La canción terminó con un error: `{}`", reason))
        .color(colors::WARNING_ORANGE)
}

pub fn exhausted_embed(reason: ExhaustedReason, footer: &str) -> CreateEmbed {
    let description = match reason {
        ExhaustedReason::QueueEmpty => "No quedan canciones en la cola.",
        ExhaustedReason::AutoplaySeedUnavailable => {
            "Autoplay no encontró una canción de referencia."
        }
        ExhaustedReason::AutoplayFailed => "Autoplay no pudo encontrar nada parecido.",
    };

    base(footer)
        .title("📭 Cola Terminada")
        .description(description)
        .color(colors::GOLD)
}

/// Embed del comando `queue`
pub fn queue_embed(snapshot: Option<&QueueSnapshot>, prefix: &str, footer: &str) -> CreateEmbed {
    let mut embed = base(footer)
        .title("🎶 Cola de Reproducción")
        .color(colors::MUSIC_PURPLE);

    let Some(snapshot) = snapshot.filter(|s| s.now_playing.is_some() || s.total > 0) else {
        return embed
            .description(format!(
                "😴 **La cola está vacía**\n\n💡 Usa `{}play <canción>` para agregar música",
                prefix
            ))
            .color(colors::NEUTRAL_GRAY);
    };

    let current = match &snapshot.now_playing {
        Some(track) => {
            let status = if snapshot.paused { "⏸️" } else { "▶️" };
            let duration = track
                .duration
                .map(|d| format!(" `[{}]`", format_duration(d)))
                .unwrap_or_default();
            format!(
                "{} **{}**{}\nSolicitado por <@{}>",
                status,
                clip(&track.title, TITLE_MAX_CHARS),
                duration,
                track.requested_by()
            )
        }
        None => "Nada.".to_string(),
    };
    embed = embed.field("🎧 Sonando", current, false);

    if snapshot.total == 0 {
        embed = embed.field("🗒️ Siguientes", "Cola vacía.", false);
    } else {
        let upcoming = numbered_list(&snapshot.upcoming);
        embed = embed.field(format!("🗒️ Siguientes ({})", snapshot.total), upcoming, false);

        let hidden = snapshot.total.saturating_sub(snapshot.upcoming.len());
        if hidden > 0 {
            embed = embed.field("...", format!("Y {} más.", hidden), false);
        }
    }

    if snapshot.autoplay {
        embed = embed.field("🔁 Autoplay", "Activado", true);
    }

    embed
}

/// Crea un embed de ayuda general
pub fn help_embed(prefix: &str, footer: &str) -> CreateEmbed {
    let commands = COMMANDS
        .iter()
        .map(|spec| format!("`{}{}` - {}", prefix, spec.usage, spec.summary))
        .collect::<Vec<_>>()
        .join("\n");

    base(footer)
        .title("📜 Comandos del Bot de Música")
        .description(format!(
            "Usa `{}<comando>` para ejecutar un comando.\n\n{}",
            prefix, commands
        ))
        .field(
            "💡 Más ayuda",
            format!("`{}help <comando>` muestra los detalles de un comando", prefix),
            false,
        )
        .color(colors::MUSIC_PURPLE)
}

/// Crea un embed de ayuda para un comando específico
pub fn command_help_embed(spec: &CommandSpec, prefix: &str, footer: &str) -> CreateEmbed {
    let mut embed = base(footer)
        .title(format!("Ayuda: `{}{}`", prefix, spec.usage))
        .field("Descripción", spec.summary, false)
        .color(colors::INFO_BLUE);

    if !spec.aliases.is_empty() {
        let aliases = spec
            .aliases
            .iter()
            .map(|alias| format!("`{}{}`", prefix, alias))
            .collect::<Vec<_>>()
            .join(", ");
        embed = embed.field("Alias", aliases, false);
    }

    embed
}

/// Aviso por error del usuario (naranja, sin cambios de estado)
pub fn warning_embed(description: &str, footer: &str) -> CreateEmbed {
    base(footer)
        .description(format!("⚠️ {}", description))
        .color(colors::WARNING_ORANGE)
}

pub fn error_embed(title: &str, description: &str, footer: &str) -> CreateEmbed {
    base(footer)
        .title(format!("❌ {}", title))
        .description(description)
        .color(colors::ERROR_RED)
}

pub fn success_embed(description: &str, footer: &str) -> CreateEmbed {
    base(footer)
        .description(description)
        .color(colors::SUCCESS_GREEN)
}

pub fn info_embed(description: &str, footer: &str) -> CreateEmbed {
    base(footer)
        .description(description)
        .color(colors::NEUTRAL_GRAY)
}

/// Formatea una duración como `m:ss` o `h:mm:ss`
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn formats_durations() {
        assert_eq!(format_duration(Duration::from_secs(0)), "0:00");
        assert_eq!(format_duration(Duration::from_secs(215)), "3:35");
        assert_eq!(format_duration(Duration::from_secs(3725)), "1:02:05");
    }

    #[test]
    fn summary_lists_preview_and_overflow() {
        let summary = QueuedSummary {
            batch_label: Some("Album: Discovery".to_string()),
            thumbnail: None,
            queued: 14,
            preview: vec!["A - One".to_string(), "B - Two".to_string()],
            more: 12,
            dropped: 0,
            queue_len: 14,
        };

        assert_eq!(summary_title(&summary), "➕ 14 canciones agregadas de Album: Discovery");
        assert_eq!(
            summary_description(&summary),
            "`1.` A - One\n`2.` B - Two\n...y 12 más."
        );
    }

    #[test]
    fn summary_title_for_full_queue() {
        let summary = QueuedSummary {
            batch_label: None,
            thumbnail: None,
            queued: 0,
            preview: Vec::new(),
            more: 0,
            dropped: 3,
            queue_len: 1000,
        };

        assert_eq!(summary_title(&summary), "⚠️ No se agregó nada");
        assert_eq!(summary_description(&summary), "");
    }

    #[test]
    fn long_labels_are_clipped_to_fit_a_field() {
        let labels: Vec<String> = (0..10).map(|i| format!("{}{}", i, "x".repeat(200))).collect();

        let list = numbered_list(&labels);
        assert!(list.chars().count() <= FIELD_MAX_CHARS);
        assert_eq!(list.lines().count(), 10);
        for line in list.lines() {
            assert!(line.ends_with('…'));
        }
        assert_eq!(clip("corto", LABEL_MAX_CHARS), "corto");
    }

    #[test]
    fn queue_embed_fields_stay_within_discord_limits() {
        let snapshot = QueueSnapshot {
            now_playing: None,
            paused: false,
            upcoming: (0..10).map(|_| "ñ".repeat(300)).collect(),
            total: 10,
            autoplay: false,
        };

        let embed = serde_json::to_value(queue_embed(Some(&snapshot), "!!", "footer")).unwrap();
        let fields = embed["fields"].as_array().unwrap();
        assert!(!fields.is_empty());
        for field in fields {
            let value = field["value"].as_str().unwrap();
            assert!(value.chars().count() <= FIELD_MAX_CHARS, "campo de {} caracteres", value.chars().count());
        }
    }
}
