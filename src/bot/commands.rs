//! Comandos de prefijo: tabla de comandos, alias y parseo del mensaje.

/// Comandos que entiende el bot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Play,
    Queue,
    Skip,
    Pause,
    Resume,
    Stop,
    ClearQueue,
    Join,
    Leave,
    Ping,
    Help,
}

/// Descripción de un comando para el parser y la ayuda
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    pub command: Command,
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub usage: &'static str,
    pub summary: &'static str,
}

pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: Command::Play,
        name: "play",
        aliases: &["p"],
        usage: "play <canción | URL>",
        summary: "Reproduce una canción, álbum o playlist (o la agrega a la cola)",
    },
    CommandSpec {
        command: Command::Queue,
        name: "queue",
        aliases: &["q"],
        usage: "queue",
        summary: "Muestra la cola de reproducción",
    },
    CommandSpec {
        command: Command::Skip,
        name: "skip",
        aliases: &["s"],
        usage: "skip",
        summary: "Salta la canción actual",
    },
    CommandSpec {
        command: Command::Pause,
        name: "pause",
        aliases: &[],
        usage: "pause",
        summary: "Pausa la reproducción",
    },
    CommandSpec {
        command: Command::Resume,
        name: "resume",
        aliases: &["unpause"],
        usage: "resume",
        summary: "Reanuda la reproducción",
    },
    CommandSpec {
        command: Command::Stop,
        name: "stop",
        aliases: &[],
        usage: "stop",
        summary: "Detiene la música, limpia la cola y sale del canal de voz",
    },
    CommandSpec {
        command: Command::ClearQueue,
        name: "clearqueue",
        aliases: &["cq"],
        usage: "clearqueue",
        summary: "Vacía la cola sin detener la canción actual",
    },
    CommandSpec {
        command: Command::Join,
        name: "join",
        aliases: &[],
        usage: "join",
        summary: "Entra a tu canal de voz",
    },
    CommandSpec {
        command: Command::Leave,
        name: "leave",
        aliases: &["disconnect"],
        usage: "leave",
        summary: "Sale del canal de voz",
    },
    CommandSpec {
        command: Command::Ping,
        name: "ping",
        aliases: &[],
        usage: "ping",
        summary: "Muestra la latencia del bot",
    },
    CommandSpec {
        command: Command::Help,
        name: "help",
        aliases: &["h"],
        usage: "help [comando]",
        summary: "Muestra esta ayuda o los detalles de un comando",
    },
];

/// Busca un comando por nombre o alias (sin distinguir mayúsculas)
pub fn find(name: &str) -> Option<&'static CommandSpec> {
    let name = name.to_lowercase();
    COMMANDS
        .iter()
        .find(|spec| spec.name == name || spec.aliases.contains(&name.as_str()))
}

/// Comando reconocido junto con el resto del mensaje
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub command: Command,
    pub args: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    /// El mensaje no empieza con el prefijo
    NotACommand,
    Unknown(String),
    Command(Invocation),
}

/// Interpreta un mensaje de texto
pub fn parse(prefix: &str, content: &str) -> Parsed {
    let Some(rest) = content.trim_start().strip_prefix(prefix) else {
        return Parsed::NotACommand;
    };

    let rest = rest.trim_start();
    let (name, args) = match rest.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (rest, ""),
    };

    if name.is_empty() {
        return Parsed::NotACommand;
    }

    match find(name) {
        Some(spec) => Parsed::Command(Invocation {
            command: spec.command,
            args: args.to_string(),
        }),
        None => Parsed::Unknown(name.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn invocation(command: Command, args: &str) -> Parsed {
        Parsed::Command(Invocation {
            command,
            args: args.to_string(),
        })
    }

    #[test]
    fn parses_commands_and_aliases() {
        assert_eq!(
            parse("!!", "!!play  daft punk   one more time "),
            invocation(Command::Play, "daft punk   one more time")
        );
        assert_eq!(parse("!!", "!!p lofi"), invocation(Command::Play, "lofi"));
        assert_eq!(parse("!!", "!!CQ"), invocation(Command::ClearQueue, ""));
        assert_eq!(parse("!!", "!!disconnect"), invocation(Command::Leave, ""));
        assert_eq!(parse("!!", "!!help play"), invocation(Command::Help, "play"));
    }

    #[test]
    fn ignores_messages_without_prefix() {
        assert_eq!(parse("!!", "hola"), Parsed::NotACommand);
        assert_eq!(parse("!!", "!play x"), Parsed::NotACommand);
        assert_eq!(parse("!!", "!!"), Parsed::NotACommand);
    }

    #[test]
    fn reports_unknown_commands() {
        assert_eq!(parse("!!", "!!shuffle"), Parsed::Unknown("shuffle".to_string()));
    }

    #[test]
    fn custom_prefix() {
        assert_eq!(parse("$", "$q"), invocation(Command::Queue, ""));
        assert_eq!(parse("$", "!!q"), Parsed::NotACommand);
    }

    #[test]
    fn names_and_aliases_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for spec in COMMANDS {
            assert!(seen.insert(spec.name), "duplicado: {}", spec.name);
            for alias in spec.aliases {
                assert!(seen.insert(alias), "duplicado: {}", alias);
            }
        }
    }
}
