//! Slash commands understood by the bot.
//!
//! Commands are matched case-insensitively. A command addressed to another bot (`/status@other_bot`) is not ours and
//! parses as `None`.

/// A parsed bot command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/start`, `/help`
    Help,
    /// `/gyroskop [deadline], [name], options...` with the raw argument text
    Gyroskop(String),
    /// `/status`
    Status,
    /// `/ende`
    End,
    /// `/stornieren`, `/cancel`
    Cancel,
}

impl Command {
    /// Parses `text` as a command. Returns `None` for ordinary text, unknown commands and commands addressed to a
    /// different bot.
    pub fn parse(text: &str, bot_username: Option<&str>) -> Option<Self> {
        let text = text.trim_start();
        let body = text.strip_prefix('/')?;
        let (head, args) = match body.split_once(char::is_whitespace) {
            Some((head, args)) => (head, args.trim()),
            None => (body, ""),
        };
        let (name, addressee) = match head.split_once('@') {
            Some((name, addressee)) => (name, Some(addressee)),
            None => (head, None),
        };
        if let (Some(addressee), Some(me)) = (addressee, bot_username) {
            if !addressee.eq_ignore_ascii_case(me) {
                return None;
            }
        }
        match name.to_lowercase().as_str() {
            "start" | "help" => Some(Self::Help),
            "gyroskop" => Some(Self::Gyroskop(args.to_string())),
            "status" => Some(Self::Status),
            "ende" => Some(Self::End),
            "stornieren" | "cancel" => Some(Self::Cancel),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn plain_commands() {
        assert_eq!(Command::parse("/help", None), Some(Command::Help));
        assert_eq!(Command::parse("/start", None), Some(Command::Help));
        assert_eq!(Command::parse("/Status", None), Some(Command::Status));
        assert_eq!(Command::parse("  /ende", None), Some(Command::End));
        assert_eq!(Command::parse("/stornieren", None), Some(Command::Cancel));
        assert_eq!(Command::parse("/cancel", None), Some(Command::Cancel));
        assert_eq!(Command::parse("/gyroskop", None), Some(Command::Gyroskop(String::new())));
    }

    #[test]
    fn arguments_are_kept_verbatim() {
        let cmd = Command::parse("/gyroskop 30min, Pizza, Margherita,  Salami ", None);
        assert_eq!(cmd, Some(Command::Gyroskop("30min, Pizza, Margherita,  Salami".into())));
        let cmd = Command::parse("/gyroskop\n18:30, Döner", None);
        assert_eq!(cmd, Some(Command::Gyroskop("18:30, Döner".into())));
    }

    #[test]
    fn addressed_commands() {
        let me = Some("gyroskop_bot");
        assert_eq!(Command::parse("/status@gyroskop_bot", me), Some(Command::Status));
        assert_eq!(Command::parse("/status@Gyroskop_Bot", me), Some(Command::Status));
        assert_eq!(Command::parse("/gyroskop@gyroskop_bot 17:00", me), Some(Command::Gyroskop("17:00".into())));
        assert_eq!(Command::parse("/status@other_bot", me), None);
        // Without knowing our own name, any addressee is accepted
        assert_eq!(Command::parse("/status@other_bot", None), Some(Command::Status));
    }

    #[test]
    fn everything_else_is_not_a_command() {
        assert_eq!(Command::parse("2 Fleisch", None), None);
        assert_eq!(Command::parse("0", None), None);
        assert_eq!(Command::parse("/weather", None), None);
        assert_eq!(Command::parse("/", None), None);
        assert_eq!(Command::parse("", None), None);
    }
}
