use std::fmt;

/// Machine-readable error codes for scripts and dashboards consuming `tl`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InputNotFound,
    InputReadFailed,
    FeedParseError,
    ConfigParseError,
    InvalidConfigValue,
    TicketNotFound,
    InvalidNow,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InputNotFound => "E1001",
            Self::InputReadFailed => "E1002",
            Self::FeedParseError => "E1003",
            Self::ConfigParseError => "E2001",
            Self::InvalidConfigValue => "E2002",
            Self::TicketNotFound => "E3001",
            Self::InvalidNow => "E3002",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::InputNotFound => "Ticket feed not found",
            Self::InputReadFailed => "Ticket feed could not be read",
            Self::FeedParseError => "Ticket feed is not valid JSON or JSON Lines",
            Self::ConfigParseError => "Config file parse error",
            Self::InvalidConfigValue => "Invalid configuration value",
            Self::TicketNotFound => "Ticket not found",
            Self::InvalidNow => "Invalid --now timestamp",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::InputNotFound => Some("Check the path, or pass `-` to read from stdin."),
            Self::InputReadFailed => Some("Check file permissions and encoding (UTF-8)."),
            Self::FeedParseError => {
                Some("Provide a JSON array of ticket objects or one object per line.")
            }
            Self::ConfigParseError => Some("Fix syntax in .ticketline/config.toml and retry."),
            Self::InvalidConfigValue => {
                Some("Use HH:MM times, mon..sun weekdays, and an offset within 24h.")
            }
            Self::TicketNotFound => Some("Run `tl enrich <FILE>` to list ticket ids."),
            Self::InvalidNow => Some("Pass an RFC 3339 timestamp, e.g. 2024-06-01T10:00:00Z."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorCode;
    use std::collections::HashSet;

    const ALL: [ErrorCode; 8] = [
        ErrorCode::InputNotFound,
        ErrorCode::InputReadFailed,
        ErrorCode::FeedParseError,
        ErrorCode::ConfigParseError,
        ErrorCode::InvalidConfigValue,
        ErrorCode::TicketNotFound,
        ErrorCode::InvalidNow,
        ErrorCode::InternalUnexpected,
    ];

    #[test]
    fn all_codes_are_unique() {
        let mut seen = HashSet::new();
        for code in ALL {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        for code in ALL {
            let code = code.code();
            assert_eq!(code.len(), 5);
            assert!(code.starts_with('E'));
            assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn every_code_has_a_message() {
        for code in ALL {
            assert!(!code.message().is_empty());
        }
        assert_eq!(ErrorCode::TicketNotFound.to_string(), "E3001");
    }
}
