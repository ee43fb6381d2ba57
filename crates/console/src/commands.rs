use thiserror::Error;

/// One user action read from stdin.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Deposit(f64),
    /// Liquidate everything and end the session.
    Withdraw,
    Assets,
    Transactions,
    Market,
    Indicators,
    Add(String),
    Remove(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("unknown action: \"{0}\"")]
    Unknown(String),

    #[error("invalid amount")]
    InvalidAmount,
}

impl Command {
    /// Parse one input line. Case-insensitive; symbol arguments are
    /// uppercased with any `/` removed, so `add btc/usdt` tracks BTCUSDT.
    pub fn parse(line: &str) -> Result<Command, ParseError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let action = tokens.first().map(|t| t.to_lowercase()).unwrap_or_default();

        match (action.as_str(), tokens.len()) {
            ("help", 1) => Ok(Command::Help),
            ("withdraw", 1) => Ok(Command::Withdraw),
            ("assets", 1) => Ok(Command::Assets),
            ("transactions", 1) => Ok(Command::Transactions),
            ("market", 1) => Ok(Command::Market),
            ("indicators", 1) => Ok(Command::Indicators),
            ("deposit", 2) => match tokens[1].parse::<f64>() {
                Ok(amount) if amount > 0.0 => Ok(Command::Deposit(amount)),
                _ => Err(ParseError::InvalidAmount),
            },
            ("add", 2) => Ok(Command::Add(normalize_symbol(tokens[1]))),
            ("remove", 2) => Ok(Command::Remove(normalize_symbol(tokens[1]))),
            _ => Err(ParseError::Unknown(line.trim().to_string())),
        }
    }
}

/// Uppercase a user-supplied symbol and strip the optional pair slash.
pub fn normalize_symbol(raw: &str) -> String {
    raw.replace('/', "").to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_commands_parse_case_insensitively() {
        assert_eq!(Command::parse("help"), Ok(Command::Help));
        assert_eq!(Command::parse("WITHDRAW"), Ok(Command::Withdraw));
        assert_eq!(Command::parse("  Assets  "), Ok(Command::Assets));
        assert_eq!(Command::parse("transactions"), Ok(Command::Transactions));
        assert_eq!(Command::parse("market"), Ok(Command::Market));
        assert_eq!(Command::parse("Indicators"), Ok(Command::Indicators));
    }

    #[test]
    fn deposit_requires_a_positive_amount() {
        assert_eq!(Command::parse("deposit 100"), Ok(Command::Deposit(100.0)));
        assert_eq!(Command::parse("deposit 12.5"), Ok(Command::Deposit(12.5)));
        assert_eq!(Command::parse("deposit -5"), Err(ParseError::InvalidAmount));
        assert_eq!(Command::parse("deposit 0"), Err(ParseError::InvalidAmount));
        assert_eq!(
            Command::parse("deposit lots"),
            Err(ParseError::InvalidAmount)
        );
    }

    #[test]
    fn symbols_are_normalized() {
        assert_eq!(
            Command::parse("add btc/usdt"),
            Ok(Command::Add("BTCUSDT".to_string()))
        );
        assert_eq!(
            Command::parse("remove ethusdt"),
            Ok(Command::Remove("ETHUSDT".to_string()))
        );
    }

    #[test]
    fn anything_else_is_unknown() {
        assert!(matches!(
            Command::parse("dance"),
            Err(ParseError::Unknown(_))
        ));
        assert!(matches!(
            Command::parse("add one two"),
            Err(ParseError::Unknown(_))
        ));
        assert!(matches!(Command::parse(""), Err(ParseError::Unknown(_))));
    }
}
