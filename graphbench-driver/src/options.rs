use std::time::Duration;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum EncryptionMode {
    /// Use whatever the address scheme says.
    #[default]
    #[strum(to_string = "auto")]
    Auto,
    #[strum(to_string = "true", serialize = "yes", serialize = "y", serialize = "1")]
    On,
    #[strum(to_string = "false", serialize = "no", serialize = "n", serialize = "0")]
    Off,
}

#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub address: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub encryption: EncryptionMode,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl ConnectOptions {
    pub const DEFAULT_ADDRESS: &'static str = "http://localhost:7474";
    pub const DEFAULT_DATABASE: &'static str = "neo4j";
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = user.into();
        self.password = password.into();
        self
    }
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            address: Self::DEFAULT_ADDRESS.to_string(),
            user: "neo4j".to_string(),
            password: "neo4j".to_string(),
            database: Self::DEFAULT_DATABASE.to_string(),
            encryption: EncryptionMode::Auto,
            connect_timeout: Self::DEFAULT_CONNECT_TIMEOUT,
            request_timeout: Self::DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encryption_mode_accepts_aliases() {
        for (input, want) in [
            ("auto", EncryptionMode::Auto),
            ("TRUE", EncryptionMode::On),
            ("yes", EncryptionMode::On),
            ("y", EncryptionMode::On),
            ("1", EncryptionMode::On),
            ("false", EncryptionMode::Off),
            ("No", EncryptionMode::Off),
            ("0", EncryptionMode::Off),
        ] {
            assert_eq!(input.parse::<EncryptionMode>().ok(), Some(want), "{input}");
        }
        assert!("maybe".parse::<EncryptionMode>().is_err());
        assert_eq!(EncryptionMode::On.to_string(), "true");
    }
}
