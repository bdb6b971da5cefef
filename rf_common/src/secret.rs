use std::{
    fmt,
    fmt::{Debug, Display},
};

/// A wrapper for sensitive configuration values (API keys, passkeys). The value never appears in
/// `Debug` or `Display` output; call [`Secret::reveal`] to access it.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret<T> {
    value: T,
}

impl<T> Secret<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }

    pub fn reveal(&self) -> &T {
        &self.value
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

impl Secret<String> {
    /// True when the credential is empty or an all-zero placeholder. Gateway clients use this to
    /// warn at construction time rather than failing on the first authenticated request.
    pub fn is_unset(&self) -> bool {
        self.value.is_empty() || self.value.chars().all(|c| c == '0')
    }
}

impl From<&str> for Secret<String> {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

impl From<String> for Secret<String> {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl<T> Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

impl<T> Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn secrets_are_redacted() {
        let secret = Secret::from("passkey-123");
        assert_eq!(format!("{secret}"), "****");
        assert_eq!(format!("{secret:?}"), "****");
        assert_eq!(secret.reveal(), "passkey-123");
    }

    #[test]
    fn placeholder_credentials_are_flagged_as_unset() {
        assert!(Secret::<String>::default().is_unset());
        assert!(Secret::from("00000000000000").is_unset());
        assert!(!Secret::from("real-consumer-key").is_unset());
    }

    #[test]
    fn into_inner_surrenders_the_value() {
        let secret = Secret::from("key");
        assert_eq!(secret.into_inner(), "key");
    }
}
