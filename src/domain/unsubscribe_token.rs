use rand::Rng;

const TOKEN_BYTES: usize = 32;

/// 256 bits from the thread-local CSPRNG, hex encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsubscribeToken(String);

impl UnsubscribeToken {
    pub fn new() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::rng().fill(&mut bytes);

        Self(bytes.iter().map(|b| format!("{b:02x}")).collect())
    }

    pub fn parse(s: String) -> Result<Self, String> {
        let is_wrong_length = s.len() != TOKEN_BYTES * 2;
        let is_not_lower_hex = !s
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));

        if is_wrong_length || is_not_lower_hex {
            Err(format!("{s} is not a valid unsubscribe token."))
        } else {
            Ok(Self(s))
        }
    }
}

impl Default for UnsubscribeToken {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<str> for UnsubscribeToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
