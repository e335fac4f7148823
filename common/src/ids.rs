use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identificador de Billetera usando NewType Pattern.
///
/// Acepta únicamente la forma canónica 8-4-4-4-12 (case-insensitive); ver
/// `WalletId::parse_canonical` para el mensaje de error que usa el Validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WalletId(pub Uuid);

impl WalletId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Valida y parsea la forma canónica 8-4-4-4-12 (case-insensitive).
    /// A diferencia de `Uuid::parse_str`, que también acepta variantes
    /// "simple" (sin guiones) y "urn", rechazamos todo lo que no sea la
    /// forma canónica — el Validator depende de esto para INVALID_WALLET_ID.
    pub fn parse_canonical(s: &str) -> Option<Self> {
        if !is_canonical_hyphenated(s) {
            return None;
        }
        Uuid::parse_str(s).ok().map(Self)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for WalletId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for WalletId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Identificador de TransactionLog; mismo patrón que `WalletId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub Uuid);

impl TransactionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `8-4-4-4-12` hex, hyphenated, case-insensitive — rejects the "simple"
/// (no-hyphen) and "urn:uuid:" forms that `Uuid::parse_str` otherwise allows.
fn is_canonical_hyphenated(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() != 36 {
        return false;
    }
    for (i, b) in bytes.iter().enumerate() {
        let expect_hyphen = matches!(i, 8 | 13 | 18 | 23);
        if expect_hyphen {
            if *b != b'-' {
                return false;
            }
        } else if !b.is_ascii_hexdigit() {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_canonical_form_case_insensitive() {
        let lower = "550e8400-e29b-41d4-a716-446655440000";
        let upper = "550E8400-E29B-41D4-A716-446655440000";
        assert!(WalletId::parse_canonical(lower).is_some());
        assert!(WalletId::parse_canonical(upper).is_some());
    }

    #[test]
    fn rejects_non_canonical_forms() {
        assert!(WalletId::parse_canonical("550e8400e29b41d4a716446655440000").is_none());
        assert!(WalletId::parse_canonical("urn:uuid:550e8400-e29b-41d4-a716-446655440000")
            .is_none());
        assert!(WalletId::parse_canonical("not-a-uuid").is_none());
        assert!(WalletId::parse_canonical("").is_none());
    }
}
