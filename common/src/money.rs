use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Decimal de punto fijo (19,4): hasta 15 dígitos enteros, exactamente 4
/// dígitos fraccionarios, cerrado bajo suma/resta a esa escala. Envuelve
/// `rust_decimal::Decimal` — la aritmética nunca toca `f32`/`f64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

pub const SCALE: u32 = 4;
pub const MIN_TRANSFER_AMOUNT: Decimal = Decimal::from_parts(1, 0, 0, false, SCALE);
const MAX_INTEGER_DIGITS: u32 = 15;

impl Money {
    pub fn zero() -> Self {
        Self(Decimal::ZERO.round_dp(SCALE))
    }

    pub fn from_decimal(d: Decimal) -> Self {
        Self(d.round_dp(SCALE))
    }

    /// Parsea la cadena del monto tal como la envió el llamador — sin
    /// redondeo aquí, según la regla "sin redondeo" del Validator; el valor
    /// sólo se normaliza a 4 dígitos fraccionarios para almacenamiento/display.
    pub fn parse(s: &str) -> Option<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return None;
        }
        let d = Decimal::from_str(trimmed).ok()?;
        if !Self::within_range(&d) {
            return None;
        }
        Some(Self(d.round_dp(SCALE)))
    }

    fn within_range(d: &Decimal) -> bool {
        let integer_part = d.trunc();
        let digits = integer_part.abs().to_string().trim_start_matches('0').len() as u32;
        digits <= MAX_INTEGER_DIGITS
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn is_zero(&self) -> bool {
        self.0 == Decimal::ZERO
    }

    pub fn meets_minimum_transfer(&self) -> bool {
        self.0 >= MIN_TRANSFER_AMOUNT
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn checked_add(&self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(|d| Self(d.round_dp(SCALE)))
    }

    pub fn checked_sub(&self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(|d| Self(d.round_dp(SCALE)))
    }

    /// Renderiza con exactamente 4 dígitos fraccionarios — la propiedad
    /// "determinismo de precisión" depende de esto, no del `Display` propio
    /// de `Decimal`, que recorta los ceros finales.
    pub fn to_fixed_string(&self) -> String {
        format!("{:.*}", SCALE as usize, self.0)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_fixed_string())
    }
}

impl From<Decimal> for Money {
    fn from(d: Decimal) -> Self {
        Self::from_decimal(d)
    }
}

impl From<Money> for Decimal {
    fn from(m: Money) -> Self {
        m.0
    }
}
