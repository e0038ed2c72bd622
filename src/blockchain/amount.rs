// src/blockchain/amount.rs

use ethers::types::U256;

use crate::blockchain::error::AgentError;

/// Largest decimal count whose scale factor `10^decimals` fits in a `U256`.
pub const MAX_DECIMALS: u8 = 77;

fn ten_pow(decimals: u8) -> Option<U256> {
    U256::from(10u64).checked_pow(U256::from(decimals))
}

/// A user-supplied decimal amount such as `"1.0"` or `"0.001"`, kept as digits
/// until the token's decimal count is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecimalAmount {
    negative: bool,
    integer: String,
    fraction: String,
}

impl DecimalAmount {
    /// Parses plain decimal notation. Scientific notation is not accepted.
    pub fn parse(input: &str) -> Result<Self, AgentError> {
        let trimmed = input.trim();
        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let (integer, fraction) = match unsigned.split_once('.') {
            Some((i, f)) => (i, f),
            None => (unsigned, ""),
        };

        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if (integer.is_empty() && fraction.is_empty()) || !all_digits(integer) || !all_digits(fraction) {
            return Err(AgentError::InvalidAmount(input.trim().to_string()));
        }

        Ok(Self {
            negative,
            integer: integer.trim_start_matches('0').to_string(),
            fraction: fraction.trim_end_matches('0').to_string(),
        })
    }

    /// Parses and rejects zero and negative values, the validation every write path applies.
    pub fn parse_positive(input: &str) -> Result<Self, AgentError> {
        let amount = Self::parse(input)?;
        if amount.is_zero() {
            return Err(AgentError::ZeroAmount);
        }
        if amount.negative {
            return Err(AgentError::NegativeAmount);
        }
        Ok(amount)
    }

    pub fn is_zero(&self) -> bool {
        self.integer.is_empty() && self.fraction.is_empty()
    }

    pub fn is_negative(&self) -> bool {
        self.negative && !self.is_zero()
    }

    /// Scales to the token's smallest unit using integer arithmetic only.
    pub fn to_base_units(&self, decimals: u8) -> Result<U256, AgentError> {
        if self.is_negative() {
            return Err(AgentError::NegativeAmount);
        }
        if self.fraction.len() > decimals as usize {
            return Err(AgentError::InvalidAmount(format!(
                "{} has more than {} decimal places",
                self, decimals
            )));
        }

        let overflow = || AgentError::InvalidAmount(format!("{} is too large", self));
        let scale = ten_pow(decimals).ok_or_else(overflow)?;
        let integer = if self.integer.is_empty() {
            U256::zero()
        } else {
            U256::from_dec_str(&self.integer).map_err(|_| overflow())?
        };
        let fraction = if self.fraction.is_empty() {
            U256::zero()
        } else {
            let padded = format!("{:0<width$}", self.fraction, width = decimals as usize);
            U256::from_dec_str(&padded).map_err(|_| overflow())?
        };

        integer
            .checked_mul(scale)
            .and_then(|v| v.checked_add(fraction))
            .ok_or_else(overflow)
    }
}

impl std::fmt::Display for DecimalAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_negative() {
            write!(f, "-")?;
        }
        let integer = if self.integer.is_empty() { "0" } else { &self.integer };
        let fraction = if self.fraction.is_empty() { "0" } else { &self.fraction };
        write!(f, "{}.{}", integer, fraction)
    }
}

/// Renders a raw token amount as a decimal string, trimming trailing zeros but
/// always keeping one fractional digit (`100000000` at 6 decimals is `"100.0"`).
pub fn format_units(raw: U256, decimals: u8) -> String {
    // past MAX_DECIMALS every U256 is below the scale, so it is all fraction
    let (integer, remainder) = match ten_pow(decimals) {
        Some(scale) => (raw / scale, raw % scale),
        None => (U256::zero(), raw),
    };

    let mut fraction = if decimals == 0 {
        String::new()
    } else {
        format!("{:0>width$}", remainder.to_string(), width = decimals as usize)
    };
    while fraction.ends_with('0') {
        fraction.pop();
    }
    if fraction.is_empty() {
        fraction.push('0');
    }

    format!("{}.{}", integer, fraction)
}
