//! Pure input validators and normalizers.
//!
//! These functions never touch storage and never fail with an error value —
//! a bad input yields `false` or `None` so the caller can re-prompt instead
//! of aborting the conversation.

use chrono::NaiveDate;

/// Validate an 11-digit CPF via its two weighted check digits.
///
/// Non-digit characters are stripped first, so `"529.982.247-25"` and
/// `"52998224725"` are equivalent. Repdigit sequences (`000…`, `111…`) pass
/// the checksum arithmetic but are not real CPFs and are rejected outright.
pub fn valid_cpf(raw: &str) -> bool {
  let digits: Vec<u32> = raw.chars().filter_map(|c| c.to_digit(10)).collect();

  if digits.len() != 11 {
    return false;
  }
  if digits.windows(2).all(|w| w[0] == w[1]) {
    return false;
  }

  // Check digit over the first `len` digits, weights descending to 2.
  let check = |len: usize| -> u32 {
    let sum: u32 = digits[..len]
      .iter()
      .zip((2..=(len as u32) + 1).rev())
      .map(|(d, w)| d * w)
      .sum();
    let remainder = (sum * 10) % 11;
    if remainder == 10 { 0 } else { remainder }
  };

  check(9) == digits[9] && check(10) == digits[10]
}

/// Strip a CPF down to its 11 digits, if it has exactly 11.
pub fn cpf_digits(raw: &str) -> Option<String> {
  let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
  if digits.len() == 11 { Some(digits) } else { None }
}

/// Normalize a phone number into the digits-only form used as the session
/// identity key and as the messaging-gateway recipient.
///
/// A 10- or 11-digit national number gets the `55` country prefix.
pub fn normalize_phone(raw: &str) -> String {
  let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
  match digits.len() {
    10 | 11 => format!("55{digits}"),
    _ => digits,
  }
}

/// Parse a date in ISO (`2007-11-23`) or Brazilian (`23/11/2007`) form.
///
/// Returns `None` on anything unparsable — the flow re-prompts, it never
/// crashes on a date.
pub fn normalize_date(raw: &str) -> Option<NaiveDate> {
  let trimmed = raw.trim();
  NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
    .or_else(|_| NaiveDate::parse_from_str(trimmed, "%d/%m/%Y"))
    .ok()
}
