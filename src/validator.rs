// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! CPF check-digit validation.
//!
//! A CPF is an 11-digit Brazilian taxpayer identifier whose last two digits
//! are mod-11 check digits computed over the preceding ones. Formatted input
//! (`111.444.777-35`) is accepted; punctuation is stripped before checking.

/// Check-digit validation seam consumed by the request handler.
///
/// Implementations are expected to be pure functions of the input string.
pub trait CheckDigitValidator: Send + Sync {
    /// Returns true when `id` is a structurally valid identifier with
    /// correct check digits.
    fn validate(&self, id: &str) -> bool;
}

/// Validates Brazilian CPF numbers.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpfValidator;

impl CheckDigitValidator for CpfValidator {
    fn validate(&self, id: &str) -> bool {
        let Some(digits) = parse_digits(id) else {
            return false;
        };

        if digits.len() != 11 {
            return false;
        }

        // CPFs made of one repeated digit pass the mod-11 check but are not
        // issued
        if digits.iter().all(|&d| d == digits[0]) {
            return false;
        }

        check_digit(&digits[..9]) == digits[9] && check_digit(&digits[..10]) == digits[10]
    }
}

/// Strip common CPF punctuation and collect digits.
///
/// Returns `None` when any character other than a digit or separator is
/// present.
fn parse_digits(input: &str) -> Option<Vec<u8>> {
    let mut digits = Vec::with_capacity(11);
    for c in input.chars() {
        if matches!(c, '.' | '-' | '/' | ' ') {
            continue;
        }
        digits.push(c.to_digit(10)? as u8);
    }
    Some(digits)
}

/// Compute a CPF check digit over `prefix`.
///
/// Digits are weighted from `prefix.len() + 1` down to 2; a remainder below
/// 2 maps to 0, otherwise to `11 - remainder`.
fn check_digit(prefix: &[u8]) -> u8 {
    let top_weight = prefix.len() + 1;
    let sum: usize = prefix
        .iter()
        .enumerate()
        .map(|(i, &d)| d as usize * (top_weight - i))
        .sum();

    match sum % 11 {
        rem if rem < 2 => 0,
        rem => (11 - rem) as u8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> CpfValidator {
        CpfValidator
    }

    #[test]
    fn test_valid_cpfs() {
        for cpf in ["11144477735", "98765432100"] {
            assert!(validator().validate(cpf), "{cpf} should be valid");
        }
    }

    #[test]
    fn test_invalid_check_digits() {
        for cpf in ["11144477700", "12345678901", "12345678900"] {
            assert!(!validator().validate(cpf), "{cpf} should be invalid");
        }
    }

    #[test]
    fn test_formatted_cpfs_accepted() {
        assert!(validator().validate("111.444.777-35"));
        assert!(validator().validate("987.654.321-00"));
    }

    #[test]
    fn test_repeated_digit_cpfs_rejected() {
        for cpf in ["11111111111", "22222222222", "99999999999"] {
            assert!(!validator().validate(cpf), "{cpf} should be invalid");
        }
    }

    #[test]
    fn test_wrong_length_rejected() {
        assert!(!validator().validate("1234567890"));
        assert!(!validator().validate("123456789012"));
        assert!(!validator().validate(""));
    }

    #[test]
    fn test_non_numeric_rejected() {
        assert!(!validator().validate("abcdefghijk"));
        assert!(!validator().validate("1114447773x"));
    }

    #[test]
    fn test_check_digit_remainder_below_two_maps_to_zero() {
        // 98765432100: both check digit sums divide evenly by 11
        let digits = [9u8, 8, 7, 6, 5, 4, 3, 2, 1];
        assert_eq!(check_digit(&digits), 0);
    }
}
