//! Isopsephy: the numeric value of Greek words.

use thiserror::Error;

/// A character with no isopsephy value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("bad character {ch:?}")]
pub struct BadCharacter {
  pub ch: char,
}

/// Find the number of a word by summing the numeric equivalent of each Greek
/// letter. Spaces and combining accents count zero; any other unrecognized
/// character is an error.
pub fn calculate(word: &str) -> Result<u32, BadCharacter> {
  let mut total = 0;

  for ch in word.chars() {
    total += letter_value(ch).ok_or(BadCharacter { ch })?;
  }

  Ok(total)
}

fn letter_value(ch: char) -> Option<u32> {
  let value = match ch {
    // Accents, breathing marks and spacing that carry no value.
    ' ' | '῎' | '῞' | '῾' | '῏' | '᾿' | '῟' | '\u{301}' | '\u{302}' | '\u{304}' | '\u{313}'
    | '\u{314}' | '\u{342}' => 0,
    'Α' | 'Ἀ' | 'α' | 'ά' | 'ᾶ' | 'ἁ' => 1,
    'Β' | 'β' => 2,
    'Γ' | 'γ' => 3,
    'Δ' | 'δ' => 4,
    'Ε' | 'Ἐ' | 'ε' | 'έ' | 'ἑ' => 5,
    // Digamma, stigma and final sigma all count six.
    'Ϝ' | 'ϝ' | 'Ϛ' | 'ϛ' | 'ς' => 6,
    'Ζ' | 'ζ' => 7,
    'Η' | 'Ἠ' | 'η' | 'ή' | 'ῆ' | 'ἡ' => 8,
    'Θ' | 'θ' => 9,
    'Ι' | 'Ἰ' | 'ι' | 'ί' | 'ῖ' | 'ἰ' | 'ΐ' | 'ϊ' | 'ἴ' | 'ἱ' | 'ἵ' => 10,
    'Κ' | 'κ' => 20,
    'Λ' | 'λ' => 30,
    'Μ' | 'μ' => 40,
    'Ν' | 'Ͷ' | 'ͷ' | 'ν' => 50,
    'Ξ' | 'ξ' => 60,
    'Ο' | 'Ὀ' | 'ο' | 'ό' | 'ὀ' | 'ὁ' | 'ὄ' => 70,
    'Π' | 'π' => 80,
    'Ϙ' | 'ϙ' => 90,
    'Ρ' | 'Ῥ' | 'ρ' => 100,
    'Σ' | 'σ' => 200,
    'Τ' | 'τ' => 300,
    'Υ' | 'υ' | 'ύ' | 'ὐ' | 'ῦ' | 'ὔ' | 'ϋ' | 'ὑ' | 'ΰ' | 'ὕ' => 400,
    'Φ' | 'φ' => 500,
    'Χ' | 'χ' => 600,
    'Ψ' | 'ψ' => 700,
    'Ω' | 'Ὠ' | 'ω' | 'ώ' | 'ῶ' | 'ὡ' => 800,
    'Ϡ' | 'ϡ' => 900,
    _ => return None,
  };

  Some(value)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn calculates_known_values() {
    assert_eq!(calculate("Ἀφροδίτη"), Ok(993));
    assert_eq!(calculate("Ͷιχανους"), Ok(1187));
  }

  #[test]
  fn empty_word_is_zero() {
    assert_eq!(calculate(""), Ok(0));
  }

  #[test]
  fn rejects_non_greek_characters() {
    assert_eq!(calculate("Freddy"), Err(BadCharacter { ch: 'F' }));
  }
}
