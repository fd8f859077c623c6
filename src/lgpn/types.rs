use serde::Deserialize;

/// One entry of the LGPN name dataset.
///
/// The validity interval (`notBefore`/`notAfter`) is carried through to the
/// cache untouched; nothing in this crate interprets the bounds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NameRecord {
  pub name: String,
  #[serde(rename = "notBefore")]
  pub not_before: String,
  #[serde(rename = "notAfter")]
  pub not_after: String,
}
