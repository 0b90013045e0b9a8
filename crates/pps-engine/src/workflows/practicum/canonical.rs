use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Fold a free-text label into its comparison form: lowercase, trimmed, diacritics removed.
pub fn canonicalize(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .nfd()
        .filter(|ch| !is_combining_mark(*ch))
        .collect()
}

/// Practicum focus area. Labels are canonicalized once when parsed, so two areas compare
/// equal whenever their source labels differ only in case, accents, or padding. Only the
/// portal's four orientation labels map to named variants; any other label, including
/// near-synonyms such as "Educativa", is a distinct `Other` area.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SpecialtyArea {
    Clinical,
    Educational,
    Labor,
    Community,
    /// Unrecognized label kept as its own bucket, stored in canonical form.
    Other(String),
}

impl SpecialtyArea {
    /// Parse a raw label. Blank labels carry no area.
    pub fn parse(raw: &str) -> Option<Self> {
        let key = canonicalize(raw);
        let area = match key.as_str() {
            "" => return None,
            "clinica" => Self::Clinical,
            "educacional" => Self::Educational,
            "laboral" => Self::Labor,
            "comunitaria" => Self::Community,
            _ => Self::Other(key),
        };
        Some(area)
    }

    /// Canonical key; parsing it yields the same area.
    pub fn label(&self) -> &str {
        match self {
            SpecialtyArea::Clinical => "clinica",
            SpecialtyArea::Educational => "educacional",
            SpecialtyArea::Labor => "laboral",
            SpecialtyArea::Community => "comunitaria",
            SpecialtyArea::Other(key) => key,
        }
    }
}

impl fmt::Display for SpecialtyArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for SpecialtyArea {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for SpecialtyArea {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        SpecialtyArea::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom("specialty area must not be blank"))
    }
}

/// Deserialize an optional area where blank strings mean "no area".
pub(crate) fn deserialize_optional_area<'de, D>(
    deserializer: D,
) -> Result<Option<SpecialtyArea>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(SpecialtyArea::parse))
}
