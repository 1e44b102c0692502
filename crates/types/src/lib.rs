/// Errors that can occur when creating validated identifier types.
#[derive(Debug, thiserror::Error)]
pub enum IdentifierError {
    /// The input was empty or contained only whitespace
    #[error("Identifier cannot be empty")]
    Empty,
}

/// An enterprise-wide patient identifier (ICN).
///
/// This type wraps a `String` and guarantees it contains at least one
/// non-whitespace character. The input is trimmed of leading and trailing
/// whitespace during construction. An ICN is meaningful across every site;
/// site-local identifiers (DFNs) are plain strings resolved per site.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Icn(String);

impl Icn {
    /// Creates a new `Icn` from the given input.
    ///
    /// The input is trimmed of leading and trailing whitespace. If the trimmed
    /// result is empty, an error is returned.
    pub fn new(input: impl AsRef<str>) -> Result<Self, IdentifierError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(IdentifierError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Icn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Icn {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for Icn {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for Icn {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Icn::new(&s).map_err(serde::de::Error::custom)
    }
}
