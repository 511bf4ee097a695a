use serde::{Deserialize, Deserializer};

/// Field wrapper that keeps "omitted" apart from "explicitly null".
///
/// Use together with `#[serde(default)]` on the containing struct field: a
/// missing key stays [`Presence::Absent`], `null` becomes [`Presence::Null`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presence<T> {
    Absent,
    Null,
    Value(T),
}

impl<T> Default for Presence<T> {
    fn default() -> Self {
        Self::Absent
    }
}

impl<T> Presence<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    pub fn as_ref(&self) -> Presence<&T> {
        match self {
            Self::Absent => Presence::Absent,
            Self::Null => Presence::Null,
            Self::Value(value) => Presence::Value(value),
        }
    }

    /// `None` when absent, `Some(None)` when null, `Some(Some(v))` otherwise.
    pub fn into_option(self) -> Option<Option<T>> {
        match self {
            Self::Absent => None,
            Self::Null => Some(None),
            Self::Value(value) => Some(Some(value)),
        }
    }
}

impl<'de, T> Deserialize<'de> for Presence<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Self::Value(value),
            None => Self::Null,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Body {
        #[serde(default)]
        notes: Presence<String>,
    }

    #[test]
    fn missing_key_is_absent() {
        let body: Body = serde_json::from_str("{}").expect("parse");
        assert!(body.notes.is_absent());
    }

    #[test]
    fn explicit_null_is_kept_apart_from_absent() {
        let body: Body = serde_json::from_str(r#"{"notes": null}"#).expect("parse");
        assert_eq!(body.notes, Presence::Null);
        assert_eq!(body.notes.into_option(), Some(None));
    }

    #[test]
    fn empty_string_is_a_value() {
        let body: Body = serde_json::from_str(r#"{"notes": ""}"#).expect("parse");
        assert_eq!(body.notes, Presence::Value(String::new()));
    }
}
