//! Explicit result type for cache reads

/// Outcome of reading from an optional cache tier
///
/// Keeps "no cache configured" and "no entry" apart, and both apart from
/// a present-but-empty value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    /// Entry present
    Found(T),
    /// Tier configured, no entry for the key
    Missing,
    /// No tier configured
    Disabled,
}

impl<T> Lookup<T> {
    /// Convert into an `Option`, folding both absent cases into `None`
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::Missing | Self::Disabled => None,
        }
    }

    /// Whether an entry was found
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

impl<T> From<Option<T>> for Lookup<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Self::Found(value),
            None => Self::Missing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_cases_are_distinct() {
        let missing: Lookup<Vec<String>> = None.into();
        assert_eq!(missing, Lookup::Missing);
        assert_ne!(missing, Lookup::Disabled);
        assert_ne!(Lookup::Found(vec![]), Lookup::<Vec<String>>::Missing);
    }

    #[test]
    fn found_into_option() {
        assert_eq!(Lookup::Found(3).found(), Some(3));
        assert_eq!(Lookup::<i32>::Disabled.found(), None);
        assert!(!Lookup::<i32>::Missing.is_found());
    }
}
