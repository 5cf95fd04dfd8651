//! Error taxonomy for registration, invocation, container views and configuration.
//!
//! Resolution and conversion failures are not errors: they surface as `None`,
//! `false` or an invalid `Variant`. The enums here carry the reason for the
//! failures that callers may want to inspect.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    DuplicateType { name: String },
    DuplicateProperty { ty: String, name: String },
    DuplicateMethod { ty: String, name: String },
    DuplicateEnumEntry { ty: String, name: String },
    DuplicateBase { ty: String, base: String },
    UnregisteredType { context: String, name: String },
    AmbiguousBase { derived: String, base: String },
    CyclicHierarchy { chain: Vec<String> },
    ConstructorType { ty: String, found: String },
    InvalidDefaultArgument { ty: String, member: String, index: usize },
    AlreadyFrozen,
    NestedRegistration,
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateType { name } => {
                write!(f, "Type '{}' is registered twice", name)
            }
            Self::DuplicateProperty { ty, name } => {
                write!(f, "Property '{}' is declared twice on {}", name, ty)
            }
            Self::DuplicateMethod { ty, name } => {
                write!(f, "Method '{}' with identical parameters is declared twice on {}", name, ty)
            }
            Self::DuplicateEnumEntry { ty, name } => {
                write!(f, "Enumeration {} declares entry '{}' twice", ty, name)
            }
            Self::DuplicateBase { ty, base } => {
                write!(f, "Type {} lists base {} twice", ty, base)
            }
            Self::UnregisteredType { context, name } => {
                write!(f, "Unregistered type {} referenced by {}", name, context)
            }
            Self::AmbiguousBase { derived, base } => {
                write!(f, "Base {} is reachable from {} through distinct subobjects", base, derived)
            }
            Self::CyclicHierarchy { chain } => {
                write!(f, "Cyclic inheritance: {}", chain.join(" -> "))
            }
            Self::ConstructorType { ty, found } => {
                write!(f, "Constructor registered on {} returns {}", ty, found)
            }
            Self::InvalidDefaultArgument { ty, member, index } => {
                write!(f, "Default argument {} of {}::{} does not match the parameter type", index, ty, member)
            }
            Self::AlreadyFrozen => {
                write!(f, "The type registry is frozen; registration is closed")
            }
            Self::NestedRegistration => {
                write!(f, "Registration was re-entered from inside a registration closure")
            }
        }
    }
}

impl std::error::Error for RegistrationError {}

/// Every misconfiguration found while building a registry.
///
/// Registration keeps going after the first problem so that a single freeze
/// reports all of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationErrors {
    errors: Vec<RegistrationError>,
}

impl RegistrationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, error: RegistrationError) {
        self.errors.push(error);
    }

    pub fn extend(&mut self, errors: impl IntoIterator<Item = RegistrationError>) {
        self.errors.extend(errors);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[RegistrationError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<RegistrationError> {
        self.errors
    }
}

impl From<RegistrationError> for RegistrationErrors {
    fn from(error: RegistrationError) -> Self {
        Self { errors: vec![error] }
    }
}

impl fmt::Display for RegistrationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} registration error(s)", self.errors.len())?;
        for error in &self.errors {
            write!(f, "\n  {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for RegistrationErrors {}

/// Why a method or constructor call was refused before or while reaching its target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvokeError {
    NotFrozen,
    UnknownMethod { ty: String, name: String, suggestions: Vec<String> },
    MissingInstance,
    WrongInstanceType { expected: String, found: String },
    ReadOnlyInstance,
    ArgumentCount { min: usize, max: usize, found: usize },
    ArgumentType { index: usize, expected: String, found: String },
    TargetRejected,
}

impl fmt::Display for InvokeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFrozen => write!(f, "The type registry has not been frozen"),
            Self::UnknownMethod { ty, name, suggestions } => {
                write!(f, "Type {} has no method '{}'", ty, name)?;
                if let Some(first) = suggestions.first() {
                    write!(f, " (did you mean '{}'?)", first)?;
                }
                Ok(())
            }
            Self::MissingInstance => write!(f, "A non-static member was called without an instance"),
            Self::WrongInstanceType { expected, found } => {
                write!(f, "Instance of {} cannot be viewed as {}", found, expected)
            }
            Self::ReadOnlyInstance => {
                write!(f, "A mutating member needs a mutable instance")
            }
            Self::ArgumentCount { min, max, found } if min == max => {
                write!(f, "Invalid argument count: expected {}, found {}", max, found)
            }
            Self::ArgumentCount { min, max, found } => {
                write!(f, "Invalid argument count: expected {}..={}, found {}", min, max, found)
            }
            Self::ArgumentType { index, expected, found } => {
                write!(f, "Invalid type for argument {}: expected {}, found {}", index, expected, found)
            }
            Self::TargetRejected => write!(f, "The erased target rejected its bound arguments"),
        }
    }
}

impl std::error::Error for InvokeError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewError {
    InvalidView,
    ReadOnly,
    IndexOutOfRange { index: usize, len: usize },
    TypeMismatch { expected: String, found: String },
    Unsupported(&'static str),
}

impl fmt::Display for ViewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidView => write!(f, "The view does not refer to a container"),
            Self::ReadOnly => write!(f, "The view is read-only"),
            Self::IndexOutOfRange { index, len } => {
                write!(f, "Index {} is out of range for length {}", index, len)
            }
            Self::TypeMismatch { expected, found } => {
                write!(f, "Type mismatch: expected {}, found {}", expected, found)
            }
            Self::Unsupported(operation) => {
                write!(f, "The container does not support {}", operation)
            }
        }
    }
}

impl std::error::Error for ViewError {}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(String),
    Serialize(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "Failed to read config: {}", e),
            Self::Parse(e) => write!(f, "Failed to parse config: {}", e),
            Self::Serialize(e) => write!(f, "Failed to serialize config: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        Self::Parse(e.to_string())
    }
}

/// Compute Levenshtein distance for "did you mean" suggestions
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    if a_chars.is_empty() { return b_chars.len(); }
    if b_chars.is_empty() { return a_chars.len(); }

    let mut previous: Vec<usize> = (0..=b_chars.len()).collect();
    let mut current = vec![0; b_chars.len() + 1];

    for (i, ca) in a_chars.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != cb);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b_chars.len()]
}

/// Member names close to `target`, nearest first.
pub fn find_similar_names<'a>(
    target: &str,
    candidates: impl IntoIterator<Item = &'a str>,
    max_distance: usize,
) -> Vec<String> {
    let mut results: Vec<(&str, usize)> = candidates
        .into_iter()
        .map(|c| (c, levenshtein_distance(target, c)))
        .filter(|(_, dist)| *dist <= max_distance && *dist > 0)
        .collect();

    results.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));
    results.dedup_by(|a, b| a.0 == b.0);
    results.into_iter().map(|(name, _)| name.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("same", "same"), 0);
    }

    #[test]
    fn test_similar_names() {
        let names = ["length", "lengths", "width", "len"];
        let similar = find_similar_names("lenght", names.iter().copied(), 2);
        assert_eq!(similar.first().map(String::as_str), Some("length"));
        assert!(!similar.contains(&"width".to_string()));
    }

    #[test]
    fn test_registration_errors_display() {
        let mut errors = RegistrationErrors::new();
        errors.add(RegistrationError::DuplicateType { name: "Point".into() });
        errors.add(RegistrationError::CyclicHierarchy {
            chain: vec!["A".into(), "B".into(), "A".into()],
        });
        let text = errors.to_string();
        assert!(text.starts_with("2 registration error(s)"));
        assert!(text.contains("A -> B -> A"));
    }

    #[test]
    fn test_argument_count_display() {
        let exact = InvokeError::ArgumentCount { min: 2, max: 2, found: 1 };
        assert_eq!(exact.to_string(), "Invalid argument count: expected 2, found 1");
        let ranged = InvokeError::ArgumentCount { min: 1, max: 3, found: 0 };
        assert!(ranged.to_string().contains("1..=3"));
    }
}
