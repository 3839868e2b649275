use std::path::PathBuf;

/// Error type for loading and looking up definitions
#[derive(Debug)]
pub enum DefinitionError {
    /// The definitions file could not be read
    Io { path: PathBuf, source: std::io::Error },
    /// The definitions file is not well-formed XML
    Xml { path: PathBuf, source: roxmltree::Error },
    /// A root child element had the wrong name
    UnexpectedElement { path: PathBuf, expected: &'static str, found: String },
    /// An attribute was present but could not be parsed
    InvalidAttribute { element: String, attribute: String, value: String },
    /// A <Direction> element had no <Animation> child
    MissingAnimation { group: String },
    /// A lookup by name found nothing
    NotFound { kind: &'static str, name: String },
}

impl std::fmt::Display for DefinitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DefinitionError::Io { path, source } => {
                write!(f, "failed to open required definitions file \"{}\": {}", path.display(), source)
            }
            DefinitionError::Xml { path, source } => {
                write!(f, "malformed XML in \"{}\": {}", path.display(), source)
            }
            DefinitionError::UnexpectedElement { path, expected, found } => write!(
                f,
                "root child element in {} was <{}>, must be <{}>",
                path.display(),
                found,
                expected
            ),
            DefinitionError::InvalidAttribute { element, attribute, value } => write!(
                f,
                "invalid value \"{}\" for attribute `{}` on <{}>",
                value, attribute, element
            ),
            DefinitionError::MissingAnimation { group } => {
                write!(f, "could not find animation element for a direction of group \"{}\"", group)
            }
            DefinitionError::NotFound { kind, name } => write!(f, "no {} named \"{}\"", kind, name),
        }
    }
}

impl std::error::Error for DefinitionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DefinitionError::Io { source, .. } => Some(source),
            DefinitionError::Xml { source, .. } => Some(source),
            _ => None,
        }
    }
}
