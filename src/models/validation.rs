use super::node::Language;

/// Reasons a node or segment record cannot be persisted
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    MissingDescription { language: Language },
    ShortTextTooShort { language: Language, min: usize },
    LongTextTooShort { language: Language, min: usize },
    EmptyName,
    TooFewVertices { count: usize },
    NonFiniteCoordinate,
    SameEndpoints,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingDescription { language } => {
                write!(f, "a {language} description is required for points of interest")
            }
            Self::ShortTextTooShort { language, min } => {
                write!(f, "the {language} short text needs at least {min} characters")
            }
            Self::LongTextTooShort { language, min } => {
                write!(f, "the {language} long text needs at least {min} characters")
            }
            Self::EmptyName => write!(f, "a name is required"),
            Self::TooFewVertices { count } => {
                write!(f, "a segment needs at least 2 vertices, got {count}")
            }
            Self::NonFiniteCoordinate => write!(f, "coordinates must be finite numbers"),
            Self::SameEndpoints => write!(f, "a segment cannot loop back to its start node without an interior vertex"),
        }
    }
}

impl std::error::Error for ValidationError {}
