//! Template catalogue
//!
//! The closed set of named property templates and the names they are known
//! by in requests.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Template {
    IntegerOverflowUnderflow,
    AlwaysLessThan,
    AlwaysMoreThan,
    AlwaysEqual,
    SelfDestruction,
    Reentrancy,
    TimestampDependence,
    UninitializedStorageVariable,
    SkipEmptyStringLiteral,
    IsAlwaysCalled,
    IsNeverCalled,
    IsExecuted,
    IsSequential,
    AlwaysFollowedBy,
    NeverFollowedBy,
}

impl Template {
    pub const ALL: [Template; 15] = [
        Template::IntegerOverflowUnderflow,
        Template::AlwaysLessThan,
        Template::AlwaysMoreThan,
        Template::AlwaysEqual,
        Template::SelfDestruction,
        Template::Reentrancy,
        Template::TimestampDependence,
        Template::UninitializedStorageVariable,
        Template::SkipEmptyStringLiteral,
        Template::IsAlwaysCalled,
        Template::IsNeverCalled,
        Template::IsExecuted,
        Template::IsSequential,
        Template::AlwaysFollowedBy,
        Template::NeverFollowedBy,
    ];

    /// Every request name accepted for this template
    pub fn names(self) -> &'static [&'static str] {
        match self {
            Template::IntegerOverflowUnderflow => &[
                "Integer Overflow/Underflow",
                "IntegerOverflowUnderflow",
                "under_over_flow",
            ],
            Template::AlwaysLessThan => &["AlwaysLessThan", "Always Less Than"],
            Template::AlwaysMoreThan => &["AlwaysMoreThan", "Always More Than"],
            Template::AlwaysEqual => &["AlwaysEqual", "IsConstant", "Always Equal"],
            Template::SelfDestruction => &["Self Destruction", "SelfDestruction"],
            Template::Reentrancy => &["Reentrancy"],
            Template::TimestampDependence => &[
                "Timestamp Dependance",
                "Timestamp Dependence",
                "TimestampDependence",
            ],
            Template::UninitializedStorageVariable => &[
                "Uninitialized Storage Variable",
                "UninitializedStorageVariable",
            ],
            Template::SkipEmptyStringLiteral => &["Skip Empty String Literal", "SkipEmptyStringLiteral"],
            Template::IsAlwaysCalled => &["IsAlwaysCalled"],
            Template::IsNeverCalled => &["IsNeverCalled"],
            Template::IsExecuted => &["IsExecuted"],
            Template::IsSequential => &["IsSequential"],
            Template::AlwaysFollowedBy => &["AlwaysFollowedBy"],
            Template::NeverFollowedBy => &["NeverFollowedBy"],
        }
    }

    /// Look a template up by any of its names
    pub fn from_name(name: &str) -> Option<Template> {
        let name = name.trim();
        Template::ALL
            .iter()
            .copied()
            .find(|t| t.names().contains(&name))
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases_resolve() {
        assert_eq!(
            Template::from_name("Integer Overflow/Underflow"),
            Some(Template::IntegerOverflowUnderflow)
        );
        assert_eq!(Template::from_name("under_over_flow"), Some(Template::IntegerOverflowUnderflow));
        assert_eq!(Template::from_name("IsConstant"), Some(Template::AlwaysEqual));
        assert_eq!(Template::from_name("Timestamp Dependance"), Some(Template::TimestampDependence));
        assert_eq!(Template::from_name("Buffer Overflow"), None);
    }

    #[test]
    fn test_names_are_unique() {
        let mut seen = Vec::new();
        for template in Template::ALL {
            for name in template.names() {
                assert!(!seen.contains(name), "duplicate name {}", name);
                seen.push(*name);
            }
            assert_eq!(Template::from_name(&template.to_string()), Some(template));
        }
    }
}
