/// Returned when a persisted string does not name any variant of an enum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown variant '{value}' for {kind}. Supported variants are: [{supported}]")]
pub struct ParseVariantError {
    pub value: String,
    pub kind: &'static str,
    pub supported: String,
}
