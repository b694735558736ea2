use serde::Deserialize;

/// Post-processing switches for [`super::AtnDeserializer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DeserializationOptions {
    /// Check structural invariants after decoding.
    pub verify_atn: bool,
    /// Add a bypass alternative to every parser rule (see
    /// [`super::generate_rule_bypass_transitions`]).
    pub generate_rule_bypass_transitions: bool,
}

impl Default for DeserializationOptions {
    fn default() -> Self {
        DeserializationOptions {
            verify_atn: true,
            generate_rule_bypass_transitions: false,
        }
    }
}
