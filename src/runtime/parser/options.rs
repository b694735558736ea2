use serde::Deserialize;

/// Parser switches, usually loaded through [`crate::runtime::config::Loader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ParserOptions {
    /// Link contexts and tokens into a parse tree while parsing.
    pub build_parse_trees: bool,
    /// Release spare child capacity as each rule exits.
    pub trim_parse_trees: bool,
    /// Emit `trace` events for rule entry, exit and every consumed token.
    pub trace: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        ParserOptions {
            build_parse_trees: true,
            trim_parse_trees: false,
            trace: false,
        }
    }
}
