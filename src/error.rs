use thiserror::Error;

/// Errors that can occur while extracting flow-spec rules from router output.
///
/// A capture containing no recognizable rule blocks is not an error; the
/// recognizers return an empty list for it. These variants cover domain
/// parse failures inside an otherwise well-delimited rule block, which abort
/// the whole extraction rather than silently dropping the malformed rule.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("invalid operator in numeric expression: '{0}'")]
    InvalidOperator(String),

    #[error("invalid bitmask value: '{0}'")]
    InvalidBitmask(String),

    #[error("invalid rate limit unit: '{0}'")]
    InvalidUnit(String),

    #[error("invalid address prefix: '{0}'")]
    InvalidPrefix(String),

    #[error(
        "unsupported platform: '{0}'. Valid platforms are: cisco-ios, juniper-junos, arista-eos"
    )]
    UnsupportedPlatform(String),

    #[error("Counters section appears after Policers section; refusing to merge counters")]
    MisorderedSections,
}
