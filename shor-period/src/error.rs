use std::path::PathBuf;

/// Problems with the run configuration. Always detected before the first
/// oracle call, and always fatal.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("base {base} is not supported for modulus {modulus} (supported: {supported:?})")]
    UnsupportedBase {
        base: u64,
        modulus: u64,
        supported: Vec<u64>,
    },

    #[error("base {base} must lie in 2..{modulus} and be coprime to it")]
    InvalidBase { base: u64, modulus: u64 },

    #[error("modulus {0} must be a composite number")]
    InvalidModulus(u64),

    #[error("precision {0} out of range (1..=32 bits)")]
    PrecisionOutOfRange(u32),

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures of a phase oracle. Fatal for the run that hit them.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OracleError {
    #[error("oracle produces {expected}-bit samples, {requested} bits requested")]
    PrecisionMismatch { expected: u32, requested: u32 },

    #[error("scripted oracle has no samples")]
    EmptyScript,

    #[error("phase {phase} is not a multiple of 2^-{precision}")]
    UnrepresentablePhase { phase: f64, precision: u32 },

    #[error("{0:?} is not a bit string")]
    InvalidBits(String),

    #[error("sample precision {0} out of range (1..=32 bits)")]
    InvalidPrecision(u32),

    #[error("sample value {value} does not fit in {precision} bits")]
    SampleOutOfRange { value: u64, precision: u32 },

    #[error("precision {0} too large to tabulate the outcome distribution (max 16)")]
    DistributionTooLarge(u32),

    #[error("could not determine the order of {base} modulo {modulus}")]
    UnknownOrder { base: u64, modulus: u64 },
}

/// Anything that aborts a controller run.
#[derive(Debug, thiserror::Error)]
pub enum ShorError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("oracle error: {0}")]
    Oracle(#[from] OracleError),
}
