use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProjectionError {
    #[error("props list mixes allow entries ({allow}) with deny entries ({deny})")]
    MixedModes { allow: String, deny: String },

    #[error("empty property pattern at index {0}")]
    EmptyPattern(usize),
}
