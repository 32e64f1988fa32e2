use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("{parser} is missing required column '{column}'")]
    MissingColumn {
        parser: &'static str,
        column: &'static str,
    },

    #[error("{parser} expected a crossing column and at least one reading column, found {found} non-date columns")]
    MissingReadingColumns { parser: &'static str, found: usize },

    #[error("{parser} header invalid: {message}")]
    InvalidHeader {
        parser: &'static str,
        message: String,
    },

    #[error("{parser} CSV error: {source}")]
    Csv {
        parser: &'static str,
        #[source]
        source: csv::Error,
    },

    #[error("{parser} validation error: {message}")]
    Validation {
        parser: &'static str,
        message: String,
    },

    #[error("{parser} file did not contain any data rows")]
    EmptyData { parser: &'static str },
}

impl ParserError {
    pub(crate) fn csv(parser: &'static str, source: csv::Error) -> Self {
        ParserError::Csv { parser, source }
    }
}
