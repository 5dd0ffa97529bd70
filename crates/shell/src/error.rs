// SPDX-License-Identifier: MIT

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenizeError {
    #[error("unterminated {0} quote")]
    UnterminatedQuote(&'static str),

    #[error("command is empty")]
    Empty,
}

#[derive(Debug, Error)]
pub enum ShellError {
    #[error(transparent)]
    Tokenize(#[from] TokenizeError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ShellError>;
