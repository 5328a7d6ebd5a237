use nom::Needed;

use crate::frame_types::PacketClass;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The declared payload is shorter than the fields the detected subtype requires.
    /// Nothing past `available` has been read.
    #[error("Frame truncated: {needed} bytes needed, {available} available")]
    Truncated { needed: usize, available: usize },

    /// The capture layer reported a class that isn't management, control or data,
    /// or the frame control carries the reserved type.
    #[error("Frame class can't be classified: {:?}", .0)]
    UnknownClass(Option<PacketClass>),

    #[error("There wasn't enough data. {}", .0)]
    Incomplete(String),

    #[error("A parsing failure occurred: {}", .0)]
    Failure(String),
}

impl Error {
    /// Truncation and nom incompleteness are the same condition seen from two sides.
    pub fn is_truncated(&self) -> bool {
        matches!(self, Error::Truncated { .. } | Error::Incomplete(_))
    }
}

impl From<nom::Err<nom::error::Error<&[u8]>>> for Error {
    /// Convert nom errors into owned ones so no borrow of the frame escapes.
    fn from(error: nom::Err<nom::error::Error<&[u8]>>) -> Self {
        match error {
            nom::Err::Incomplete(needed) => match needed {
                Needed::Size(size) => {
                    Error::Incomplete(format!("At least {size} bytes are missing"))
                }
                Needed::Unknown => Error::Incomplete(String::new()),
            },
            nom::Err::Error(error) | nom::Err::Failure(error) => {
                if error.code == nom::error::ErrorKind::Eof {
                    Error::Incomplete(format!("{} bytes left", error.input.len()))
                } else {
                    Error::Failure(format!("nom::ErrorKind is {:?}", error.code))
                }
            }
        }
    }
}
