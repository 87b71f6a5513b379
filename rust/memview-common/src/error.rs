use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    #[cold]
    pub fn out_of_bounds(offset: u64, length: u64, capacity: u64) -> Error {
        ErrorKind::OutOfBounds {
            offset,
            length,
            capacity,
        }
        .into()
    }

    #[cold]
    pub fn illegal_overlap(source_offset: u64, destination_offset: u64, length: u64) -> Error {
        ErrorKind::IllegalOverlap {
            source_offset,
            destination_offset,
            length,
        }
        .into()
    }

    pub fn allocation(size: u64, source: std::io::Error) -> Error {
        ErrorKind::AllocationFailure { size, source }.into()
    }

    pub fn mapping(
        path: impl Into<PathBuf>,
        offset: u64,
        length: Option<u64>,
        reason: impl Into<String>,
        source: Option<std::io::Error>,
    ) -> Error {
        ErrorKind::MappingFailure {
            path: path.into(),
            offset,
            length,
            reason: reason.into(),
            source,
        }
        .into()
    }

    #[cold]
    pub fn use_after_release() -> Error {
        ErrorKind::UseAfterRelease.into()
    }

    pub fn unsupported_platform(reason: impl Into<String>) -> Error {
        ErrorKind::UnsupportedPlatform {
            reason: reason.into(),
        }
        .into()
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        ErrorKind::InvalidArgument {
            name: name.into(),
            message: message.into(),
        }
        .into()
    }

    pub fn invalid_format(element: impl Into<String>, message: impl Into<String>) -> Error {
        ErrorKind::InvalidFormat {
            element: element.into(),
            message: message.into(),
        }
        .into()
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Error {
        ErrorKind::Io {
            context: context.into(),
            source,
        }
        .into()
    }

    pub fn is_out_of_bounds(&self) -> bool {
        matches!(self.kind(), ErrorKind::OutOfBounds { .. })
    }

    pub fn is_illegal_overlap(&self) -> bool {
        matches!(self.kind(), ErrorKind::IllegalOverlap { .. })
    }

    pub fn is_use_after_release(&self) -> bool {
        matches!(self.kind(), ErrorKind::UseAfterRelease)
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("access out of bounds: offset {offset}, length {length}, capacity {capacity}")]
    OutOfBounds {
        offset: u64,
        length: u64,
        capacity: u64,
    },

    #[error(
        "illegal overlapping copy: source offset {source_offset}, \
         destination offset {destination_offset}, length {length}"
    )]
    IllegalOverlap {
        source_offset: u64,
        destination_offset: u64,
        length: u64,
    },

    #[error("failed to allocate {size} bytes: {source}")]
    AllocationFailure { size: u64, source: std::io::Error },

    #[error(
        "failed to map '{}' at offset {offset}, {}: {reason}",
        path.display(),
        describe_length(length)
    )]
    MappingFailure {
        path: PathBuf,
        offset: u64,
        /// `None` when the range runs to the end of the file and the file length is
        /// not known.
        length: Option<u64>,
        reason: String,
        source: Option<std::io::Error>,
    },

    #[error("the memory resource has been released")]
    UseAfterRelease,

    #[error("unsupported platform: {reason}")]
    UnsupportedPlatform { reason: String },

    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("invalid data for '{element}': {message}")]
    InvalidFormat { element: String, message: String },

    #[error("IO error for '{context}': {source}")]
    Io {
        context: String,
        source: std::io::Error,
    },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::io("", e)
    }
}

fn describe_length(length: &Option<u64>) -> String {
    match length {
        Some(length) => format!("length {length}"),
        None => "to end of file".to_string(),
    }
}
