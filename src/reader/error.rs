use super::BinaryReaderState;
use crate::integer::{DecodeI32Error, DecodeI64Error, DecodeU32Error, DecodeU64Error};
use crate::opcode::OperatorCode;
use crate::types::{
    InvalidExternalKindError, InvalidRelocTypeError, InvalidSectionIdError,
};
use thiserror::Error;

/// Malformed input. Once returned by [`BinaryReader::read`], the same error
/// is returned by every later call.
///
/// [`BinaryReader::read`]: super::BinaryReader::read
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DecodeError {
    #[error("bad magic number: expected 0x6D736100; got {0:#010X}")]
    BadMagicNumber(u32),

    #[error("bad version number: expected 0x1 or 0xD; got {0:#X}")]
    BadVersion(u32),

    #[error(transparent)]
    InvalidSectionId(#[from] InvalidSectionIdError),

    #[error(transparent)]
    InvalidExternalKind(#[from] InvalidExternalKindError),

    #[error(transparent)]
    InvalidRelocType(#[from] InvalidRelocTypeError),

    #[error("unknown type form: {0:#04X}")]
    UnknownTypeForm(u8),

    #[error("unknown type code: {0}")]
    UnknownType(i32),

    #[error("unknown heap type: {0}")]
    UnknownHeapType(i64),

    #[error("unknown operator: {0}")]
    UnknownOperator(OperatorCode),

    #[error("unknown operator: {prefix:#04x} {sub_opcode:#x}")]
    UnknownPrefixedOperator { prefix: u8, sub_opcode: u32 },

    #[error("unsupported element segment flags: {0:#X}")]
    BadElementSegmentFlags(u32),

    #[error("unsupported element kind: {0:#04X}")]
    BadElementKind(u8),

    #[error("unsupported data segment flags: {0:#X}")]
    BadDataSegmentFlags(u32),

    #[error("bad linking type: {0}")]
    BadLinkingType(u32),

    #[error("{0:?} is not a valid state for this operation")]
    UnexpectedState(BinaryReaderState),

    #[error("failed decoding varuint32")]
    DecodeU32(#[from] DecodeU32Error),

    #[error("failed decoding varuint64")]
    DecodeU64(#[from] DecodeU64Error),

    #[error("failed decoding varint32")]
    DecodeI32(#[from] DecodeI32Error),

    #[error("failed decoding varint64")]
    DecodeI64(#[from] DecodeI64Error),
}

/// Why a decoding step could not complete.
#[derive(Debug)]
pub(crate) enum ReadFailure {
    /// The structure runs past the end of the current view; the step is
    /// retried once more bytes arrive.
    NeedMoreData,
    Malformed(DecodeError),
}

impl From<DecodeError> for ReadFailure {
    fn from(err: DecodeError) -> Self {
        ReadFailure::Malformed(err)
    }
}

macro_rules! impl_from_integer_error {
    ($($err:ident),*) => {
        $(
            impl From<$err> for ReadFailure {
                fn from(err: $err) -> Self {
                    match err {
                        $err::UnexpectedEnd => ReadFailure::NeedMoreData,
                        err => ReadFailure::Malformed(err.into()),
                    }
                }
            }
        )*
    };
}

impl_from_integer_error!(DecodeU32Error, DecodeU64Error, DecodeI32Error, DecodeI64Error);

macro_rules! impl_from_marker_error {
    ($($err:ident),*) => {
        $(
            impl From<$err> for ReadFailure {
                fn from(err: $err) -> Self {
                    ReadFailure::Malformed(err.into())
                }
            }
        )*
    };
}

impl_from_marker_error!(InvalidSectionIdError, InvalidExternalKindError, InvalidRelocTypeError);
