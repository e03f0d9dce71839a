//! A streaming disassembler for WebAssembly modules in the binary format.
//!
//! The [`reader::BinaryReader`] decodes a module incrementally: it is handed
//! whatever bytes are available and reports one structural event per call to
//! [`read`](reader::BinaryReader::read), asking for more bytes when an item is
//! cut off. The [`dis::WasmDisassembler`] turns those events into the
//! WebAssembly [text format], and the resolvers in [`names`] decide how
//! functions, locals and other entities are named in the output.
//!
//! The simplest entry point is the [`disassemble()`] function; use
//! [`disassemble_chunked()`] to feed a module in pieces of a fixed size.
//!
//! [text format]: https://webassembly.github.io/spec/core/text/index.html
#![forbid(unsafe_code)]

pub mod dis;
pub mod integer;
pub mod names;
pub mod opcode;
pub mod reader;
pub mod types;

pub use dis::{DisassembleError, DisassemblerResult, LabelMode, WasmDisassembler};
pub use names::{DevToolsNameGenerator, NameResolver, NameSectionReader};
pub use reader::{BinaryReader, BinaryReaderState, DecodeError};

use std::io::{self, ErrorKind, Read};
use thiserror::Error;

/// Chunk size used by [`disassemble()`].
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Disassembles the module read from `input` with default settings.
///
/// # Examples
///
/// ```
/// let module = b"\0asm\x01\x00\x00\x00";
/// let text = wadis::disassemble(&module[..]).unwrap();
/// assert_eq!(text, "(module\n)\n");
/// ```
pub fn disassemble(input: impl Read) -> Result<String, DisassembleModuleError> {
    let mut disassembler = WasmDisassembler::new();
    let result = disassemble_chunked(input, &mut disassembler, DEFAULT_CHUNK_SIZE)?;
    Ok(render(&result))
}

/// Streams `input` through `disassembler`, `chunk_size` bytes at a time.
///
/// Bytes the reader has fully consumed are dropped from the front of the
/// buffer before the next chunk is appended, so memory use stays bounded by
/// the largest item in the module rather than the module itself.
pub fn disassemble_chunked(
    mut input: impl Read,
    disassembler: &mut WasmDisassembler,
    chunk_size: usize,
) -> Result<DisassemblerResult, DisassembleModuleError> {
    let mut reader = BinaryReader::new();
    let mut output = DisassemblerResult {
        offsets: disassembler.add_offsets().then(Vec::new),
        function_body_offsets: disassembler.add_offsets().then(Vec::new),
        ..DisassemblerResult::default()
    };
    let mut chunk = vec![0; chunk_size.max(1)];
    let mut pending = Vec::new();
    let mut consumed = 0;

    loop {
        let n = read_chunk(&mut input, &mut chunk)?;
        let eof = n == 0;
        pending.extend_from_slice(&chunk[..n]);

        let length = pending.len();
        reader.set_data(pending, 0, length, eof);
        let done = disassembler.disassemble_chunk(&mut reader, consumed)?;
        merge(&mut output, disassembler.get_result());

        if done {
            output.done = true;
            return Ok(output);
        }
        if eof {
            return Err(DisassembleError::UnexpectedEnd.into());
        }

        let position = reader.position();
        pending = reader.take_data().unwrap_or_default();
        pending.drain(..position);
        consumed += position;
    }
}

/// Joins result lines into module text, with `;; @offset` comments when
/// offsets were recorded.
pub fn render(result: &DisassemblerResult) -> String {
    let mut text = String::new();
    for (i, line) in result.lines.iter().enumerate() {
        text.push_str(line);
        if let Some(offset) = result.offsets.as_ref().and_then(|offsets| offsets.get(i)) {
            text.push_str(&format!(" ;; @{offset:04x}"));
        }
        text.push('\n');
    }
    text
}

fn read_chunk(input: &mut impl Read, chunk: &mut [u8]) -> io::Result<usize> {
    loop {
        match input.read(chunk) {
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            result => return result,
        }
    }
}

fn merge(output: &mut DisassemblerResult, result: DisassemblerResult) {
    output.lines.extend(result.lines);
    if let (Some(all), Some(new)) = (&mut output.offsets, result.offsets) {
        all.extend(new);
    }
    if let (Some(all), Some(new)) = (
        &mut output.function_body_offsets,
        result.function_body_offsets,
    ) {
        all.extend(new);
    }
}

#[derive(Debug, Error)]
pub enum DisassembleModuleError {
    #[error("failed reading module bytes")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Disassemble(#[from] DisassembleError),
}

impl From<DecodeError> for DisassembleModuleError {
    fn from(err: DecodeError) -> Self {
        DisassembleModuleError::Disassemble(err.into())
    }
}
