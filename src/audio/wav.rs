//! Strict 16-bit PCM WAV container codec.
//!
//! The loader walks the container fields in file order: it verifies the
//! `RIFF`/`WAVE` magic, scans past unknown chunks by their declared length,
//! validates the mandatory `fmt ` chunk (size 16 or 18, PCM, 16-bit) and
//! then reads the `data` chunk into an [`AudioBuffer`].  Anything that does
//! not match is rejected with an error naming the offending field and the
//! file path — no partial buffer is ever returned.
//!
//! The writer always emits the canonical 44-byte header (16-byte `fmt `
//! chunk, compression code 1), so `load(save(buf))` reproduces `buf`
//! bit-for-bit for any 16-bit PCM buffer.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::audio::AudioBuffer;

// ---------------------------------------------------------------------------
// WavError
// ---------------------------------------------------------------------------

/// Container-format and I/O errors raised by the WAV codec.
///
/// Every variant carries the file path so batch mode can report which input
/// failed while the remaining files continue processing.
#[derive(Debug, Error)]
pub enum WavError {
    #[error("couldn't open WAV file '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error while reading WAV file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("'{magic}' wasn't found in header of WAV file '{path}'")]
    BadMagic { magic: &'static str, path: PathBuf },

    #[error("'{chunk}' chunk wasn't found in WAV file '{path}'")]
    MissingChunk { chunk: &'static str, path: PathBuf },

    #[error("format chunk size was {found} instead of 16 or 18 in WAV file '{path}'")]
    FormatChunkSize { found: u32, path: PathBuf },

    #[error("format type was {found} instead of 1 (PCM) in WAV file '{path}'")]
    FormatType { found: u16, path: PathBuf },

    #[error("bits per sample was {found} instead of 16 in WAV file '{path}'")]
    BitsPerSample { found: u16, path: PathBuf },

    #[error("channel count was 0 in WAV file '{path}'")]
    ZeroChannels { path: PathBuf },

    #[error(
        "data chunk size {found} is not a whole number of {channels}-channel \
         frames in WAV file '{path}'"
    )]
    DataSize {
        found: u32,
        channels: u16,
        path: PathBuf,
    },

    #[error("couldn't write WAV file '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

// ---------------------------------------------------------------------------
// Field readers
// ---------------------------------------------------------------------------

fn read_u16(r: &mut impl Read) -> io::Result<u16> {
    let mut b = [0u8; 2];
    r.read_exact(&mut b)?;
    Ok(u16::from_le_bytes(b))
}

fn read_u32(r: &mut impl Read) -> io::Result<u32> {
    let mut b = [0u8; 4];
    r.read_exact(&mut b)?;
    Ok(u32::from_le_bytes(b))
}

fn read_tag(r: &mut impl Read) -> io::Result<[u8; 4]> {
    let mut b = [0u8; 4];
    r.read_exact(&mut b)?;
    Ok(b)
}

/// Scan forward over chunks until one named `wanted` is found, leaving the
/// reader positioned just past the chunk id.  Chunks are discovered by
/// scanning, not by fixed offset, so writers that insert `LIST`, `fact` or
/// other chunks still parse.
fn seek_chunk<R: Read + Seek>(
    r: &mut R,
    wanted: &'static [u8; 4],
    wanted_name: &'static str,
    path: &Path,
) -> Result<(), WavError> {
    loop {
        let tag = match read_tag(r) {
            Ok(tag) => tag,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                return Err(WavError::MissingChunk {
                    chunk: wanted_name,
                    path: path.to_path_buf(),
                });
            }
            Err(e) => {
                return Err(WavError::Io {
                    path: path.to_path_buf(),
                    source: e,
                });
            }
        };
        if &tag == wanted {
            return Ok(());
        }
        let chunk_size = read_u32(r).map_err(|e| io_or_missing(e, wanted_name, path))?;
        r.seek(SeekFrom::Current(chunk_size as i64))
            .map_err(|e| WavError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;
    }
}

/// A short read inside a chunk body means the chunk we were looking for is
/// effectively absent.
fn io_or_missing(e: io::Error, chunk: &'static str, path: &Path) -> WavError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        WavError::MissingChunk {
            chunk,
            path: path.to_path_buf(),
        }
    } else {
        WavError::Io {
            path: path.to_path_buf(),
            source: e,
        }
    }
}

// ---------------------------------------------------------------------------
// load
// ---------------------------------------------------------------------------

/// Load a 16-bit PCM WAV file into an [`AudioBuffer`].
///
/// # Errors
///
/// Any magic/field violation is rejected with a [`WavError`] naming the
/// failing field and the path; see the module docs for the accepted layout.
pub fn load(path: impl AsRef<Path>) -> Result<AudioBuffer, WavError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| WavError::Open {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut r = BufReader::new(file);

    let io_err = |e: io::Error| io_or_missing(e, "data", path);

    // A short read on a magic field reports that magic as absent, the same
    // way a wrong value does.
    let magic_err = |e: io::Error, magic: &'static str| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            WavError::BadMagic {
                magic,
                path: path.to_path_buf(),
            }
        } else {
            WavError::Io {
                path: path.to_path_buf(),
                source: e,
            }
        }
    };

    let riff = read_tag(&mut r).map_err(|e| magic_err(e, "RIFF"))?;
    if &riff != b"RIFF" {
        return Err(WavError::BadMagic {
            magic: "RIFF",
            path: path.to_path_buf(),
        });
    }
    let _file_size_minus_eight = read_u32(&mut r).map_err(|e| magic_err(e, "WAVE"))?;
    let wave = read_tag(&mut r).map_err(|e| magic_err(e, "WAVE"))?;
    if &wave != b"WAVE" {
        return Err(WavError::BadMagic {
            magic: "WAVE",
            path: path.to_path_buf(),
        });
    }

    // fmt chunk: mandatory, validated field by field.
    seek_chunk(&mut r, b"fmt ", "fmt ", path)?;
    let fmt_err = |e: io::Error| io_or_missing(e, "fmt ", path);
    let format_chunk_size = read_u32(&mut r).map_err(fmt_err)?;
    if format_chunk_size != 16 && format_chunk_size != 18 {
        return Err(WavError::FormatChunkSize {
            found: format_chunk_size,
            path: path.to_path_buf(),
        });
    }
    let format_type = read_u16(&mut r).map_err(fmt_err)?;
    if format_type != 1 {
        return Err(WavError::FormatType {
            found: format_type,
            path: path.to_path_buf(),
        });
    }
    let channels = read_u16(&mut r).map_err(fmt_err)?;
    if channels == 0 {
        return Err(WavError::ZeroChannels {
            path: path.to_path_buf(),
        });
    }
    let sample_rate = read_u32(&mut r).map_err(fmt_err)?;
    let _bytes_per_second = read_u32(&mut r).map_err(fmt_err)?;
    let _bytes_per_frame = read_u16(&mut r).map_err(fmt_err)?;
    let bits_per_sample = read_u16(&mut r).map_err(fmt_err)?;
    if bits_per_sample != 16 {
        return Err(WavError::BitsPerSample {
            found: bits_per_sample,
            path: path.to_path_buf(),
        });
    }
    if format_chunk_size == 18 {
        // Extension size field of the 18-byte fmt variant; always skipped.
        let _extension_size = read_u16(&mut r).map_err(fmt_err)?;
    }

    // data chunk: everything after it is ignored.
    seek_chunk(&mut r, b"data", "data", path)?;
    let data_size = read_u32(&mut r).map_err(io_err)?;
    if data_size % (channels as u32 * 2) != 0 {
        return Err(WavError::DataSize {
            found: data_size,
            channels,
            path: path.to_path_buf(),
        });
    }
    let mut raw = vec![0u8; data_size as usize];
    r.read_exact(&mut raw).map_err(io_err)?;

    let samples: Vec<i16> = raw
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]))
        .collect();

    Ok(AudioBuffer::from_samples(sample_rate, channels, samples))
}

// ---------------------------------------------------------------------------
// save
// ---------------------------------------------------------------------------

/// Write `buffer` to `path` with the canonical 44-byte WAV header.
///
/// The `fmt ` chunk is always 16 bytes (never the 18-byte variant), the
/// compression code is 1 (PCM) and the RIFF size is the total file size
/// minus eight.
pub fn save(path: impl AsRef<Path>, buffer: &AudioBuffer) -> Result<(), WavError> {
    let path = path.as_ref();

    const HEADER_BYTES: u32 = 44;
    const SAMPLE_BYTES: u32 = 2;
    let channels = buffer.channels() as u32;
    let num_samples = buffer.samples().len() as u32;
    let data_bytes = num_samples * SAMPLE_BYTES;
    let bytes_per_second = buffer.sample_rate() * SAMPLE_BYTES * channels;
    let bytes_per_frame = (SAMPLE_BYTES * channels) as u16;
    let file_size = HEADER_BYTES + data_bytes;

    let write_err = |e: io::Error| WavError::Write {
        path: path.to_path_buf(),
        source: e,
    };

    let file = File::create(path).map_err(write_err)?;
    let mut w = BufWriter::new(file);

    let mut put = |bytes: &[u8]| w.write_all(bytes).map_err(write_err);

    put(b"RIFF")?;
    put(&(file_size - 8).to_le_bytes())?;
    put(b"WAVE")?;

    put(b"fmt ")?;
    put(&16u32.to_le_bytes())?;
    put(&1u16.to_le_bytes())?;
    put(&buffer.channels().to_le_bytes())?;
    put(&buffer.sample_rate().to_le_bytes())?;
    put(&bytes_per_second.to_le_bytes())?;
    put(&bytes_per_frame.to_le_bytes())?;
    put(&16u16.to_le_bytes())?;

    put(b"data")?;
    put(&data_bytes.to_le_bytes())?;
    for sample in buffer.samples() {
        put(&sample.to_le_bytes())?;
    }

    w.flush().map_err(write_err)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
