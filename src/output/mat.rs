//! MATLAB Level 5 MAT-file writing.
//!
//! Writes exactly the interchange shape the downstream Neuralynx conversion
//! step (`Mat2NlxSpike`) consumes: an int64 `Timestamps` row vector of peak
//! sample indices and an int16 `Spikes` array of shape 32 x channels x peaks,
//! little-endian, column-major as MAT mandates.

use crate::error::{Error, Result};
use byteorder::{LittleEndian, WriteBytesExt};
use ndarray::ArrayView3;
use std::io::Write;
use std::path::Path;

const HEADER_TEXT_BYTES: usize = 116;
const MAT_VERSION: u16 = 0x0100;
const ENDIAN_INDICATOR: &[u8; 2] = b"IM";

// MAT data type tags.
const MI_INT8: u32 = 1;
const MI_INT16: u32 = 3;
const MI_INT32: u32 = 5;
const MI_UINT32: u32 = 6;
const MI_INT64: u32 = 12;
const MI_MATRIX: u32 = 14;

// MAT array class codes.
const MX_INT16_CLASS: u32 = 10;
const MX_INT64_CLASS: u32 = 14;

/// Write one tetrode's peak indices and waveform blocks to a MAT file.
///
/// Any existing file at `path` is overwritten.
pub fn write_spike_file(
    path: &Path,
    timestamps: &[i64],
    spikes: ArrayView3<'_, i16>,
) -> Result<()> {
    let mut contents = Vec::new();
    // Writes into a Vec cannot fail; io::Result is threaded through anyway
    // to keep the encoder generic over Write.
    encode(&mut contents, timestamps, spikes).map_err(|e| Error::MatWrite {
        path: path.to_path_buf(),
        source: e,
    })?;

    std::fs::write(path, contents).map_err(|e| Error::MatWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

fn encode<W: Write>(
    writer: &mut W,
    timestamps: &[i64],
    spikes: ArrayView3<'_, i16>,
) -> std::io::Result<()> {
    write_header(writer)?;
    write_int64_vector(writer, crate::constants::output::TIMESTAMPS_VAR, timestamps)?;
    write_int16_array3(writer, crate::constants::output::SPIKES_VAR, spikes)?;
    Ok(())
}

fn write_header<W: Write>(writer: &mut W) -> std::io::Result<()> {
    let mut text = format!(
        "MATLAB 5.0 MAT-file, created by {} {}",
        crate::constants::APP_NAME,
        env!("CARGO_PKG_VERSION")
    )
    .into_bytes();
    text.truncate(HEADER_TEXT_BYTES);
    text.resize(HEADER_TEXT_BYTES, b' ');
    writer.write_all(&text)?;

    // No subsystem-specific data.
    writer.write_all(&[0u8; 8])?;
    writer.write_u16::<LittleEndian>(MAT_VERSION)?;
    writer.write_all(ENDIAN_INDICATOR)?;
    Ok(())
}

/// `Timestamps`: int64 matrix of dimensions 1 x N.
fn write_int64_vector<W: Write>(
    writer: &mut W,
    name: &str,
    values: &[i64],
) -> std::io::Result<()> {
    let dims = [1i32, i32::try_from(values.len()).unwrap_or(i32::MAX)];
    let body_bytes = matrix_body_bytes(name, &dims, values.len() * 8);

    write_tag(writer, MI_MATRIX, body_bytes)?;
    write_array_flags(writer, MX_INT64_CLASS)?;
    write_dimensions(writer, &dims)?;
    write_name(writer, name)?;

    write_tag(writer, MI_INT64, u32::try_from(values.len() * 8).unwrap_or(u32::MAX))?;
    for &value in values {
        writer.write_i64::<LittleEndian>(value)?;
    }
    write_padding(writer, values.len() * 8)?;
    Ok(())
}

/// `Spikes`: int16 array of dimensions samples x channels x peaks.
fn write_int16_array3<W: Write>(
    writer: &mut W,
    name: &str,
    array: ArrayView3<'_, i16>,
) -> std::io::Result<()> {
    let (samples, channels, peaks) = array.dim();
    let dims = [
        i32::try_from(samples).unwrap_or(i32::MAX),
        i32::try_from(channels).unwrap_or(i32::MAX),
        i32::try_from(peaks).unwrap_or(i32::MAX),
    ];
    let data_bytes = samples * channels * peaks * 2;
    let body_bytes = matrix_body_bytes(name, &dims, data_bytes);

    write_tag(writer, MI_MATRIX, body_bytes)?;
    write_array_flags(writer, MX_INT16_CLASS)?;
    write_dimensions(writer, &dims)?;
    write_name(writer, name)?;

    write_tag(writer, MI_INT16, u32::try_from(data_bytes).unwrap_or(u32::MAX))?;
    // Column-major: the first dimension varies fastest.
    for peak in 0..peaks {
        for channel in 0..channels {
            for sample in 0..samples {
                writer.write_i16::<LittleEndian>(array[[sample, channel, peak]])?;
            }
        }
    }
    write_padding(writer, data_bytes)?;
    Ok(())
}

/// Total body size of a miMATRIX element, tags and padding included.
fn matrix_body_bytes(name: &str, dims: &[i32], data_bytes: usize) -> u32 {
    let flags = 8 + 8;
    let dimensions = 8 + padded(dims.len() * 4);
    let name = 8 + padded(name.len());
    let data = 8 + padded(data_bytes);
    u32::try_from(flags + dimensions + name + data).unwrap_or(u32::MAX)
}

fn padded(bytes: usize) -> usize {
    bytes.div_ceil(8) * 8
}

fn write_tag<W: Write>(writer: &mut W, data_type: u32, bytes: u32) -> std::io::Result<()> {
    writer.write_u32::<LittleEndian>(data_type)?;
    writer.write_u32::<LittleEndian>(bytes)
}

fn write_array_flags<W: Write>(writer: &mut W, class: u32) -> std::io::Result<()> {
    write_tag(writer, MI_UINT32, 8)?;
    writer.write_u32::<LittleEndian>(class)?;
    writer.write_u32::<LittleEndian>(0)
}

fn write_dimensions<W: Write>(writer: &mut W, dims: &[i32]) -> std::io::Result<()> {
    write_tag(writer, MI_INT32, u32::try_from(dims.len() * 4).unwrap_or(u32::MAX))?;
    for &dim in dims {
        writer.write_i32::<LittleEndian>(dim)?;
    }
    write_padding(writer, dims.len() * 4)
}

fn write_name<W: Write>(writer: &mut W, name: &str) -> std::io::Result<()> {
    write_tag(writer, MI_INT8, u32::try_from(name.len()).unwrap_or(u32::MAX))?;
    writer.write_all(name.as_bytes())?;
    write_padding(writer, name.len())
}

fn write_padding<W: Write>(writer: &mut W, written: usize) -> std::io::Result<()> {
    let pad = padded(written) - written;
    writer.write_all(&[0u8; 8][..pad])
}
