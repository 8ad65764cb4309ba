//! Open Ephys legacy `.continuous` file reading.
//!
//! Each channel of the legacy acquisition format lives in its own file:
//! a 1024-byte ASCII header (`header.key = value;` lines) followed by fixed
//! records of a little-endian i64 timestamp, u16 sample count, u16 recording
//! number, the samples as big-endian i16, and a 10-byte record marker.

use crate::error::{Error, Result};
use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// Size of the ASCII header prefix in bytes.
pub const HEADER_BYTES: u64 = 1024;

/// Bytes of record metadata preceding the samples.
const RECORD_PREFIX_BYTES: u64 = 8 + 2 + 2;

/// Marker trailing every data record.
const RECORD_MARKER: [u8; 10] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 255];

/// Parsed `.continuous` file header.
#[derive(Debug, Clone)]
pub struct Header {
    /// Sampling rate in Hz.
    pub sample_rate: f32,
    /// Samples per data record.
    pub block_length: usize,
    /// Microvolts per ADC count, when present.
    pub bit_volts: Option<f32>,
    /// Channel name as recorded by the acquisition software.
    pub channel_name: Option<String>,
}

/// One channel file of a legacy recording.
#[derive(Debug, Clone)]
pub struct ChannelFile {
    /// Path of the `.continuous` file.
    pub path: PathBuf,
    /// Channel number parsed from the file name (`*_CH<n>.continuous`).
    pub number: u32,
    /// Parsed header.
    pub header: Header,
    /// Total sample count derived from the file size.
    pub num_samples: usize,
}

impl ChannelFile {
    /// Open a channel file, parse its header, and size its record region.
    pub fn open(path: &Path, number: u32) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::RecordingOpen {
            path: path.to_path_buf(),
            source: e,
        })?;
        let file_len = file
            .metadata()
            .map_err(|e| Error::RecordingOpen {
                path: path.to_path_buf(),
                source: e,
            })?
            .len();

        let mut reader = BufReader::new(file);
        let header = read_header(path, &mut reader)?;

        let record_bytes = record_size_bytes(header.block_length);
        let data_len = file_len.saturating_sub(HEADER_BYTES);
        if data_len % record_bytes != 0 {
            return Err(Error::ContinuousRecord {
                path: path.to_path_buf(),
                offset: HEADER_BYTES + (data_len / record_bytes) * record_bytes,
                message: format!(
                    "trailing {} bytes do not form a whole record",
                    data_len % record_bytes
                ),
            });
        }

        #[allow(clippy::cast_possible_truncation)]
        let num_samples = (data_len / record_bytes) as usize * header.block_length;

        Ok(Self {
            path: path.to_path_buf(),
            number,
            header,
            num_samples,
        })
    }

    /// Read all samples of this channel as raw ADC counts.
    pub fn read_samples(&self) -> Result<Vec<i16>> {
        let file = File::open(&self.path).map_err(|e| Error::RecordingOpen {
            path: self.path.clone(),
            source: e,
        })?;
        let mut reader = BufReader::new(file);

        let mut header_bytes = [0u8; HEADER_BYTES as usize];
        reader.read_exact(&mut header_bytes)?;

        let mut samples = Vec::with_capacity(self.num_samples);
        let mut offset = HEADER_BYTES;
        while samples.len() < self.num_samples {
            let n = read_record(&self.path, &mut reader, offset, &mut samples)?;
            offset += record_size_bytes(n);
        }

        Ok(samples)
    }
}

fn record_size_bytes(block_length: usize) -> u64 {
    RECORD_PREFIX_BYTES + 2 * block_length as u64 + RECORD_MARKER.len() as u64
}

/// Read and validate one data record, appending its samples.
///
/// Returns the record's sample count.
fn read_record<R: Read>(
    path: &Path,
    reader: &mut R,
    offset: u64,
    samples: &mut Vec<i16>,
) -> Result<usize> {
    let record_err = |message: String| Error::ContinuousRecord {
        path: path.to_path_buf(),
        offset,
        message,
    };

    let _timestamp = reader
        .read_i64::<LittleEndian>()
        .map_err(|e| record_err(format!("truncated timestamp: {e}")))?;
    let count = reader
        .read_u16::<LittleEndian>()
        .map_err(|e| record_err(format!("truncated sample count: {e}")))?;
    let _recording_number = reader
        .read_u16::<LittleEndian>()
        .map_err(|e| record_err(format!("truncated recording number: {e}")))?;

    if count == 0 {
        return Err(record_err("record claims zero samples".to_string()));
    }

    for _ in 0..count {
        let sample = reader
            .read_i16::<BigEndian>()
            .map_err(|e| record_err(format!("truncated sample data: {e}")))?;
        samples.push(sample);
    }

    let mut marker = [0u8; RECORD_MARKER.len()];
    reader
        .read_exact(&mut marker)
        .map_err(|e| record_err(format!("truncated record marker: {e}")))?;
    if marker != RECORD_MARKER {
        return Err(record_err("bad record marker".to_string()));
    }

    Ok(usize::from(count))
}

/// Parse the 1024-byte ASCII header.
fn read_header<R: Read>(path: &Path, reader: &mut R) -> Result<Header> {
    let mut bytes = [0u8; HEADER_BYTES as usize];
    reader
        .read_exact(&mut bytes)
        .map_err(|_| Error::ContinuousHeader {
            path: path.to_path_buf(),
            message: format!("file shorter than the {HEADER_BYTES}-byte header"),
        })?;

    let text = String::from_utf8_lossy(&bytes);
    let mut sample_rate = None;
    let mut block_length = None;
    let mut bit_volts = None;
    let mut channel_name = None;

    // Statements are `header.key = value;` pairs, newline formatting varies.
    for statement in text.split(';') {
        let Some((key, value)) = statement.split_once('=') else {
            continue;
        };
        let Some(key) = key.trim().strip_prefix("header.") else {
            continue;
        };
        let value = value.trim().trim_matches('\'').trim_matches('"');

        match key {
            "sampleRate" => sample_rate = value.parse::<f32>().ok(),
            "blockLength" => block_length = value.parse::<usize>().ok(),
            "bitVolts" => bit_volts = value.parse::<f32>().ok(),
            "channel" => channel_name = Some(value.to_string()),
            _ => {}
        }
    }

    let sample_rate = sample_rate.ok_or_else(|| Error::ContinuousHeader {
        path: path.to_path_buf(),
        message: "missing or invalid header.sampleRate".to_string(),
    })?;
    let block_length = block_length.ok_or_else(|| Error::ContinuousHeader {
        path: path.to_path_buf(),
        message: "missing or invalid header.blockLength".to_string(),
    })?;
    if block_length == 0 {
        return Err(Error::ContinuousHeader {
            path: path.to_path_buf(),
            message: "header.blockLength is zero".to_string(),
        });
    }

    Ok(Header {
        sample_rate,
        block_length,
        bit_volts,
        channel_name,
    })
}

/// Parse the channel number out of a `*_CHn.continuous` file name.
///
/// Returns `None` for non-neural channels (AUX, ADC) and unrelated files.
pub fn channel_number(file_name: &str) -> Option<u32> {
    let stem = file_name.strip_suffix(".continuous")?;
    let position = stem.rfind("_CH")?;
    let digits = &stem[position + 3..];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
