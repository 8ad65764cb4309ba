//! End-to-end extraction tests on synthetic legacy recordings.

#![allow(clippy::unwrap_used)]

use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use ndarray::Array2;
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tetspike::config::Config;
use tetspike::error::Result;
use tetspike::grouping::{QualityTable, assign_groups};
use tetspike::pipeline::process_tetrode;
use tetspike::recording::Recording;
use tetspike::signal::{Filter, LocallyExclusiveDetector};

const RECORD_MARKER: [u8; 10] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 255];
const BLOCK: usize = 64;
const FRAMES: usize = 1024;

/// Filter stand-in that leaves traces untouched, making detection exact.
struct IdentityFilter;

impl Filter for IdentityFilter {
    fn apply(&self, _traces: &mut Array2<f32>, _sample_rate: f32) -> Result<()> {
        Ok(())
    }
}

fn write_continuous(dir: &Path, channel: usize, samples: &[i16]) {
    assert_eq!(samples.len() % BLOCK, 0);

    let path = dir.join(format!("100_CH{}.continuous", channel + 1));
    let mut file = File::create(path).unwrap();

    let mut header = format!(
        "header.format = 'Open Ephys Data Format'; \nheader.version = 0.4;\nheader.header_bytes = 1024;\nheader.channel = 'CH{}';\nheader.sampleRate = 30000.0;\nheader.blockLength = {BLOCK};\nheader.bitVolts = 0.195;\n",
        channel + 1
    )
    .into_bytes();
    header.resize(1024, b' ');
    file.write_all(&header).unwrap();

    for (index, block) in samples.chunks(BLOCK).enumerate() {
        file.write_i64::<LittleEndian>((index * BLOCK) as i64).unwrap();
        file.write_u16::<LittleEndian>(BLOCK as u16).unwrap();
        file.write_u16::<LittleEndian>(0).unwrap();
        for &sample in block {
            file.write_i16::<BigEndian>(sample).unwrap();
        }
        file.write_all(&RECORD_MARKER).unwrap();
    }
}

fn write_probes(dir: &Path) {
    std::fs::write(
        dir.join("tet4_probe.prb"),
        r"
# 4-wire tetrode, 10x10 um square
channel_groups = {
    0: {
        'channels': [0, 1, 2, 3],
        'geometry': {
            0: (0.0, 0.0),
            1: (10.0, 0.0),
            2: (0.0, 10.0),
            3: (10.0, 10.0),
        }
    }
}
",
    )
    .unwrap();

    std::fs::write(
        dir.join("tet3_probe.prb"),
        r"
channel_groups = {
    0: {
        'channels': [0, 1, 2],
        'geometry': {
            0: (0.0, 0.0),
            1: (10.0, 0.0),
            2: (0.0, 10.0),
        }
    }
}
",
    )
    .unwrap();
}

/// Alternating background with MAD 10, plus impulses at (sample, amplitude).
fn channel_samples(impulses: &[(usize, i16)]) -> Vec<i16> {
    let mut samples: Vec<i16> = (0..FRAMES)
        .map(|t| if t % 2 == 0 { 10 } else { -10 })
        .collect();
    for &(at, amplitude) in impulses {
        samples[at] = amplitude;
    }
    samples
}

struct Fixture {
    _dir: TempDir,
    config: Config,
}

/// Two-tetrode rig: 8 channels, tetrode 1 on channels 0-3, tetrode 2 on 4-7.
fn fixture(quality_rows: &[&str], impulses: &HashMap<usize, Vec<(usize, i16)>>) -> Fixture {
    let dir = TempDir::new().unwrap();
    let input_dir = dir.path().join("recording");
    let output_dir = dir.path().join("out");
    let probe_dir = dir.path().join("probes");
    std::fs::create_dir_all(&input_dir).unwrap();
    std::fs::create_dir_all(&output_dir).unwrap();
    std::fs::create_dir_all(&probe_dir).unwrap();

    for channel in 0..8 {
        let empty = Vec::new();
        let channel_impulses = impulses.get(&channel).unwrap_or(&empty);
        write_continuous(&input_dir, channel, &channel_samples(channel_impulses));
    }

    write_probes(&probe_dir);

    let quality_path = input_dir.join("KKtetlist.txt");
    std::fs::write(&quality_path, quality_rows.join("\n")).unwrap();

    let config = Config {
        input_dir,
        output_dir,
        probe_dir,
        channel_quality_path: PathBuf::from("KKtetlist.txt"),
        tetrode_selection: vec![1, 2],
        wiring_map: vec![0, 0, 0, 0, 1, 1, 1, 1],
        progress: false,
        ..Config::default()
    };

    Fixture { _dir: dir, config }
}

/// Minimal MAT 5 reader for the files the crate writes.
fn read_mat_vars(path: &Path) -> HashMap<String, (Vec<i32>, u32, Vec<u8>)> {
    let bytes = std::fs::read(path).unwrap();
    assert!(bytes.starts_with(b"MATLAB 5.0 MAT-file"));

    let tag = |offset: usize| {
        let data_type = u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap());
        let size = u32::from_le_bytes(bytes[offset + 4..offset + 8].try_into().unwrap());
        (data_type, size as usize)
    };
    let padded = |n: usize| n.div_ceil(8) * 8;

    let mut vars = HashMap::new();
    let mut offset = 128;
    while offset < bytes.len() {
        let (element_type, element_size) = tag(offset);
        assert_eq!(element_type, 14, "expected miMATRIX");
        let element_end = offset + 8 + element_size;
        let mut cursor = offset + 8;

        let (_, flags_size) = tag(cursor);
        cursor += 8 + padded(flags_size);

        let (_, dims_size) = tag(cursor);
        let dims: Vec<i32> = (0..dims_size / 4)
            .map(|i| {
                let at = cursor + 8 + i * 4;
                i32::from_le_bytes(bytes[at..at + 4].try_into().unwrap())
            })
            .collect();
        cursor += 8 + padded(dims_size);

        let (_, name_size) = tag(cursor);
        let name =
            String::from_utf8(bytes[cursor + 8..cursor + 8 + name_size].to_vec()).unwrap();
        cursor += 8 + padded(name_size);

        let (data_type, data_size) = tag(cursor);
        let data = bytes[cursor + 8..cursor + 8 + data_size].to_vec();

        vars.insert(name, (dims, data_type, data));
        offset = element_end;
    }
    vars
}

fn timestamps_of(vars: &HashMap<String, (Vec<i32>, u32, Vec<u8>)>) -> Vec<i64> {
    let (dims, data_type, data) = &vars["Timestamps"];
    assert_eq!(dims[0], 1);
    assert_eq!(*data_type, 12, "Timestamps must be miINT64");
    data.chunks(8)
        .map(|chunk| i64::from_le_bytes(chunk.try_into().unwrap()))
        .collect()
}

fn spike_at(
    vars: &HashMap<String, (Vec<i32>, u32, Vec<u8>)>,
    sample: usize,
    channel: usize,
    peak: usize,
) -> i16 {
    let (dims, data_type, data) = &vars["Spikes"];
    assert_eq!(*data_type, 3, "Spikes must be miINT16");
    let samples = usize::try_from(dims[0]).unwrap();
    let channels = usize::try_from(dims[1]).unwrap();
    let index = sample + samples * channel + samples * channels * peak;
    i16::from_le_bytes(data[index * 2..index * 2 + 2].try_into().unwrap())
}

fn run_tetrode(fixture: &Fixture, tetrode: u8) -> Option<tetspike::pipeline::TetrodeResult> {
    let table = QualityTable::load(&fixture.config.quality_table_path()).unwrap();
    let groups = assign_groups(&fixture.config.wiring_map, &table).unwrap();
    let recording = Recording::open(&fixture.config.input_dir).unwrap();
    let detector = LocallyExclusiveDetector::new(&fixture.config.detection);

    process_tetrode(
        &recording,
        &groups,
        tetrode,
        &fixture.config,
        &IdentityFilter,
        &detector,
    )
    .unwrap()
}

#[test]
fn test_impulse_extracted_with_peak_at_row_8() {
    let impulses = HashMap::from([(1usize, vec![(500usize, -2000i16)])]);
    let fixture = fixture(&["1,1,1,1,1", "2,1,1,1,1"], &impulses);

    let result = run_tetrode(&fixture, 1).unwrap();
    assert_eq!(result.peaks, 1);
    assert_eq!(result.output_path, fixture.config.output_dir.join("tt1.mat"));

    let vars = read_mat_vars(&result.output_path);
    let timestamps = timestamps_of(&vars);
    assert_eq!(timestamps, vec![500]);

    let (dims, _, _) = &vars["Spikes"];
    assert_eq!(dims, &[32, 4, 1]);

    // The impulse sits at output row 8 on wire 1.
    assert_eq!(spike_at(&vars, 8, 1, 0), -2000);
    // Neighboring rows carry the background, not zeros.
    assert_eq!(spike_at(&vars, 7, 1, 0), -10);
    assert_eq!(spike_at(&vars, 9, 1, 0), -10);
}

#[test]
fn test_window_past_end_is_zero_block_with_timestamp_kept() {
    let late = FRAMES - 10;
    let impulses = HashMap::from([(0usize, vec![(500, -2000i16), (late, -2000i16)])]);
    let fixture = fixture(&["1,1,1,1,1", "2,1,1,1,1"], &impulses);

    let result = run_tetrode(&fixture, 1).unwrap();
    assert_eq!(result.peaks, 2);

    let vars = read_mat_vars(&result.output_path);
    let timestamps = timestamps_of(&vars);
    assert_eq!(timestamps, vec![500, i64::try_from(late).unwrap()]);

    // Complete window for the first peak, all-zero block for the late one.
    assert_eq!(spike_at(&vars, 8, 0, 0), -2000);
    for sample in 0..32 {
        for channel in 0..4 {
            assert_eq!(spike_at(&vars, sample, channel, 1), 0);
        }
    }
}

#[test]
fn test_tetrode_with_two_good_wires_is_skipped() {
    // Tetrode 2 loses wires 0 and 1.
    let fixture = fixture(&["1,1,1,1,1", "2,0,0,1,1"], &HashMap::new());

    let result = run_tetrode(&fixture, 2);
    assert!(result.is_none());
    assert!(!fixture.config.output_dir.join("tt2.mat").exists());
}

#[test]
fn test_three_wire_tetrode_uses_three_channel_blocks() {
    // Tetrode 1 loses wire 3 (physical channel 3); impulse on wire 0.
    let impulses = HashMap::from([(0usize, vec![(500usize, -2000i16)])]);
    let fixture = fixture(&["1,1,1,1,0", "2,1,1,1,1"], &impulses);

    let result = run_tetrode(&fixture, 1).unwrap();
    let vars = read_mat_vars(&result.output_path);
    let (dims, _, _) = &vars["Spikes"];
    assert_eq!(dims, &[32, 3, 1]);
    assert_eq!(spike_at(&vars, 8, 0, 0), -2000);
}

#[test]
fn test_no_peaks_still_writes_empty_stack() {
    let fixture = fixture(&["1,1,1,1,1", "2,1,1,1,1"], &HashMap::new());

    let result = run_tetrode(&fixture, 1).unwrap();
    assert_eq!(result.peaks, 0);

    let vars = read_mat_vars(&result.output_path);
    assert!(timestamps_of(&vars).is_empty());
    let (dims, _, _) = &vars["Spikes"];
    assert_eq!(dims, &[32, 4, 0]);
}

#[test]
fn test_extract_with_bandpass_finds_injected_spike() {
    // Full pipeline including the real filter: a sharp negative deflection
    // rides on an in-band 2 kHz tone.
    let dir = TempDir::new().unwrap();
    let input_dir = dir.path().join("recording");
    let output_dir = dir.path().join("out");
    let probe_dir = dir.path().join("probes");
    std::fs::create_dir_all(&input_dir).unwrap();
    std::fs::create_dir_all(&probe_dir).unwrap();

    let frames = 4096;
    for channel in 0..8 {
        let mut samples: Vec<i16> = (0..frames)
            .map(|t| {
                let phase = std::f32::consts::TAU * 2000.0 * t as f32 / 30_000.0;
                (20.0 * phase.sin()) as i16
            })
            .collect();
        if channel == 1 {
            samples[2000] = -2000;
        }
        write_continuous(&input_dir, channel, &samples);
    }
    write_probes(&probe_dir);
    std::fs::write(input_dir.join("KKtetlist.txt"), "1,1,1,1,1\n2,1,1,1,1\n").unwrap();

    let config = Config {
        input_dir,
        output_dir: output_dir.clone(),
        probe_dir,
        channel_quality_path: PathBuf::from("KKtetlist.txt"),
        tetrode_selection: vec![1],
        wiring_map: vec![0, 0, 0, 0, 1, 1, 1, 1],
        progress: false,
        ..Config::default()
    };

    tetspike::extract(&config).unwrap();

    let output_path = output_dir.join("tt1.mat");
    assert!(output_path.exists());

    let vars = read_mat_vars(&output_path);
    let timestamps = timestamps_of(&vars);
    assert!(
        timestamps.iter().any(|&t| (t - 2000).abs() <= 2),
        "no timestamp near the injected spike: {timestamps:?}"
    );
    assert!(
        timestamps.iter().all(|&t| (t - 2000).abs() <= 20),
        "spurious detections far from the injected spike: {timestamps:?}"
    );
}

#[test]
fn test_missing_quality_table_aborts_run() {
    let fixture = fixture(&["1,1,1,1,1", "2,1,1,1,1"], &HashMap::new());
    let mut config = fixture.config.clone();
    config.channel_quality_path = PathBuf::from("missing.txt");

    let result = tetspike::extract(&config);
    assert!(result.is_err());
}

#[test]
fn test_channel_count_mismatch_aborts_run() {
    let fixture = fixture(&["1,1,1,1,1", "2,1,1,1,1"], &HashMap::new());
    let mut config = fixture.config.clone();
    // Wiring map for a 32-channel drive against an 8-channel recording.
    config.wiring_map = tetspike::constants::DEFAULT_WIRING_MAP.to_vec();
    config.tetrode_selection = vec![1];

    let result = tetspike::extract(&config);
    assert!(matches!(
        result,
        Err(tetspike::Error::ChannelCountMismatch { found: 8, expected: 32 })
    ));
}
