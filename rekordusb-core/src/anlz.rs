//! ANLZ file parsing (.DAT, .EXT, .2EX)
//!
//! ANLZ files are big-endian streams of tagged sections following a "PMAI"
//! file header. Each section carries a 12-byte header (type tag, section
//! header length, total section length); unknown types are skipped and a
//! zero-length or oversized section terminates the walk, keeping whatever
//! decoded before it.
//!
//! Reference: https://djl-analysis.deepsymmetry.org/rekordbox-export-analysis/anlz.html

use std::path::Path;

use tracing::{debug, info, warn};

use crate::bytes::{read_u16_be, read_u32_be, read_u8, slice_at};
use crate::error::{Error, ErrorKind, Result};
use crate::string::utf16be_to_string;
use crate::track::{
    BeatEntry, BeatGrid, CuePoint, CueType, Mood, PhraseEntry, SongStructure, WaveformData,
    WaveformStyle,
};

/// File magic "PMAI"
const MAGIC_PMAI: u32 = 0x504D_4149;

/// Section type tags (big-endian four-character codes)
const SEC_CUE_LIST: u32 = 0x5043_5545; // "PCUE"
const SEC_CUE_LIST2: u32 = 0x5043_5532; // "PCU2"
const SEC_EXT_CUE_LIST: u32 = 0x5043_5832; // "PCX2"
const SEC_BEAT_GRID: u32 = 0x5042_4954; // "PBIT"
const SEC_PATH: u32 = 0x5050_5448; // "PPTH"
const SEC_WAVE_PREVIEW: u32 = 0x5057_4156; // "PWAV"
const SEC_WAVE_TINY: u32 = 0x5057_5632; // "PWV2"
const SEC_WAVE_SCROLL: u32 = 0x5057_5633; // "PWV3"
const SEC_WAVE_COLOR_PREVIEW: u32 = 0x5057_5634; // "PWV4"
const SEC_WAVE_COLOR_SCROLL: u32 = 0x5057_5635; // "PWV5"
const SEC_WAVE_3BAND_PREVIEW: u32 = 0x5057_5636; // "PWV6"
const SEC_WAVE_3BAND_SCROLL: u32 = 0x5057_5637; // "PWV7"
const SEC_SONG_STRUCTURE: u32 = 0x5053_4932; // "PSI2"

/// Cue entry magics
const CUE_ENTRY_PCPT: u32 = 0x5043_5054; // "PCPT"
const CUE_ENTRY_PCP2: u32 = 0x5043_5032; // "PCP2"

/// Song-structure phrase entry size; anything else aborts the section
const PHRASE_ENTRY_BYTES: u32 = 24;

/// Base sequence for the song-structure XOR mask. The working key adds the
/// low byte of the entry count to every element, modulo 256.
const STRUCTURE_MASK: [u8; 19] = [
    0xCB, 0xE1, 0xEE, 0xFA, 0xE5, 0xEE, 0xAD, 0xEE, 0xE9, 0xD2, 0xE9, 0xEB, 0xE1, 0xE9, 0xF3,
    0xE8, 0xE9, 0xF4, 0xE1,
];

/// XOR-unmask a song-structure body in place. Applying the same mask twice
/// restores the original bytes.
pub fn unmask_structure_body(body: &mut [u8], entry_count: u16) {
    let count = entry_count as u8;
    for (i, byte) in body.iter_mut().enumerate() {
        *byte ^= STRUCTURE_MASK[i % STRUCTURE_MASK.len()].wrapping_add(count);
    }
}

/// Everything decoded from one ANLZ file.
#[derive(Debug, Clone, Default)]
pub struct AnlzFile {
    /// Track file path from the PPTH section, if present
    pub path: Option<String>,
    /// Active cue points, sorted by ascending time
    pub cue_points: Vec<CuePoint>,
    /// True when the cue list came from the extended (PCX2) section
    pub cues_extended: bool,
    pub beat_grid: Option<BeatGrid>,
    /// Blue preview waveform (PWAV/PWV2)
    pub waveform_preview: Option<WaveformData>,
    /// Color preview waveform (PWV4, upgraded by PWV6)
    pub color_preview: Option<WaveformData>,
    /// Scrolling detail waveform (PWV3 < PWV5 < PWV7 by quality)
    pub waveform_detail: Option<WaveformData>,
    pub song_structure: Option<SongStructure>,
}

impl AnlzFile {
    /// Read and parse an ANLZ file from disk.
    pub fn open(path: &Path) -> Result<Self> {
        let data = std::fs::read(path).map_err(|e| Error::from_io(e, path))?;
        let anlz = Self::parse(&data).map_err(|e| {
            Error::new(e.kind, format!("{}: {}", path.display(), e.message))
        })?;
        info!(
            path = %path.display(),
            cues = anlz.cue_points.len(),
            beats = anlz.beat_grid.as_ref().map_or(0, |g| g.len()),
            "parsed ANLZ file"
        );
        Ok(anlz)
    }

    /// Parse an ANLZ stream already held in memory.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 28 {
            return Err(Error::new(
                ErrorKind::InvalidFileFormat,
                format!("{} bytes is too small for an ANLZ header", data.len()),
            ));
        }

        let magic = read_u32_be(data, 0).unwrap_or(0);
        if magic != MAGIC_PMAI {
            return Err(Error::new(
                ErrorKind::InvalidFileFormat,
                format!("bad ANLZ magic {magic:08X}"),
            ));
        }

        let mut anlz = AnlzFile::default();
        let header_len = read_u32_be(data, 4).unwrap_or(0) as usize;
        let mut offset = header_len;

        while offset + 12 <= data.len() {
            let section_type = read_u32_be(data, offset).unwrap_or(0);
            let section_header_len = read_u32_be(data, offset + 4).unwrap_or(0) as usize;
            let section_len = read_u32_be(data, offset + 8).unwrap_or(0) as usize;

            if section_len == 0 || offset + section_len > data.len() {
                warn!(
                    tag = %format!("{section_type:08X}"),
                    offset, section_len, "malformed section length; stopping walk"
                );
                break;
            }

            let body = if section_header_len <= section_len {
                &data[offset + section_header_len..offset + section_len]
            } else {
                &[]
            };

            anlz.dispatch_section(section_type, body);
            offset += section_len;
        }

        anlz.cue_points.sort_by_key(|cue| cue.time_ms);
        Ok(anlz)
    }

    fn dispatch_section(&mut self, section_type: u32, body: &[u8]) {
        match section_type {
            SEC_CUE_LIST | SEC_CUE_LIST2 => self.parse_cue_list(body, false),
            SEC_EXT_CUE_LIST => self.parse_cue_list(body, true),
            SEC_BEAT_GRID => {
                if self.beat_grid.is_none() {
                    self.beat_grid = parse_beat_grid(body);
                }
            }
            SEC_PATH => {
                if self.path.is_none() {
                    self.path = parse_path(body);
                }
            }
            SEC_WAVE_PREVIEW | SEC_WAVE_TINY => {
                if self.waveform_preview.is_none() {
                    self.waveform_preview = parse_blue_preview(body);
                }
            }
            SEC_WAVE_SCROLL => {
                self.upgrade_detail(parse_framed_waveform(body, WaveformStyle::Blue));
            }
            SEC_WAVE_COLOR_PREVIEW => {
                self.upgrade_color_preview(parse_framed_waveform(body, WaveformStyle::Rgb));
            }
            SEC_WAVE_COLOR_SCROLL => {
                self.upgrade_detail(parse_framed_waveform(body, WaveformStyle::Rgb));
            }
            SEC_WAVE_3BAND_PREVIEW => {
                self.upgrade_color_preview(parse_three_band(body));
            }
            SEC_WAVE_3BAND_SCROLL => {
                self.upgrade_detail(parse_three_band(body));
            }
            SEC_SONG_STRUCTURE => {
                if self.song_structure.is_none() {
                    self.song_structure = parse_song_structure(body);
                }
            }
            other => {
                debug!(tag = %format!("{other:08X}"), "skipping unknown section");
            }
        }
    }

    /// Extended cue lists replace standard ones; a standard list never
    /// overrides extended data already present.
    fn parse_cue_list(&mut self, body: &[u8], extended: bool) {
        if self.cues_extended && !extended {
            return;
        }
        if extended && !self.cues_extended {
            self.cue_points.clear();
            self.cues_extended = true;
        }

        let Some(entry_count) = read_u32_be(body, 0) else {
            return;
        };

        let mut offset = 4usize;
        for _ in 0..entry_count {
            if offset + 12 > body.len() {
                break;
            }
            let entry_magic = read_u32_be(body, offset).unwrap_or(0);
            let entry_len = read_u32_be(body, offset + 8).unwrap_or(0) as usize;

            if entry_len == 0 || offset + entry_len > body.len() {
                break;
            }
            if entry_magic != CUE_ENTRY_PCPT && entry_magic != CUE_ENTRY_PCP2 {
                offset += entry_len;
                continue;
            }

            let entry = &body[offset..offset + entry_len];
            if let Some(cue) = parse_cue_entry(entry, extended) {
                if cue.active {
                    self.cue_points.push(cue);
                }
            }

            offset += entry_len;
        }
    }

    fn upgrade_detail(&mut self, candidate: Option<WaveformData>) {
        let Some(candidate) = candidate else { return };
        match &self.waveform_detail {
            Some(existing) if existing.style >= candidate.style => {}
            _ => self.waveform_detail = Some(candidate),
        }
    }

    fn upgrade_color_preview(&mut self, candidate: Option<WaveformData>) {
        let Some(candidate) = candidate else { return };
        match &self.color_preview {
            Some(existing) if existing.style >= candidate.style => {}
            _ => self.color_preview = Some(candidate),
        }
    }
}

/// Decode one PCPT/PCP2 cue entry. Field offsets are relative to the entry
/// start; entries too short for the standard fields are dropped.
fn parse_cue_entry(entry: &[u8], extended: bool) -> Option<CuePoint> {
    if entry.len() < 44 {
        return None;
    }

    let mut cue = CuePoint {
        hot_cue_number: read_u32_be(entry, 12)? as u8,
        active: read_u32_be(entry, 16)? != 0,
        cue_type: CueType::from_raw(read_u8(entry, 32)?),
        time_ms: read_u32_be(entry, 36)?,
        loop_time_ms: read_u32_be(entry, 40)?,
        ..Default::default()
    };

    if extended {
        cue.color_id = read_u8(entry, 44).unwrap_or(0);
        if entry.len() > 60 {
            let comment_len = read_u32_be(entry, 56).unwrap_or(0) as usize;
            if comment_len > 0 {
                cue.comment = utf16be_to_string(slice_at(entry, 60, comment_len));
            }
        }
    }

    Some(cue)
}

/// PBIT: 4 reserved bytes, beat count, then 8-byte entries.
fn parse_beat_grid(body: &[u8]) -> Option<BeatGrid> {
    let count = read_u32_be(body, 4)? as usize;
    let mut beats = Vec::with_capacity(count.min(body.len() / 8));

    for i in 0..count {
        let base = 8 + i * 8;
        let Some(beat_number) = read_u16_be(body, base) else {
            break;
        };
        let Some(tempo_100) = read_u16_be(body, base + 2) else {
            break;
        };
        let Some(time_ms) = read_u32_be(body, base + 4) else {
            break;
        };
        beats.push(BeatEntry {
            beat_number,
            tempo_100,
            time_ms,
        });
    }

    Some(BeatGrid { beats })
}

/// PPTH: u32 byte length, then UTF-16BE path data.
fn parse_path(body: &[u8]) -> Option<String> {
    let byte_len = read_u32_be(body, 0)? as usize;
    if byte_len == 0 || 4 + byte_len > body.len() {
        return None;
    }
    Some(utf16be_to_string(&body[4..4 + byte_len]))
}

/// PWAV/PWV2: u32 data length, u32 reserved, then one byte per column.
fn parse_blue_preview(body: &[u8]) -> Option<WaveformData> {
    let data_len = read_u32_be(body, 0)? as usize;
    let available = body.len().saturating_sub(8);
    let take = data_len.min(available);
    if take == 0 {
        return None;
    }
    Some(WaveformData::new(
        WaveformStyle::Blue,
        1,
        body[8..8 + take].to_vec(),
    ))
}

/// PWV3/PWV4/PWV5: u32 bytes-per-entry, u32 entry count, u32 reserved,
/// then the payload.
fn parse_framed_waveform(body: &[u8], style: WaveformStyle) -> Option<WaveformData> {
    let bytes_per_entry = read_u32_be(body, 0)? as usize;
    let entry_count = read_u32_be(body, 4)? as usize;
    if bytes_per_entry == 0 {
        return None;
    }
    let wanted = bytes_per_entry.checked_mul(entry_count)?;
    let available = body.len().saturating_sub(12);
    let take = wanted.min(available) / bytes_per_entry * bytes_per_entry;
    if take == 0 {
        return None;
    }
    Some(WaveformData::new(
        style,
        bytes_per_entry,
        body[12..12 + take].to_vec(),
    ))
}

/// PWV6/PWV7: u32 bytes-per-entry, u32 entry count, then the payload
/// (no reserved word).
fn parse_three_band(body: &[u8]) -> Option<WaveformData> {
    let bytes_per_entry = read_u32_be(body, 0)? as usize;
    let entry_count = read_u32_be(body, 4)? as usize;
    if bytes_per_entry == 0 {
        return None;
    }
    let wanted = bytes_per_entry.checked_mul(entry_count)?;
    let available = body.len().saturating_sub(8);
    let take = wanted.min(available) / bytes_per_entry * bytes_per_entry;
    if take == 0 {
        return None;
    }
    Some(WaveformData::new(
        WaveformStyle::ThreeBand,
        bytes_per_entry,
        body[8..8 + take].to_vec(),
    ))
}

/// PSI2: entry size word, entry count, then the (possibly masked) body
/// proper with mood, end beat, bank, and 24-byte phrase entries.
fn parse_song_structure(body: &[u8]) -> Option<SongStructure> {
    let entry_bytes = read_u32_be(body, 0)?;
    if entry_bytes != PHRASE_ENTRY_BYTES {
        warn!(entry_bytes, "unexpected song-structure entry size; skipping");
        return None;
    }
    let entry_count = read_u16_be(body, 4)?;

    let mut proper = body.get(6..)?.to_vec();
    if proper.len() < 14 {
        return None;
    }

    // Files written by newer rekordbox versions mask the body; a raw mood
    // outside the valid range is the tell.
    let raw_mood = u16::from_be_bytes([proper[0], proper[1]]);
    if raw_mood > 20 {
        unmask_structure_body(&mut proper, entry_count);
    }

    let mood_value = u16::from_be_bytes([proper[0], proper[1]]);
    let Some(mood) = Mood::from_raw(mood_value) else {
        warn!(mood = mood_value, "song structure mood out of range; skipping");
        return None;
    };

    let end_beat = u16::from_be_bytes([proper[8], proper[9]]);
    let bank = proper[12];

    let mut phrases = Vec::with_capacity(entry_count as usize);
    for i in 0..entry_count as usize {
        let base = 14 + i * PHRASE_ENTRY_BYTES as usize;
        let Some(entry) = proper.get(base..base + PHRASE_ENTRY_BYTES as usize) else {
            break;
        };
        phrases.push(PhraseEntry {
            index: u16::from_be_bytes([entry[0], entry[1]]),
            beat: u16::from_be_bytes([entry[2], entry[3]]),
            kind: u16::from_be_bytes([entry[4], entry[5]]),
            end_beat: 0,
            k1: entry[7],
            k2: entry[9],
            k3: entry[19],
            fill: entry[21],
            fill_beat: u16::from_be_bytes([entry[22], entry[23]]),
        });
    }

    // Each phrase ends where its successor starts; the last one runs to the
    // structure-level end beat.
    for i in 0..phrases.len() {
        phrases[i].end_beat = if i + 1 < phrases.len() {
            phrases[i + 1].beat
        } else {
            end_beat
        };
    }

    Some(SongStructure {
        mood,
        bank,
        end_beat,
        phrases,
    })
}
