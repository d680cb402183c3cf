//! Identifiers and per-track analysis data structures
//!
//! These are the high-level representations decoded from ANLZ files, plus
//! the typed identifiers used across every index. Identifier spaces are
//! per-kind: a `TrackId` and an `ArtistId` holding the same integer are
//! unrelated.

use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash,
            Serialize, Deserialize,
        )]
        pub struct $name(pub u64);

        impl From<u32> for $name {
            fn from(value: u32) -> Self {
                Self(value as u64)
            }
        }
    };
}

id_type!(TrackId);
id_type!(ArtistId);
id_type!(AlbumId);
id_type!(GenreId);
id_type!(LabelId);
id_type!(KeyId);
id_type!(ColorId);
id_type!(ArtworkId);
id_type!(PlaylistId);
id_type!(
    /// Shared by tags and tag categories; `is_category` partitions the space.
    TagId
);

/// Cue point type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CueType {
    #[default]
    Cue,
    FadeIn,
    FadeOut,
    Load,
    Loop,
}

impl CueType {
    /// Unrecognized type bytes fall back to a plain cue.
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            1 => CueType::FadeIn,
            2 => CueType::FadeOut,
            3 => CueType::Load,
            4 => CueType::Loop,
            _ => CueType::Cue,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CueType::Cue => "cue",
            CueType::FadeIn => "fade_in",
            CueType::FadeOut => "fade_out",
            CueType::Load => "load",
            CueType::Loop => "loop",
        }
    }
}

/// A memory cue, hot cue, or loop from a PCUE/PCU2/PCX2 section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CuePoint {
    /// 0 = memory cue, 1-8 = hot cue slot A-H
    pub hot_cue_number: u8,
    pub cue_type: CueType,
    /// Position in milliseconds from track start
    pub time_ms: u32,
    /// Loop end position in milliseconds (0 if not a loop)
    pub loop_time_ms: u32,
    /// Color palette id (extended format only)
    pub color_id: u8,
    /// Comment text (extended format only)
    pub comment: String,
    /// Status flag from the entry; inactive entries are dropped at decode
    pub active: bool,
}

impl CuePoint {
    pub fn time_seconds(&self) -> f64 {
        self.time_ms as f64 / 1000.0
    }

    pub fn is_hot_cue(&self) -> bool {
        (1..=8).contains(&self.hot_cue_number)
    }

    pub fn is_loop(&self) -> bool {
        self.cue_type == CueType::Loop && self.loop_time_ms > 0
    }

    /// Loop length in milliseconds, 0 for anything that is not a loop.
    pub fn loop_duration_ms(&self) -> u32 {
        if self.is_loop() && self.loop_time_ms > self.time_ms {
            self.loop_time_ms - self.time_ms
        } else {
            0
        }
    }
}

/// Single beat in the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeatEntry {
    /// Position within bar (1-4 for 4/4 time)
    pub beat_number: u16,
    /// Tempo at this beat (BPM × 100); mid-track tempo changes show up here
    pub tempo_100: u16,
    /// Time from track start in milliseconds
    pub time_ms: u32,
}

/// Beat grid containing all beat positions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BeatGrid {
    pub beats: Vec<BeatEntry>,
}

impl BeatGrid {
    pub fn len(&self) -> usize {
        self.beats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beats.is_empty()
    }
}

/// Waveform rendering style, ordered by detail quality: a later style
/// replaces an earlier one when several ANLZ files contribute.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum WaveformStyle {
    /// Monochrome blue, 1 byte per column
    Blue,
    /// Full-color, 2 bytes per column packing R5G6B5
    Rgb,
    /// Three frequency bands, 3 bytes per column
    ThreeBand,
}

/// Raw waveform column data with per-style accessors. The byte buffer is
/// stored opaque; rendering is a consumer concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveformData {
    pub style: WaveformStyle,
    pub bytes_per_entry: usize,
    pub data: Vec<u8>,
}

impl WaveformData {
    pub fn new(style: WaveformStyle, bytes_per_entry: usize, data: Vec<u8>) -> Self {
        Self {
            style,
            bytes_per_entry,
            data,
        }
    }

    pub fn entry_count(&self) -> usize {
        if self.bytes_per_entry == 0 {
            0
        } else {
            self.data.len() / self.bytes_per_entry
        }
    }

    fn entry(&self, index: usize) -> Option<&[u8]> {
        let start = index.checked_mul(self.bytes_per_entry)?;
        let end = start.checked_add(self.bytes_per_entry)?;
        self.data.get(start..end)
    }

    /// Column height: the low 5 bits of the entry's first byte.
    pub fn height(&self, index: usize) -> Option<u8> {
        self.entry(index).map(|e| e[0] & 0x1F)
    }

    /// Unpack an RGB column as 8-bit channels. The 16-bit big-endian pair
    /// packs R5G6B5: red in bits 15-11, green in 10-5, blue in 4-0.
    pub fn rgb(&self, index: usize) -> Option<(u8, u8, u8)> {
        let entry = self.entry(index)?;
        if entry.len() < 2 {
            return None;
        }
        let packed = u16::from_be_bytes([entry[0], entry[1]]);
        let r = ((packed >> 11) & 0x1F) as u8;
        let g = ((packed >> 5) & 0x3F) as u8;
        let b = (packed & 0x1F) as u8;
        Some((r << 3, g << 2, b << 3))
    }

    /// Low/mid/high band amplitudes: the low 5 bits of bytes 0/1/2.
    pub fn bands(&self, index: usize) -> Option<(u8, u8, u8)> {
        let entry = self.entry(index)?;
        if entry.len() < 3 {
            return None;
        }
        Some((entry[0] & 0x1F, entry[1] & 0x1F, entry[2] & 0x1F))
    }
}

/// Song-structure mood preset; scopes the meaning of phrase kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mood {
    High,
    Mid,
    Low,
}

impl Mood {
    pub fn from_raw(raw: u16) -> Option<Self> {
        match raw {
            1 => Some(Mood::High),
            2 => Some(Mood::Mid),
            3 => Some(Mood::Low),
            _ => None,
        }
    }

    /// Display name for a phrase kind under this mood.
    pub fn phrase_name(&self, kind: u16) -> &'static str {
        match self {
            Mood::High => match kind {
                1 => "Intro",
                2 => "Up",
                3 => "Down",
                5 => "Chorus",
                6 => "Outro",
                _ => "Unknown",
            },
            Mood::Mid => match kind {
                1 => "Intro",
                2 => "Verse 1",
                3 => "Verse 2",
                4 => "Verse 3",
                5 => "Verse 4",
                6 => "Verse 5",
                7 => "Verse 6",
                8 => "Bridge",
                9 => "Chorus",
                10 => "Outro",
                _ => "Unknown",
            },
            Mood::Low => match kind {
                1 => "Intro",
                2..=4 => "Verse 1",
                5..=7 => "Verse 2",
                8 => "Bridge",
                9 => "Chorus",
                10 => "Outro",
                _ => "Unknown",
            },
        }
    }
}

/// One phrase of a song structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhraseEntry {
    /// Phrase ordinal within the structure
    pub index: u16,
    /// First beat of the phrase
    pub beat: u16,
    /// Kind code; meaning depends on the enclosing mood
    pub kind: u16,
    /// Beat where the phrase ends: the next phrase's start, or the
    /// structure-level end beat for the final phrase
    pub end_beat: u16,
    pub k1: u8,
    pub k2: u8,
    pub k3: u8,
    /// Non-zero when a fill-in leads out of the phrase
    pub fill: u8,
    /// First beat of the fill-in, when present
    pub fill_beat: u16,
}

impl PhraseEntry {
    pub fn name(&self, mood: Mood) -> &'static str {
        mood.phrase_name(self.kind)
    }
}

/// Decoded PSI2 song structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongStructure {
    pub mood: Mood,
    /// Bank preset byte (stylistic color scheme chosen in rekordbox)
    pub bank: u8,
    /// Beat on which the final phrase ends
    pub end_beat: u16,
    pub phrases: Vec<PhraseEntry>,
}
