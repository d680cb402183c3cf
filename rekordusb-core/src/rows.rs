//! Typed row records and their decoders
//!
//! Each table kind has a fixed raw layout at the row base address; the
//! field offsets below are the community-documented contract. Two idioms
//! recur: simple rows end in a trailing DeviceSQL string, while artist,
//! album, and tag rows store a one-byte "near" name offset that a subtype
//! bit promotes to a wider offset at a fixed alternate position.
//!
//! Decoders return `None` when the fixed-size record does not fit in the
//! remaining buffer; the index builder skips such rows.

use serde::{Deserialize, Serialize};

use crate::bytes::{read_u16_le, read_u32_le, read_u8};
use crate::pdb::PdbFile;
use crate::track::{
    AlbumId, ArtistId, ArtworkId, ColorId, GenreId, KeyId, LabelId, PlaylistId, TagId, TrackId,
};

/// Subtype bit selecting the wide ("far") name offset on artist/album rows
const SUBTYPE_FAR_BIT: u16 = 0x0004;

/// Tag-row subtype whose name offset is a u32 read at the near position
const TAG_SUBTYPE_FAR: u16 = 0x0684;

/// Number of entries in a track row's string-offset table
const TRACK_STRING_COUNT: usize = 21;

/// Fixed track-row prefix before the string-offset table
const TRACK_FIXED_SIZE: usize = 0x5E;

/// A fully decoded track row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackRow {
    pub id: TrackId,
    pub title: String,
    pub artist_id: ArtistId,
    pub composer_id: ArtistId,
    pub original_artist_id: ArtistId,
    pub remixer_id: ArtistId,
    pub album_id: AlbumId,
    pub genre_id: GenreId,
    pub label_id: LabelId,
    pub key_id: KeyId,
    pub color_id: ColorId,
    pub artwork_id: ArtworkId,
    pub duration_seconds: u32,
    /// BPM × 100
    pub bpm_100x: u32,
    /// 0-5 stars
    pub rating: u8,
    pub bitrate: u32,
    pub sample_rate: u32,
    pub sample_depth: u16,
    pub year: u16,
    pub file_size: u32,
    pub track_number: u32,
    pub disc_number: u16,
    pub play_count: u16,
    pub file_path: String,
    pub filename: String,
    pub comment: String,
    pub analyze_path: String,
    pub analyze_date: String,
    pub isrc: String,
    pub release_date: String,
    pub mix_name: String,
    pub date_added: String,
    pub texter: String,
    pub message: String,
    pub kuvo_public: String,
    pub autoload_hot_cues: String,
}

impl TrackRow {
    pub fn bpm(&self) -> f32 {
        self.bpm_100x as f32 / 100.0
    }

    pub fn decode(pdb: &PdbFile, row_base: usize) -> Option<Self> {
        let record_size = TRACK_FIXED_SIZE + TRACK_STRING_COUNT * 2;
        let data = pdb.data_at(row_base, record_size);
        if data.len() < record_size {
            return None;
        }

        let string_at = |index: usize| -> String {
            let ofs = read_u16_le(data, TRACK_FIXED_SIZE + index * 2).unwrap_or(0);
            pdb.read_string(row_base + ofs as usize)
        };

        Some(TrackRow {
            sample_rate: read_u32_le(data, 0x08)?,
            composer_id: ArtistId::from(read_u32_le(data, 0x0C)?),
            file_size: read_u32_le(data, 0x10)?,
            artwork_id: ArtworkId::from(read_u32_le(data, 0x1C)?),
            key_id: KeyId::from(read_u32_le(data, 0x20)?),
            original_artist_id: ArtistId::from(read_u32_le(data, 0x24)?),
            label_id: LabelId::from(read_u32_le(data, 0x28)?),
            remixer_id: ArtistId::from(read_u32_le(data, 0x2C)?),
            bitrate: read_u32_le(data, 0x30)?,
            track_number: read_u32_le(data, 0x34)?,
            bpm_100x: read_u32_le(data, 0x38)?,
            genre_id: GenreId::from(read_u32_le(data, 0x3C)?),
            album_id: AlbumId::from(read_u32_le(data, 0x40)?),
            artist_id: ArtistId::from(read_u32_le(data, 0x44)?),
            id: TrackId::from(read_u32_le(data, 0x48)?),
            disc_number: read_u16_le(data, 0x4C)?,
            play_count: read_u16_le(data, 0x4E)?,
            year: read_u16_le(data, 0x50)?,
            sample_depth: read_u16_le(data, 0x52)?,
            duration_seconds: read_u16_le(data, 0x54)? as u32,
            color_id: ColorId(read_u8(data, 0x58)? as u64),
            rating: read_u8(data, 0x59)?,
            isrc: string_at(0),
            texter: string_at(1),
            message: string_at(5),
            kuvo_public: string_at(6),
            autoload_hot_cues: string_at(7),
            date_added: string_at(10),
            release_date: string_at(11),
            mix_name: string_at(12),
            analyze_path: string_at(14),
            analyze_date: string_at(15),
            comment: string_at(16),
            title: string_at(17),
            filename: string_at(19),
            file_path: string_at(20),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtistRow {
    pub id: ArtistId,
    pub name: String,
}

impl ArtistRow {
    pub fn decode(pdb: &PdbFile, row_base: usize) -> Option<Self> {
        let data = pdb.data_at(row_base, 10);
        if data.len() < 10 {
            return None;
        }

        let subtype = read_u16_le(data, 0)?;
        let id = ArtistId::from(read_u32_le(data, 4)?);

        let mut name_offset = read_u8(data, 9)? as u16;
        if subtype & SUBTYPE_FAR_BIT != 0 {
            let far = pdb.data_at(row_base + 0x0A, 2);
            if far.len() == 2 {
                name_offset = u16::from_le_bytes([far[0], far[1]]);
            }
        }

        Some(ArtistRow {
            id,
            name: pdb.read_string(row_base + name_offset as usize),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlbumRow {
    pub id: AlbumId,
    pub name: String,
    pub artist_id: ArtistId,
}

impl AlbumRow {
    pub fn decode(pdb: &PdbFile, row_base: usize) -> Option<Self> {
        let data = pdb.data_at(row_base, 22);
        if data.len() < 22 {
            return None;
        }

        let subtype = read_u16_le(data, 0)?;
        let artist_id = ArtistId::from(read_u32_le(data, 0x08)?);
        let id = AlbumId::from(read_u32_le(data, 0x0C)?);

        let mut name_offset = read_u8(data, 0x15)? as u16;
        if subtype & SUBTYPE_FAR_BIT != 0 {
            let far = pdb.data_at(row_base + 0x16, 2);
            if far.len() == 2 {
                name_offset = u16::from_le_bytes([far[0], far[1]]);
            }
        }

        Some(AlbumRow {
            id,
            artist_id,
            name: pdb.read_string(row_base + name_offset as usize),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenreRow {
    pub id: GenreId,
    pub name: String,
}

impl GenreRow {
    pub fn decode(pdb: &PdbFile, row_base: usize) -> Option<Self> {
        let data = pdb.data_at(row_base, 4);
        if data.len() < 4 {
            return None;
        }
        Some(GenreRow {
            id: GenreId::from(read_u32_le(data, 0)?),
            name: pdb.read_string(row_base + 4),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelRow {
    pub id: LabelId,
    pub name: String,
}

impl LabelRow {
    pub fn decode(pdb: &PdbFile, row_base: usize) -> Option<Self> {
        let data = pdb.data_at(row_base, 4);
        if data.len() < 4 {
            return None;
        }
        Some(LabelRow {
            id: LabelId::from(read_u32_le(data, 0)?),
            name: pdb.read_string(row_base + 4),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyRow {
    pub id: KeyId,
    pub name: String,
}

impl KeyRow {
    pub fn decode(pdb: &PdbFile, row_base: usize) -> Option<Self> {
        // id, then a second copy of the id, then the name
        let data = pdb.data_at(row_base, 8);
        if data.len() < 8 {
            return None;
        }
        Some(KeyRow {
            id: KeyId::from(read_u32_le(data, 0)?),
            name: pdb.read_string(row_base + 8),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColorRow {
    pub id: ColorId,
    pub name: String,
}

impl ColorRow {
    pub fn decode(pdb: &PdbFile, row_base: usize) -> Option<Self> {
        // 5 reserved bytes, u16 id, 1 reserved byte, name
        let data = pdb.data_at(row_base, 8);
        if data.len() < 8 {
            return None;
        }
        Some(ColorRow {
            id: ColorId(read_u16_le(data, 5)? as u64),
            name: pdb.read_string(row_base + 8),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtworkRow {
    pub id: ArtworkId,
    pub path: String,
}

impl ArtworkRow {
    pub fn decode(pdb: &PdbFile, row_base: usize) -> Option<Self> {
        let data = pdb.data_at(row_base, 4);
        if data.len() < 4 {
            return None;
        }
        Some(ArtworkRow {
            id: ArtworkId::from(read_u32_le(data, 0)?),
            path: pdb.read_string(row_base + 4),
        })
    }
}

/// One node of the playlist tree: a folder or a playlist leaf.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaylistTreeRow {
    pub id: PlaylistId,
    pub parent_id: PlaylistId,
    pub sort_order: u32,
    pub is_folder: bool,
    pub name: String,
}

impl PlaylistTreeRow {
    pub fn decode(pdb: &PdbFile, row_base: usize) -> Option<Self> {
        let data = pdb.data_at(row_base, 20);
        if data.len() < 20 {
            return None;
        }
        Some(PlaylistTreeRow {
            parent_id: PlaylistId::from(read_u32_le(data, 0)?),
            sort_order: read_u32_le(data, 8)?,
            id: PlaylistId::from(read_u32_le(data, 12)?),
            is_folder: read_u32_le(data, 16)? != 0,
            name: pdb.read_string(row_base + 20),
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaylistEntryRow {
    pub entry_index: u32,
    pub track_id: TrackId,
    pub playlist_id: PlaylistId,
}

impl PlaylistEntryRow {
    pub fn decode(pdb: &PdbFile, row_base: usize) -> Option<Self> {
        let data = pdb.data_at(row_base, 12);
        if data.len() < 12 {
            return None;
        }
        Some(PlaylistEntryRow {
            entry_index: read_u32_le(data, 0)?,
            track_id: TrackId::from(read_u32_le(data, 4)?),
            playlist_id: PlaylistId::from(read_u32_le(data, 8)?),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryPlaylistRow {
    pub id: PlaylistId,
    pub name: String,
}

impl HistoryPlaylistRow {
    pub fn decode(pdb: &PdbFile, row_base: usize) -> Option<Self> {
        let data = pdb.data_at(row_base, 4);
        if data.len() < 4 {
            return None;
        }
        Some(HistoryPlaylistRow {
            id: PlaylistId::from(read_u32_le(data, 0)?),
            name: pdb.read_string(row_base + 4),
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntryRow {
    pub track_id: TrackId,
    pub playlist_id: PlaylistId,
    pub entry_index: u32,
}

impl HistoryEntryRow {
    pub fn decode(pdb: &PdbFile, row_base: usize) -> Option<Self> {
        let data = pdb.data_at(row_base, 12);
        if data.len() < 12 {
            return None;
        }
        Some(HistoryEntryRow {
            track_id: TrackId::from(read_u32_le(data, 0)?),
            playlist_id: PlaylistId::from(read_u32_le(data, 4)?),
            entry_index: read_u32_le(data, 8)?,
        })
    }
}

/// A tag or tag category from exportExt.pdb. Categories have `category`
/// zero and `is_category` set; tags point at their category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagRow {
    pub id: TagId,
    pub name: String,
    /// Parent category id; zero when this row is itself a category
    pub category: TagId,
    /// Display position within the category (or among categories)
    pub category_pos: u32,
    pub is_category: bool,
}

impl TagRow {
    pub fn decode(pdb: &PdbFile, row_base: usize) -> Option<Self> {
        let data = pdb.data_at(row_base, 0x1E);
        if data.len() < 0x1E {
            return None;
        }

        let subtype = read_u16_le(data, 0)?;
        let category = TagId::from(read_u32_le(data, 0x0C)?);
        let category_pos = read_u32_le(data, 0x10)?;
        let id = TagId::from(read_u32_le(data, 0x14)?);
        let is_category = read_u32_le(data, 0x18)? != 0;
        let ofs_name_near = read_u8(data, 0x1D)? as usize;

        let mut name_offset = row_base + ofs_name_near;
        if subtype == TAG_SUBTYPE_FAR {
            let far = pdb.data_at(row_base + ofs_name_near, 4);
            if far.len() == 4 {
                let far_offset = u32::from_le_bytes([far[0], far[1], far[2], far[3]]);
                name_offset = row_base + far_offset as usize;
            }
        }

        Some(TagRow {
            id,
            name: pdb.read_string(name_offset),
            category,
            category_pos,
            is_category,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TagTrackRow {
    pub tag_id: TagId,
    pub track_id: TrackId,
}

impl TagTrackRow {
    pub fn decode(pdb: &PdbFile, row_base: usize) -> Option<Self> {
        let data = pdb.data_at(row_base, 8);
        if data.len() < 8 {
            return None;
        }
        Some(TagTrackRow {
            tag_id: TagId::from(read_u32_le(data, 0)?),
            track_id: TrackId::from(read_u32_le(data, 4)?),
        })
    }
}
