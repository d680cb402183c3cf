//! Fixture builders: synthesize PDB and ANLZ buffers for the tests
//!
//! These construct the same on-disk layouts the decoders read, row by row
//! and section by section, so every test owns its input bytes.

#![allow(dead_code)]

pub const PAGE_SIZE: usize = 4096;
const HEAP_START: usize = 40;
const ROW_GROUP_SIZE: usize = 0x24;
const ROWS_PER_GROUP: usize = 16;

// ----------------------------------------------------------------------
// DeviceSQL string encoding
// ----------------------------------------------------------------------

/// Encode a DeviceSQL string: short ASCII when it fits, long ASCII for
/// oversized ASCII, UTF-16LE otherwise.
pub fn encode_string(s: &str) -> Vec<u8> {
    if s.is_empty() {
        return vec![0x03];
    }

    let is_ascii = s.bytes().all(|b| b < 128);
    if is_ascii && s.len() <= 126 {
        let total_len = s.len() + 1;
        let mut out = Vec::with_capacity(total_len);
        out.push(((total_len as u8) << 1) | 1);
        out.extend_from_slice(s.as_bytes());
        out
    } else if is_ascii {
        let total_len = 4 + s.len();
        let mut out = vec![0x40];
        out.extend_from_slice(&(total_len as u16).to_le_bytes());
        out.push(0x00);
        out.extend_from_slice(s.as_bytes());
        out
    } else {
        let units: Vec<u16> = s.encode_utf16().collect();
        let total_len = 4 + units.len() * 2;
        let mut out = vec![0x90];
        out.extend_from_slice(&(total_len as u16).to_le_bytes());
        out.push(0x00);
        for unit in units {
            out.extend_from_slice(&unit.to_le_bytes());
        }
        out
    }
}

// ----------------------------------------------------------------------
// PDB file builder
// ----------------------------------------------------------------------

/// A table under construction: raw type plus its data pages, each a list
/// of row byte strings.
struct TableSpec {
    raw_type: u32,
    pages: Vec<Vec<Vec<u8>>>,
}

/// Builds a complete PDB file: header page, table directory, and one or
/// more data pages per table chained through their next pointers.
pub struct PdbBuilder {
    tables: Vec<TableSpec>,
}

impl PdbBuilder {
    pub fn new() -> Self {
        Self { tables: Vec::new() }
    }

    /// Add a table whose rows all fit on a single data page.
    pub fn table(mut self, raw_type: u32, rows: Vec<Vec<u8>>) -> Self {
        self.tables.push(TableSpec {
            raw_type,
            pages: vec![rows],
        });
        self
    }

    /// Add a table spread over several data pages.
    pub fn table_pages(mut self, raw_type: u32, pages: Vec<Vec<Vec<u8>>>) -> Self {
        self.tables.push(TableSpec { raw_type, pages });
        self
    }

    pub fn build(self) -> Vec<u8> {
        // Assign page indices: header is page 0, then data pages in order
        let mut next_page = 1u32;
        let mut assignments: Vec<(u32, Vec<u32>)> = Vec::new();
        for table in &self.tables {
            let indices: Vec<u32> = table
                .pages
                .iter()
                .map(|_| {
                    let idx = next_page;
                    next_page += 1;
                    idx
                })
                .collect();
            assignments.push((table.raw_type, indices));
        }

        let total_pages = next_page as usize;
        let mut data = vec![0u8; total_pages * PAGE_SIZE];

        // File header
        data[4..8].copy_from_slice(&(PAGE_SIZE as u32).to_le_bytes());
        data[8..12].copy_from_slice(&(self.tables.len() as u32).to_le_bytes());

        // Table directory at offset 28
        let mut dir = 28usize;
        for (raw_type, indices) in &assignments {
            data[dir..dir + 4].copy_from_slice(&raw_type.to_le_bytes());
            data[dir + 4..dir + 8].copy_from_slice(&0u32.to_le_bytes());
            data[dir + 8..dir + 12].copy_from_slice(&indices[0].to_le_bytes());
            data[dir + 12..dir + 16]
                .copy_from_slice(&indices[indices.len() - 1].to_le_bytes());
            dir += 16;
        }

        // Data pages
        for (table, (raw_type, indices)) in self.tables.iter().zip(&assignments) {
            for (pos, (rows, &page_index)) in table.pages.iter().zip(indices).enumerate() {
                let next = if pos + 1 < indices.len() {
                    indices[pos + 1]
                } else {
                    u32::MAX
                };
                write_data_page(
                    &mut data[page_index as usize * PAGE_SIZE..][..PAGE_SIZE],
                    page_index,
                    *raw_type,
                    next,
                    rows,
                );
            }
        }

        data
    }

    /// Build and write to a file inside `dir`, returning the path.
    pub fn write_to(self, dir: &std::path::Path, name: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, self.build()).unwrap();
        path
    }
}

fn write_data_page(page: &mut [u8], page_index: u32, raw_type: u32, next: u32, rows: &[Vec<u8>]) {
    page[4..8].copy_from_slice(&page_index.to_le_bytes());
    page[8..12].copy_from_slice(&raw_type.to_le_bytes());
    page[12..16].copy_from_slice(&next.to_le_bytes());

    // Packed row counts at offset 20; flags 0x24 marks a data page
    let packed = (rows.len() as u32 & 0x1FFF)
        | ((rows.len() as u32 & 0x7FF) << 13)
        | (0x24u32 << 24);
    page[20..24].copy_from_slice(&packed.to_le_bytes());

    let mut heap_pos = HEAP_START;
    for (i, row) in rows.iter().enumerate() {
        page[heap_pos..heap_pos + row.len()].copy_from_slice(row);

        let group = i / ROWS_PER_GROUP;
        let slot = i % ROWS_PER_GROUP;
        let base = PAGE_SIZE - group * ROW_GROUP_SIZE;

        let ofs = (heap_pos - HEAP_START) as u16;
        page[base - (6 + 2 * slot)..base - (4 + 2 * slot)].copy_from_slice(&ofs.to_le_bytes());

        let flags_pos = base - 4;
        let mut present = u16::from_le_bytes([page[flags_pos], page[flags_pos + 1]]);
        present |= 1 << slot;
        page[flags_pos..flags_pos + 2].copy_from_slice(&present.to_le_bytes());

        heap_pos += row.len();
    }

    page[26..28].copy_from_slice(&((heap_pos - HEAP_START) as u16).to_le_bytes());
}

// ----------------------------------------------------------------------
// PDB row encoders
// ----------------------------------------------------------------------

/// The subset of track fields the tests care about; everything else
/// encodes as zero.
#[derive(Default, Clone)]
pub struct TrackSpec {
    pub id: u32,
    pub title: String,
    pub artist_id: u32,
    pub composer_id: u32,
    pub original_artist_id: u32,
    pub remixer_id: u32,
    pub album_id: u32,
    pub genre_id: u32,
    pub label_id: u32,
    pub key_id: u32,
    pub color_id: u8,
    pub artwork_id: u32,
    pub tempo_100: u32,
    pub duration: u16,
    pub year: u16,
    pub rating: u8,
    pub bitrate: u32,
    pub sample_rate: u32,
    pub sample_depth: u16,
    pub file_size: u32,
    pub track_number: u32,
    pub disc_number: u16,
    pub play_count: u16,
    pub file_path: String,
    pub filename: String,
    pub comment: String,
    pub isrc: String,
    pub mix_name: String,
    pub date_added: String,
}

pub fn track_row(spec: &TrackSpec) -> Vec<u8> {
    const FIXED_SIZE: usize = 0x5E;
    const STRING_COUNT: usize = 21;
    const HEADER_SIZE: usize = FIXED_SIZE + STRING_COUNT * 2;

    let mut strings: Vec<Vec<u8>> = vec![encode_string(""); STRING_COUNT];
    strings[0] = encode_string(&spec.isrc);
    strings[10] = encode_string(&spec.date_added);
    strings[12] = encode_string(&spec.mix_name);
    strings[16] = encode_string(&spec.comment);
    strings[17] = encode_string(&spec.title);
    strings[19] = encode_string(&spec.filename);
    strings[20] = encode_string(&spec.file_path);

    let mut offsets = Vec::with_capacity(STRING_COUNT);
    let mut cursor = HEADER_SIZE;
    for s in &strings {
        offsets.push(cursor as u16);
        cursor += s.len();
    }

    let mut row = vec![0u8; HEADER_SIZE];
    row[0x00..0x02].copy_from_slice(&0x0024u16.to_le_bytes()); // subtype
    row[0x08..0x0C].copy_from_slice(&spec.sample_rate.to_le_bytes());
    row[0x0C..0x10].copy_from_slice(&spec.composer_id.to_le_bytes());
    row[0x10..0x14].copy_from_slice(&spec.file_size.to_le_bytes());
    row[0x1C..0x20].copy_from_slice(&spec.artwork_id.to_le_bytes());
    row[0x20..0x24].copy_from_slice(&spec.key_id.to_le_bytes());
    row[0x24..0x28].copy_from_slice(&spec.original_artist_id.to_le_bytes());
    row[0x28..0x2C].copy_from_slice(&spec.label_id.to_le_bytes());
    row[0x2C..0x30].copy_from_slice(&spec.remixer_id.to_le_bytes());
    row[0x30..0x34].copy_from_slice(&spec.bitrate.to_le_bytes());
    row[0x34..0x38].copy_from_slice(&spec.track_number.to_le_bytes());
    row[0x38..0x3C].copy_from_slice(&spec.tempo_100.to_le_bytes());
    row[0x3C..0x40].copy_from_slice(&spec.genre_id.to_le_bytes());
    row[0x40..0x44].copy_from_slice(&spec.album_id.to_le_bytes());
    row[0x44..0x48].copy_from_slice(&spec.artist_id.to_le_bytes());
    row[0x48..0x4C].copy_from_slice(&spec.id.to_le_bytes());
    row[0x4C..0x4E].copy_from_slice(&spec.disc_number.to_le_bytes());
    row[0x4E..0x50].copy_from_slice(&spec.play_count.to_le_bytes());
    row[0x50..0x52].copy_from_slice(&spec.year.to_le_bytes());
    row[0x52..0x54].copy_from_slice(&spec.sample_depth.to_le_bytes());
    row[0x54..0x56].copy_from_slice(&spec.duration.to_le_bytes());
    row[0x58] = spec.color_id;
    row[0x59] = spec.rating;

    for (i, ofs) in offsets.iter().enumerate() {
        row[FIXED_SIZE + i * 2..FIXED_SIZE + i * 2 + 2].copy_from_slice(&ofs.to_le_bytes());
    }
    for s in &strings {
        row.extend_from_slice(s);
    }
    row
}

/// Artist row with a one-byte near name offset.
pub fn artist_row(id: u32, name: &str) -> Vec<u8> {
    let mut row = Vec::new();
    row.extend_from_slice(&0x0060u16.to_le_bytes()); // subtype, near
    row.extend_from_slice(&0u16.to_le_bytes());
    row.extend_from_slice(&id.to_le_bytes());
    row.push(0x03);
    row.push(10); // name directly after the 10-byte header
    row.extend_from_slice(&encode_string(name));
    row
}

/// Artist row using the wide name offset at +0x0A.
pub fn artist_row_far(id: u32, name: &str) -> Vec<u8> {
    let mut row = Vec::new();
    row.extend_from_slice(&0x0064u16.to_le_bytes()); // subtype, far bit set
    row.extend_from_slice(&0u16.to_le_bytes());
    row.extend_from_slice(&id.to_le_bytes());
    row.push(0x03);
    row.push(0); // near offset unused
    row.extend_from_slice(&12u16.to_le_bytes()); // far offset at +0x0A
    row.extend_from_slice(&encode_string(name));
    row
}

pub fn album_row(id: u32, artist_id: u32, name: &str) -> Vec<u8> {
    let mut row = Vec::new();
    row.extend_from_slice(&0x0080u16.to_le_bytes()); // subtype, near
    row.extend_from_slice(&0u16.to_le_bytes());
    row.extend_from_slice(&0u32.to_le_bytes());
    row.extend_from_slice(&artist_id.to_le_bytes());
    row.extend_from_slice(&id.to_le_bytes());
    row.extend_from_slice(&0u32.to_le_bytes());
    row.push(0x03);
    row.push(22); // name after the 22-byte header
    row.extend_from_slice(&encode_string(name));
    row
}

pub fn album_row_far(id: u32, artist_id: u32, name: &str) -> Vec<u8> {
    let mut row = Vec::new();
    row.extend_from_slice(&0x0084u16.to_le_bytes()); // far bit set
    row.extend_from_slice(&0u16.to_le_bytes());
    row.extend_from_slice(&0u32.to_le_bytes());
    row.extend_from_slice(&artist_id.to_le_bytes());
    row.extend_from_slice(&id.to_le_bytes());
    row.extend_from_slice(&0u32.to_le_bytes());
    row.push(0x03);
    row.push(0);
    row.extend_from_slice(&24u16.to_le_bytes()); // far offset at +0x16
    row.extend_from_slice(&encode_string(name));
    row
}

/// Genre, label, artwork, and history-playlist rows share this shape.
pub fn id_name_row(id: u32, name: &str) -> Vec<u8> {
    let mut row = Vec::new();
    row.extend_from_slice(&id.to_le_bytes());
    row.extend_from_slice(&encode_string(name));
    row
}

pub fn key_row(id: u32, name: &str) -> Vec<u8> {
    let mut row = Vec::new();
    row.extend_from_slice(&id.to_le_bytes());
    row.extend_from_slice(&id.to_le_bytes()); // second id copy
    row.extend_from_slice(&encode_string(name));
    row
}

pub fn color_row(id: u16, name: &str) -> Vec<u8> {
    let mut row = vec![0u8; 5];
    row.extend_from_slice(&id.to_le_bytes());
    row.push(0);
    row.extend_from_slice(&encode_string(name));
    row
}

pub fn playlist_tree_row(
    parent_id: u32,
    sort_order: u32,
    id: u32,
    is_folder: bool,
    name: &str,
) -> Vec<u8> {
    let mut row = Vec::new();
    row.extend_from_slice(&parent_id.to_le_bytes());
    row.extend_from_slice(&0u32.to_le_bytes());
    row.extend_from_slice(&sort_order.to_le_bytes());
    row.extend_from_slice(&id.to_le_bytes());
    row.extend_from_slice(&(is_folder as u32).to_le_bytes());
    row.extend_from_slice(&encode_string(name));
    row
}

pub fn playlist_entry_row(entry_index: u32, track_id: u32, playlist_id: u32) -> Vec<u8> {
    let mut row = Vec::new();
    row.extend_from_slice(&entry_index.to_le_bytes());
    row.extend_from_slice(&track_id.to_le_bytes());
    row.extend_from_slice(&playlist_id.to_le_bytes());
    row
}

pub fn history_entry_row(track_id: u32, playlist_id: u32, entry_index: u32) -> Vec<u8> {
    let mut row = Vec::new();
    row.extend_from_slice(&track_id.to_le_bytes());
    row.extend_from_slice(&playlist_id.to_le_bytes());
    row.extend_from_slice(&entry_index.to_le_bytes());
    row
}

pub fn tag_row(id: u32, name: &str, category: u32, category_pos: u32, is_category: bool) -> Vec<u8> {
    let mut row = vec![0u8; 0x1F];
    row[0x00..0x02].copy_from_slice(&0x0680u16.to_le_bytes());
    row[0x0C..0x10].copy_from_slice(&category.to_le_bytes());
    row[0x10..0x14].copy_from_slice(&category_pos.to_le_bytes());
    row[0x14..0x18].copy_from_slice(&id.to_le_bytes());
    row[0x18..0x1C].copy_from_slice(&(is_category as u32).to_le_bytes());
    row[0x1C] = 0x03;
    row[0x1D] = 0x1F; // name after the 31-byte header
    row.extend_from_slice(&encode_string(name));
    row
}

pub fn tag_track_row(tag_id: u32, track_id: u32) -> Vec<u8> {
    let mut row = Vec::new();
    row.extend_from_slice(&tag_id.to_le_bytes());
    row.extend_from_slice(&track_id.to_le_bytes());
    row
}

// ----------------------------------------------------------------------
// ANLZ file builder
// ----------------------------------------------------------------------

const STRUCTURE_MASK: [u8; 19] = [
    0xCB, 0xE1, 0xEE, 0xFA, 0xE5, 0xEE, 0xAD, 0xEE, 0xE9, 0xD2, 0xE9, 0xEB, 0xE1, 0xE9, 0xF3,
    0xE8, 0xE9, 0xF4, 0xE1,
];

/// Builds ANLZ streams section by section.
pub struct AnlzBuilder {
    sections: Vec<Vec<u8>>,
}

impl AnlzBuilder {
    pub fn new() -> Self {
        Self {
            sections: Vec::new(),
        }
    }

    pub fn raw_section(mut self, tag: &[u8; 4], body: Vec<u8>) -> Self {
        let mut section = Vec::with_capacity(12 + body.len());
        section.extend_from_slice(tag);
        section.extend_from_slice(&12u32.to_be_bytes());
        section.extend_from_slice(&((12 + body.len()) as u32).to_be_bytes());
        section.extend_from_slice(&body);
        self.sections.push(section);
        self
    }

    pub fn path(self, track_path: &str) -> Self {
        let path_bytes: Vec<u8> = track_path
            .encode_utf16()
            .flat_map(|u| u.to_be_bytes())
            .collect();
        let mut body = Vec::new();
        body.extend_from_slice(&(path_bytes.len() as u32).to_be_bytes());
        body.extend_from_slice(&path_bytes);
        self.raw_section(b"PPTH", body)
    }

    pub fn cue_list(self, extended: bool, entries: &[Vec<u8>]) -> Self {
        let tag: &[u8; 4] = if extended { b"PCX2" } else { b"PCUE" };
        let mut body = Vec::new();
        body.extend_from_slice(&(entries.len() as u32).to_be_bytes());
        for entry in entries {
            body.extend_from_slice(entry);
        }
        self.raw_section(tag, body)
    }

    pub fn beat_grid(self, beats: &[(u16, u16, u32)]) -> Self {
        let mut body = vec![0u8; 4];
        body.extend_from_slice(&(beats.len() as u32).to_be_bytes());
        for &(beat_number, tempo_100, time_ms) in beats {
            body.extend_from_slice(&beat_number.to_be_bytes());
            body.extend_from_slice(&tempo_100.to_be_bytes());
            body.extend_from_slice(&time_ms.to_be_bytes());
        }
        self.raw_section(b"PBIT", body)
    }

    /// PWAV/PWV2 blue preview: length, reserved, one byte per column.
    pub fn blue_preview(self, tag: &[u8; 4], columns: &[u8]) -> Self {
        let mut body = Vec::new();
        body.extend_from_slice(&(columns.len() as u32).to_be_bytes());
        body.extend_from_slice(&0u32.to_be_bytes());
        body.extend_from_slice(columns);
        self.raw_section(tag, body)
    }

    /// PWV3/PWV4/PWV5: bytes-per-entry, entry count, reserved, payload.
    pub fn framed_wave(self, tag: &[u8; 4], bytes_per_entry: u32, payload: &[u8]) -> Self {
        let mut body = Vec::new();
        body.extend_from_slice(&bytes_per_entry.to_be_bytes());
        body.extend_from_slice(&((payload.len() as u32) / bytes_per_entry).to_be_bytes());
        body.extend_from_slice(&0u32.to_be_bytes());
        body.extend_from_slice(payload);
        self.raw_section(tag, body)
    }

    /// PWV6/PWV7: bytes-per-entry, entry count, payload (no reserved word).
    pub fn three_band_wave(self, tag: &[u8; 4], payload: &[u8]) -> Self {
        let mut body = Vec::new();
        body.extend_from_slice(&3u32.to_be_bytes());
        body.extend_from_slice(&((payload.len() / 3) as u32).to_be_bytes());
        body.extend_from_slice(payload);
        self.raw_section(tag, body)
    }

    /// PSI2 song structure. `phrases` holds (index, beat, kind) triples;
    /// `masked` applies the XOR mask the way newer exports do.
    pub fn song_structure(
        self,
        mood: u16,
        end_beat: u16,
        bank: u8,
        phrases: &[(u16, u16, u16)],
        masked: bool,
    ) -> Self {
        let mut proper = vec![0u8; 14];
        proper[0..2].copy_from_slice(&mood.to_be_bytes());
        proper[8..10].copy_from_slice(&end_beat.to_be_bytes());
        proper[12] = bank;

        for &(index, beat, kind) in phrases {
            let mut entry = [0u8; 24];
            entry[0..2].copy_from_slice(&index.to_be_bytes());
            entry[2..4].copy_from_slice(&beat.to_be_bytes());
            entry[4..6].copy_from_slice(&kind.to_be_bytes());
            proper.extend_from_slice(&entry);
        }

        if masked {
            let count = phrases.len() as u8;
            for (i, byte) in proper.iter_mut().enumerate() {
                *byte ^= STRUCTURE_MASK[i % STRUCTURE_MASK.len()].wrapping_add(count);
            }
        }

        let mut body = Vec::new();
        body.extend_from_slice(&24u32.to_be_bytes());
        body.extend_from_slice(&(phrases.len() as u16).to_be_bytes());
        body.extend_from_slice(&proper);
        self.raw_section(b"PSI2", body)
    }

    pub fn build(self) -> Vec<u8> {
        let sections_len: usize = self.sections.iter().map(Vec::len).sum();
        let mut data = Vec::with_capacity(28 + sections_len);
        data.extend_from_slice(b"PMAI");
        data.extend_from_slice(&28u32.to_be_bytes());
        data.extend_from_slice(&((28 + sections_len) as u32).to_be_bytes());
        data.extend_from_slice(&[0u8; 16]);
        for section in self.sections {
            data.extend_from_slice(&section);
        }
        data
    }

    pub fn write_to(self, dir: &std::path::Path, name: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, self.build()).unwrap();
        path
    }
}

/// One cue entry for `AnlzBuilder::cue_list`.
#[derive(Default, Clone)]
pub struct CueSpec {
    pub hot_cue: u32,
    pub status: u32,
    pub cue_type: u8,
    pub time_ms: u32,
    pub loop_time_ms: u32,
    pub color_id: u8,
    pub comment: String,
}

pub fn cue_entry(spec: &CueSpec, extended: bool) -> Vec<u8> {
    let comment_bytes: Vec<u8> = spec
        .comment
        .encode_utf16()
        .flat_map(|u| u.to_be_bytes())
        .collect();

    let entry_len = if extended { 60 + comment_bytes.len() } else { 56 };
    let mut entry = vec![0u8; entry_len.min(60)];

    let magic: &[u8; 4] = if extended { b"PCP2" } else { b"PCPT" };
    entry[0..4].copy_from_slice(magic);
    entry[4..8].copy_from_slice(&28u32.to_be_bytes());
    entry[8..12].copy_from_slice(&(entry_len as u32).to_be_bytes());
    entry[12..16].copy_from_slice(&spec.hot_cue.to_be_bytes());
    entry[16..20].copy_from_slice(&spec.status.to_be_bytes());
    entry[32] = spec.cue_type;
    entry[36..40].copy_from_slice(&spec.time_ms.to_be_bytes());
    entry[40..44].copy_from_slice(&spec.loop_time_ms.to_be_bytes());

    if extended {
        entry[44] = spec.color_id;
        entry[56..60].copy_from_slice(&(comment_bytes.len() as u32).to_be_bytes());
        entry.extend_from_slice(&comment_bytes);
    }

    entry
}
