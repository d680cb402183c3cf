//! Page layout for Pioneer DeviceSQL databases
//!
//! A PDB file is an array of fixed-size pages. Each page has:
//! - Fixed header at offset 0x00-0x27
//! - Heap growing forward from offset 0x28
//! - Row index growing backward from page end
//!
//! Row index structure (per 16-row group, scanned back from the page end):
//! - 2 bytes presence flags (bitmask of which rows exist) at `base - 4`
//! - 16 × 2-byte offsets at `base - (6 + 2*i)` pointing into the heap

use crate::bytes::{read_u16_le, read_u32_le};
use crate::error::{Error, ErrorKind, Result};

/// Offset of the row heap within a page
pub const HEAP_START: usize = 40;

/// Size of each row group's index block at the page tail
pub const ROW_GROUP_SIZE: usize = 0x24;

/// Maximum rows per group
pub const ROWS_PER_GROUP: usize = 16;

/// Table types in export.pdb
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageType {
    Tracks = 0,
    Genres = 1,
    Artists = 2,
    Albums = 3,
    Labels = 4,
    Keys = 5,
    Colors = 6,
    PlaylistTree = 7,
    PlaylistEntries = 8,
    HistoryPlaylists = 11,
    HistoryEntries = 12,
    Artwork = 13,
    Columns = 16,
    History = 19,
}

impl PageType {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(PageType::Tracks),
            1 => Some(PageType::Genres),
            2 => Some(PageType::Artists),
            3 => Some(PageType::Albums),
            4 => Some(PageType::Labels),
            5 => Some(PageType::Keys),
            6 => Some(PageType::Colors),
            7 => Some(PageType::PlaylistTree),
            8 => Some(PageType::PlaylistEntries),
            11 => Some(PageType::HistoryPlaylists),
            12 => Some(PageType::HistoryEntries),
            13 => Some(PageType::Artwork),
            16 => Some(PageType::Columns),
            19 => Some(PageType::History),
            _ => None,
        }
    }
}

/// Table types in exportExt.pdb
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageTypeExt {
    Tags = 3,
    TagTracks = 4,
}

impl PageTypeExt {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            3 => Some(PageTypeExt::Tags),
            4 => Some(PageTypeExt::TagTracks),
            _ => None,
        }
    }
}

/// One 16-row index group from the page tail.
#[derive(Debug, Clone)]
pub struct RowGroup {
    /// Bit `i` set means row `i` of this group is present
    pub present_flags: u16,
    /// Heap-relative byte offsets, one per allocated row slot
    pub offsets: Vec<u16>,
}

impl RowGroup {
    /// Heap-relative offsets of the rows actually present.
    pub fn present_offsets(&self) -> impl Iterator<Item = u16> + '_ {
        self.offsets
            .iter()
            .enumerate()
            .filter(|(i, _)| (self.present_flags >> i) & 1 != 0)
            .map(|(_, &ofs)| ofs)
    }
}

/// A parsed page header plus its row-group index.
#[derive(Debug, Clone)]
pub struct Page {
    pub page_index: u32,
    pub raw_type: u32,
    pub next_page_index: u32,
    pub num_row_offsets: u16,
    pub num_rows: u16,
    pub page_flags: u8,
    pub free_size: u16,
    pub used_size: u16,
    /// Absolute file offset of this page's heap
    pub heap_offset: usize,
    pub row_groups: Vec<RowGroup>,
}

impl Page {
    /// Pages with bit 0x40 set in the flags are index pages; only data
    /// pages carry rows.
    pub fn is_data_page(&self) -> bool {
        self.page_flags & 0x40 == 0
    }

    /// Parse the page occupying `data` (exactly `page_size` bytes starting
    /// at absolute file offset `page_offset`).
    pub fn parse(data: &[u8], page_size: usize, page_offset: usize) -> Result<Self> {
        if data.len() < HEAP_START {
            return Err(Error::new(
                ErrorKind::CorruptedData,
                format!("page at offset {page_offset} smaller than its header"),
            ));
        }

        let page_index = read_u32_le(data, 4).unwrap_or(0);
        let raw_type = read_u32_le(data, 8).unwrap_or(0);
        let next_page_index = read_u32_le(data, 12).unwrap_or(0);

        // Packed row bookkeeping at offset 20:
        // bits [0..13) num_row_offsets, [13..24) num_rows, [24..32) flags
        let row_info = read_u32_le(data, 20).unwrap_or(0);
        let num_row_offsets = (row_info & 0x1FFF) as u16;
        let num_rows = ((row_info >> 13) & 0x7FF) as u16;
        let page_flags = ((row_info >> 24) & 0xFF) as u8;

        let free_size = read_u16_le(data, 24).unwrap_or(0);
        let used_size = read_u16_le(data, 26).unwrap_or(0);

        let mut page = Page {
            page_index,
            raw_type,
            next_page_index,
            num_row_offsets,
            num_rows,
            page_flags,
            free_size,
            used_size,
            heap_offset: page_offset + HEAP_START,
            row_groups: Vec::new(),
        };

        if page.is_data_page() && num_row_offsets > 0 {
            let num_groups = (num_row_offsets as usize - 1) / ROWS_PER_GROUP + 1;
            for group_idx in 0..num_groups {
                let base = page_size - group_idx * ROW_GROUP_SIZE;
                if base < ROW_GROUP_SIZE || base > data.len() {
                    return Err(Error::new(
                        ErrorKind::CorruptedData,
                        format!(
                            "row group {group_idx} of page {page_index} lies outside the page"
                        ),
                    ));
                }

                let present_flags = read_u16_le(data, base - 4).unwrap_or(0);

                let rows_in_group = ROWS_PER_GROUP
                    .min(num_row_offsets as usize - group_idx * ROWS_PER_GROUP);
                let mut offsets = Vec::with_capacity(rows_in_group);
                for row_idx in 0..rows_in_group {
                    let ofs_pos = base - (6 + 2 * row_idx);
                    offsets.push(read_u16_le(data, ofs_pos).unwrap_or(0));
                }

                page.row_groups.push(RowGroup {
                    present_flags,
                    offsets,
                });
            }
        }

        Ok(page)
    }

    /// Absolute file offsets of every present row on this page.
    pub fn present_row_bases(&self) -> impl Iterator<Item = usize> + '_ {
        let heap = self.heap_offset;
        self.row_groups
            .iter()
            .flat_map(move |group| group.present_offsets().map(move |ofs| heap + ofs as usize))
    }
}
