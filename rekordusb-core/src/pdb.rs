//! PDB (DeviceSQL) container reading
//!
//! The export.pdb file is a little-endian paged database. This module owns
//! the file buffer, validates the header, and walks table page chains,
//! handing absolute row offsets to per-table decoders.
//!
//! Reference: https://djl-analysis.deepsymmetry.org/rekordbox-export-analysis/exports.html

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::bytes::{read_u32_le, slice_at};
use crate::error::{Error, ErrorKind, Result};
use crate::page::{Page, PageType, PageTypeExt};
use crate::string::decode_device_string;

/// Size of the file header before the table descriptors
const FILE_HEADER_SIZE: usize = 28;

/// Size of one table descriptor
const TABLE_DESCRIPTOR_SIZE: usize = 16;

/// Largest page size accepted before the header is considered garbage
const MAX_PAGE_SIZE: u32 = 65536;

/// One table descriptor from the file header.
#[derive(Debug, Clone, Copy)]
pub struct Table {
    pub raw_type: u32,
    pub empty_candidate: u32,
    pub first_page_index: u32,
    pub last_page_index: u32,
}

impl Table {
    pub fn kind(&self) -> Option<PageType> {
        PageType::from_u32(self.raw_type)
    }

    pub fn kind_ext(&self) -> Option<PageTypeExt> {
        PageTypeExt::from_u32(self.raw_type)
    }
}

/// An opened PDB file: the whole content held in one contiguous buffer,
/// plus the parsed table directory. The buffer lives as long as the handle;
/// row decoders borrow slices out of it and never retain them.
#[derive(Debug)]
pub struct PdbFile {
    data: Vec<u8>,
    page_size: u32,
    table_count: u32,
    tables: Vec<Table>,
    is_ext: bool,
    path: PathBuf,
}

impl PdbFile {
    /// Open and validate a PDB file. `is_ext` selects the exportExt.pdb
    /// table-type namespace.
    pub fn open(path: &Path, is_ext: bool) -> Result<Self> {
        let data = std::fs::read(path).map_err(|e| Error::from_io(e, path))?;

        if data.len() < FILE_HEADER_SIZE {
            return Err(Error::new(
                ErrorKind::InvalidFileFormat,
                format!(
                    "{}: {} bytes is too small for a PDB header",
                    path.display(),
                    data.len()
                ),
            ));
        }

        let page_size = read_u32_le(&data, 4).unwrap_or(0);
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(Error::new(
                ErrorKind::InvalidFileFormat,
                format!("{}: invalid page size {page_size}", path.display()),
            ));
        }

        let table_count = read_u32_le(&data, 8).unwrap_or(0);
        if table_count == 0 {
            return Err(Error::new(
                ErrorKind::InvalidFileFormat,
                format!("{}: no tables declared", path.display()),
            ));
        }

        let mut tables = Vec::with_capacity(table_count as usize);
        let mut offset = FILE_HEADER_SIZE;
        for _ in 0..table_count {
            if offset + TABLE_DESCRIPTOR_SIZE > data.len() {
                return Err(Error::new(
                    ErrorKind::CorruptedData,
                    format!("{}: table descriptor extends past end of file", path.display()),
                ));
            }
            tables.push(Table {
                raw_type: read_u32_le(&data, offset).unwrap_or(0),
                empty_candidate: read_u32_le(&data, offset + 4).unwrap_or(0),
                first_page_index: read_u32_le(&data, offset + 8).unwrap_or(0),
                last_page_index: read_u32_le(&data, offset + 12).unwrap_or(0),
            });
            offset += TABLE_DESCRIPTOR_SIZE;
        }

        info!(
            path = %path.display(),
            tables = table_count,
            page_size,
            "opened PDB file"
        );

        Ok(Self {
            data,
            page_size,
            table_count,
            tables,
            is_ext,
            path: path.to_path_buf(),
        })
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn table_count(&self) -> u32 {
        self.table_count
    }

    pub fn is_ext(&self) -> bool {
        self.is_ext
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the page at `page_index`.
    pub fn read_page(&self, page_index: u32) -> Result<Page> {
        let page_size = self.page_size as usize;
        let page_offset = page_size * page_index as usize;
        let page_data = slice_at(&self.data, page_offset, page_size);
        if page_data.is_empty() {
            return Err(Error::new(
                ErrorKind::CorruptedData,
                format!("page {page_index} extends past end of file"),
            ));
        }
        Page::parse(page_data, page_size, page_offset)
    }

    /// Decode the DeviceSQL string at an absolute file offset. Offsets past
    /// the buffer yield the empty string.
    pub fn read_string(&self, offset: usize) -> String {
        match self.data.get(offset..) {
            Some(tail) => decode_device_string(tail),
            None => String::new(),
        }
    }

    /// Length-bounded view of the buffer; empty on overflow.
    pub fn data_at(&self, offset: usize, len: usize) -> &[u8] {
        slice_at(&self.data, offset, len)
    }

    /// Walk the page chain of the table with the given raw type, calling
    /// `handler` with the absolute file offset of every present row.
    ///
    /// A page read failure terminates this table's scan but is not fatal;
    /// callers continue with other tables.
    pub fn scan_table<F: FnMut(usize)>(&self, raw_type: u32, mut handler: F) {
        let Some(table) = self.tables.iter().find(|t| t.raw_type == raw_type) else {
            debug!(raw_type, "table not present in file");
            return;
        };

        let mut current = table.first_page_index;
        let last = table.last_page_index;
        let mut visited = HashSet::new();

        loop {
            if !visited.insert(current) {
                warn!(page = current, "page chain loops back on itself; stopping");
                break;
            }

            let page = match self.read_page(current) {
                Ok(page) => page,
                Err(err) => {
                    warn!(
                        page = current,
                        kind = err.kind.as_str(),
                        source = %err.source_location(),
                        "failed to read page: {}", err.message
                    );
                    break;
                }
            };

            if page.is_data_page() {
                for row_base in page.present_row_bases() {
                    handler(row_base);
                }
            }

            if current == last || page.next_page_index == u32::MAX {
                break;
            }
            current = page.next_page_index;
        }
    }
}
