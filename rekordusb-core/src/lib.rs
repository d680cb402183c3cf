//! rekordusb-core: read-only decoding of Pioneer DJ USB exports
//!
//! This crate parses the artifacts rekordbox writes to USB/SD media:
//! - export.pdb / exportExt.pdb (DeviceSQL database) - little-endian
//! - ANLZ files (.DAT, .EXT, .2EX) - big-endian
//!
//! `Database::open` materializes all indices up front; queries are
//! in-memory lookups and never re-decode pages. ANLZ data loads onto the
//! same handle and joins to tracks by their stored file paths.
//!
//! Based on Deep Symmetry's reverse engineering documentation:
//! https://djl-analysis.deepsymmetry.org/rekordbox-export-analysis/

pub mod analysis;
pub mod anlz;
pub mod bytes;
pub mod database;
pub mod error;
pub mod page;
pub mod pdb;
pub mod rows;
pub mod string;
pub mod track;

// Re-exports for convenience
pub use analysis::{AnalysisIndex, TrackAnalysis};
pub use anlz::AnlzFile;
pub use database::{Database, PlaylistFolderEntry};
pub use error::{Error, ErrorKind, Result};
pub use page::{Page, PageType, PageTypeExt};
pub use pdb::PdbFile;
pub use rows::{
    AlbumRow, ArtistRow, ArtworkRow, ColorRow, GenreRow, HistoryEntryRow, HistoryPlaylistRow,
    KeyRow, LabelRow, PlaylistEntryRow, PlaylistTreeRow, TagRow, TagTrackRow, TrackRow,
};
pub use track::{
    AlbumId, ArtistId, ArtworkId, BeatEntry, BeatGrid, ColorId, CuePoint, CueType, GenreId,
    KeyId, LabelId, Mood, PhraseEntry, PlaylistId, SongStructure, TagId, TrackId, WaveformData,
    WaveformStyle,
};
