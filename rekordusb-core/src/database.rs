//! Database handle: index building and queries
//!
//! `Database::open` reads a PDB file, scans every table of interest, and
//! materializes all indices before returning; queries afterwards never
//! touch the raw pages again. Analysis (ANLZ) data is loaded separately
//! onto the same handle and joined to tracks through their stored file
//! paths.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::analysis::{AnalysisIndex, TrackAnalysis};
use crate::error::Result;
use crate::page::{PageType, PageTypeExt};
use crate::pdb::PdbFile;
use crate::rows::{
    AlbumRow, ArtistRow, ArtworkRow, ColorRow, GenreRow, HistoryEntryRow, HistoryPlaylistRow,
    KeyRow, LabelRow, PlaylistEntryRow, PlaylistTreeRow, TagRow, TagTrackRow, TrackRow,
};
use crate::track::{
    AlbumId, ArtistId, ArtworkId, BeatGrid, ColorId, CuePoint, GenreId, KeyId, LabelId,
    PlaylistId, SongStructure, TagId, TrackId, WaveformData,
};

/// One child of a playlist folder, positioned by its sort order. Zero-id
/// entries are gap sentinels left by sparse sort orders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaylistFolderEntry {
    pub id: PlaylistId,
    pub is_folder: bool,
    pub name: String,
}

/// Case-insensitive name buckets: keys are lowercased on insert and lookup.
type NameIndex<Id> = BTreeMap<String, BTreeSet<Id>>;

#[derive(Debug, Default)]
struct Indices {
    tracks: BTreeMap<TrackId, TrackRow>,
    artists: BTreeMap<ArtistId, ArtistRow>,
    albums: BTreeMap<AlbumId, AlbumRow>,
    genres: BTreeMap<GenreId, GenreRow>,
    labels: BTreeMap<LabelId, LabelRow>,
    colors: BTreeMap<ColorId, ColorRow>,
    keys: BTreeMap<KeyId, KeyRow>,
    artworks: BTreeMap<ArtworkId, ArtworkRow>,

    track_title: NameIndex<TrackId>,
    track_by_artist: BTreeMap<ArtistId, BTreeSet<TrackId>>,
    track_by_album: BTreeMap<AlbumId, BTreeSet<TrackId>>,
    track_by_genre: BTreeMap<GenreId, BTreeSet<TrackId>>,

    artist_name: NameIndex<ArtistId>,
    album_name: NameIndex<AlbumId>,
    album_by_artist: BTreeMap<ArtistId, BTreeSet<AlbumId>>,
    genre_name: NameIndex<GenreId>,
    label_name: NameIndex<LabelId>,
    color_name: NameIndex<ColorId>,
    key_name: NameIndex<KeyId>,

    playlists: BTreeMap<PlaylistId, Vec<TrackId>>,
    playlist_folders: BTreeMap<PlaylistId, Vec<PlaylistFolderEntry>>,
    history_playlists: BTreeMap<PlaylistId, Vec<TrackId>>,
    history_playlist_names: BTreeMap<PlaylistId, String>,
    history_playlist_by_name: BTreeMap<String, PlaylistId>,

    tags: BTreeMap<TagId, TagRow>,
    categories: BTreeMap<TagId, TagRow>,
    tag_name: NameIndex<TagId>,
    category_order: Vec<TagId>,
    category_tags: BTreeMap<TagId, Vec<TagId>>,
    tracks_by_tag: BTreeMap<TagId, BTreeSet<TrackId>>,
    tags_by_track: BTreeMap<TrackId, BTreeSet<TagId>>,
}

fn insert_name<Id: Ord + Copy>(index: &mut NameIndex<Id>, name: &str, id: Id) {
    if !name.is_empty() {
        index.entry(name.to_lowercase()).or_default().insert(id);
    }
}

fn lookup_name<Id: Ord + Copy>(index: &NameIndex<Id>, name: &str) -> Vec<Id> {
    index
        .get(&name.to_lowercase())
        .map(|ids| ids.iter().copied().collect())
        .unwrap_or_default()
}

fn lookup_set<K: Ord, Id: Ord + Copy>(index: &BTreeMap<K, BTreeSet<Id>>, key: &K) -> Vec<Id> {
    index
        .get(key)
        .map(|ids| ids.iter().copied().collect())
        .unwrap_or_default()
}

/// An opened Rekordbox export. Move-only; after `open` returns, the index
/// structures are read-only and may be shared across threads. Loading ANLZ
/// data mutates the handle and must be serialized by the caller.
#[derive(Debug)]
pub struct Database {
    pdb: PdbFile,
    ix: Indices,
    analysis: AnalysisIndex,
    source_file: PathBuf,
}

impl Database {
    /// Open an export.pdb file and build all indices.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_inner(path.as_ref(), false)
    }

    /// Open an exportExt.pdb file (tags and tag-track associations).
    pub fn open_ext(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_inner(path.as_ref(), true)
    }

    fn open_inner(path: &Path, is_ext: bool) -> Result<Self> {
        let pdb = PdbFile::open(path, is_ext)?;
        let mut ix = Indices::default();

        if is_ext {
            index_tags(&pdb, &mut ix);
            index_tag_tracks(&pdb, &mut ix);
        } else {
            index_tracks(&pdb, &mut ix);
            index_artists(&pdb, &mut ix);
            index_albums(&pdb, &mut ix);
            index_genres(&pdb, &mut ix);
            index_labels(&pdb, &mut ix);
            index_colors(&pdb, &mut ix);
            index_keys(&pdb, &mut ix);
            index_artwork(&pdb, &mut ix);
            index_playlists(&pdb, &mut ix);
            index_playlist_folders(&pdb, &mut ix);
            index_history_playlists(&pdb, &mut ix);
            index_history_entries(&pdb, &mut ix);
        }

        Ok(Self {
            pdb,
            ix,
            analysis: AnalysisIndex::default(),
            source_file: path.to_path_buf(),
        })
    }

    pub fn source_file(&self) -> &Path {
        &self.source_file
    }

    pub fn is_ext(&self) -> bool {
        self.pdb.is_ext()
    }

    // ------------------------------------------------------------------
    // Primary index access
    // ------------------------------------------------------------------

    pub fn get_track(&self, id: TrackId) -> Option<&TrackRow> {
        self.ix.tracks.get(&id)
    }

    pub fn get_artist(&self, id: ArtistId) -> Option<&ArtistRow> {
        self.ix.artists.get(&id)
    }

    pub fn get_album(&self, id: AlbumId) -> Option<&AlbumRow> {
        self.ix.albums.get(&id)
    }

    pub fn get_genre(&self, id: GenreId) -> Option<&GenreRow> {
        self.ix.genres.get(&id)
    }

    pub fn get_label(&self, id: LabelId) -> Option<&LabelRow> {
        self.ix.labels.get(&id)
    }

    pub fn get_color(&self, id: ColorId) -> Option<&ColorRow> {
        self.ix.colors.get(&id)
    }

    pub fn get_key(&self, id: KeyId) -> Option<&KeyRow> {
        self.ix.keys.get(&id)
    }

    pub fn get_artwork(&self, id: ArtworkId) -> Option<&ArtworkRow> {
        self.ix.artworks.get(&id)
    }

    pub fn get_tag(&self, id: TagId) -> Option<&TagRow> {
        self.ix.tags.get(&id)
    }

    pub fn get_tag_category(&self, id: TagId) -> Option<&TagRow> {
        self.ix.categories.get(&id)
    }

    // ------------------------------------------------------------------
    // Name lookups (case-insensitive exact match)
    // ------------------------------------------------------------------

    pub fn find_tracks_by_title(&self, title: &str) -> Vec<TrackId> {
        lookup_name(&self.ix.track_title, title)
    }

    pub fn find_artists_by_name(&self, name: &str) -> Vec<ArtistId> {
        lookup_name(&self.ix.artist_name, name)
    }

    pub fn find_albums_by_name(&self, name: &str) -> Vec<AlbumId> {
        lookup_name(&self.ix.album_name, name)
    }

    pub fn find_genres_by_name(&self, name: &str) -> Vec<GenreId> {
        lookup_name(&self.ix.genre_name, name)
    }

    pub fn find_labels_by_name(&self, name: &str) -> Vec<LabelId> {
        lookup_name(&self.ix.label_name, name)
    }

    pub fn find_colors_by_name(&self, name: &str) -> Vec<ColorId> {
        lookup_name(&self.ix.color_name, name)
    }

    pub fn find_keys_by_name(&self, name: &str) -> Vec<KeyId> {
        lookup_name(&self.ix.key_name, name)
    }

    pub fn find_tags_by_name(&self, name: &str) -> Vec<TagId> {
        lookup_name(&self.ix.tag_name, name)
    }

    // ------------------------------------------------------------------
    // Foreign-key lookups
    // ------------------------------------------------------------------

    /// Tracks where the artist appears as main artist, composer, original
    /// artist, or remixer.
    pub fn find_tracks_by_artist(&self, artist_id: ArtistId) -> Vec<TrackId> {
        lookup_set(&self.ix.track_by_artist, &artist_id)
    }

    pub fn find_tracks_by_album(&self, album_id: AlbumId) -> Vec<TrackId> {
        lookup_set(&self.ix.track_by_album, &album_id)
    }

    pub fn find_tracks_by_genre(&self, genre_id: GenreId) -> Vec<TrackId> {
        lookup_set(&self.ix.track_by_genre, &genre_id)
    }

    pub fn find_albums_by_artist(&self, artist_id: ArtistId) -> Vec<AlbumId> {
        lookup_set(&self.ix.album_by_artist, &artist_id)
    }

    // ------------------------------------------------------------------
    // Range queries (inclusive endpoints)
    // ------------------------------------------------------------------

    /// BPM range; compares against the stored BPM × 100 values.
    pub fn find_tracks_by_bpm_range(&self, min_bpm: f32, max_bpm: f32) -> Vec<TrackId> {
        let min_100 = (min_bpm * 100.0) as u32;
        let max_100 = (max_bpm * 100.0) as u32;
        self.ix
            .tracks
            .iter()
            .filter(|(_, t)| t.bpm_100x >= min_100 && t.bpm_100x <= max_100)
            .map(|(&id, _)| id)
            .collect()
    }

    pub fn find_tracks_by_duration_range(&self, min_secs: u32, max_secs: u32) -> Vec<TrackId> {
        self.ix
            .tracks
            .iter()
            .filter(|(_, t)| t.duration_seconds >= min_secs && t.duration_seconds <= max_secs)
            .map(|(&id, _)| id)
            .collect()
    }

    pub fn find_tracks_by_year_range(&self, min_year: u16, max_year: u16) -> Vec<TrackId> {
        self.ix
            .tracks
            .iter()
            .filter(|(_, t)| t.year >= min_year && t.year <= max_year)
            .map(|(&id, _)| id)
            .collect()
    }

    pub fn find_tracks_by_rating_range(&self, min_rating: u8, max_rating: u8) -> Vec<TrackId> {
        self.ix
            .tracks
            .iter()
            .filter(|(_, t)| t.rating >= min_rating && t.rating <= max_rating)
            .map(|(&id, _)| id)
            .collect()
    }

    pub fn find_tracks_by_year(&self, year: u16) -> Vec<TrackId> {
        self.find_tracks_by_year_range(year, year)
    }

    pub fn find_tracks_by_rating(&self, rating: u8) -> Vec<TrackId> {
        self.find_tracks_by_rating_range(rating, rating)
    }

    // ------------------------------------------------------------------
    // Playlists
    // ------------------------------------------------------------------

    /// Ordered track ids of a playlist. Positions never filled by the scan
    /// hold the zero track id; callers treat those as absent.
    pub fn get_playlist(&self, id: PlaylistId) -> Option<&[TrackId]> {
        self.ix.playlists.get(&id).map(Vec::as_slice)
    }

    pub fn get_playlist_folder(&self, id: PlaylistId) -> Option<&[PlaylistFolderEntry]> {
        self.ix.playlist_folders.get(&id).map(Vec::as_slice)
    }

    pub fn get_history_playlist(&self, id: PlaylistId) -> Option<&[TrackId]> {
        self.ix.history_playlists.get(&id).map(Vec::as_slice)
    }

    pub fn get_history_playlist_name(&self, id: PlaylistId) -> Option<&str> {
        self.ix.history_playlist_names.get(&id).map(String::as_str)
    }

    pub fn find_history_playlist_by_name(&self, name: &str) -> Option<PlaylistId> {
        self.ix
            .history_playlist_by_name
            .get(&name.to_lowercase())
            .copied()
    }

    // ------------------------------------------------------------------
    // Tags (exportExt.pdb)
    // ------------------------------------------------------------------

    pub fn find_tracks_by_tag(&self, tag_id: TagId) -> Vec<TrackId> {
        lookup_set(&self.ix.tracks_by_tag, &tag_id)
    }

    pub fn find_tags_by_track(&self, track_id: TrackId) -> Vec<TagId> {
        lookup_set(&self.ix.tags_by_track, &track_id)
    }

    /// Tag categories in display order.
    pub fn tag_categories(&self) -> &[TagId] {
        &self.ix.category_order
    }

    /// Tags of one category in display order.
    pub fn tags_in_category(&self, category_id: TagId) -> &[TagId] {
        self.ix
            .category_tags
            .get(&category_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn all_tag_ids(&self) -> Vec<TagId> {
        self.ix.tags.keys().copied().collect()
    }

    pub fn tag_count(&self) -> usize {
        self.ix.tags.len()
    }

    // ------------------------------------------------------------------
    // Bulk access
    // ------------------------------------------------------------------

    pub fn all_track_ids(&self) -> Vec<TrackId> {
        self.ix.tracks.keys().copied().collect()
    }

    pub fn all_artist_ids(&self) -> Vec<ArtistId> {
        self.ix.artists.keys().copied().collect()
    }

    pub fn all_album_ids(&self) -> Vec<AlbumId> {
        self.ix.albums.keys().copied().collect()
    }

    pub fn all_genre_ids(&self) -> Vec<GenreId> {
        self.ix.genres.keys().copied().collect()
    }

    pub fn all_playlist_ids(&self) -> Vec<PlaylistId> {
        self.ix.playlists.keys().copied().collect()
    }

    /// Per-track BPM values in track-id order, for columnar consumers.
    pub fn all_bpms(&self) -> Vec<f32> {
        self.ix.tracks.values().map(TrackRow::bpm).collect()
    }

    pub fn all_durations(&self) -> Vec<u32> {
        self.ix.tracks.values().map(|t| t.duration_seconds).collect()
    }

    pub fn all_years(&self) -> Vec<u16> {
        self.ix.tracks.values().map(|t| t.year).collect()
    }

    pub fn all_ratings(&self) -> Vec<u8> {
        self.ix.tracks.values().map(|t| t.rating).collect()
    }

    pub fn all_bitrates(&self) -> Vec<u32> {
        self.ix.tracks.values().map(|t| t.bitrate).collect()
    }

    pub fn all_sample_rates(&self) -> Vec<u32> {
        self.ix.tracks.values().map(|t| t.sample_rate).collect()
    }

    pub fn track_count(&self) -> usize {
        self.ix.tracks.len()
    }

    pub fn artist_count(&self) -> usize {
        self.ix.artists.len()
    }

    pub fn album_count(&self) -> usize {
        self.ix.albums.len()
    }

    pub fn genre_count(&self) -> usize {
        self.ix.genres.len()
    }

    pub fn playlist_count(&self) -> usize {
        self.ix.playlists.len()
    }

    // ------------------------------------------------------------------
    // Analysis (ANLZ) loading and joins
    // ------------------------------------------------------------------

    /// Load a single ANLZ file onto this handle.
    pub fn load_analysis_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.analysis.load_file(path.as_ref())
    }

    /// Recursively scan a directory for ANLZ files; returns how many
    /// loaded. Unreadable files are logged and skipped.
    pub fn load_analysis_dir(&mut self, dir: impl AsRef<Path>) -> usize {
        self.analysis.scan_directory(dir.as_ref())
    }

    /// Number of tracks with any loaded analysis data.
    pub fn analyzed_track_count(&self) -> usize {
        self.analysis.track_count()
    }

    /// Merged analysis record by the exact ANLZ-embedded path.
    pub fn analysis_by_path(&self, track_path: &str) -> Option<&TrackAnalysis> {
        self.analysis.get(track_path)
    }

    /// Merged analysis record for a track, resolved through the track's
    /// stored file path.
    pub fn analysis_for_track(&self, id: TrackId) -> Option<&TrackAnalysis> {
        let track = self.get_track(id)?;
        if track.file_path.is_empty() {
            return None;
        }
        self.analysis.get(&track.file_path)
    }

    /// Merged analysis record of the first indexed path containing
    /// `filename`.
    pub fn analysis_by_filename(&self, filename: &str) -> Option<&TrackAnalysis> {
        self.analysis.find_by_filename(filename)
    }

    pub fn get_cue_points(&self, track_path: &str) -> Vec<CuePoint> {
        self.analysis_by_path(track_path)
            .map(|a| a.cue_points.clone())
            .unwrap_or_default()
    }

    pub fn get_cue_points_for_track(&self, id: TrackId) -> Vec<CuePoint> {
        self.analysis_for_track(id)
            .map(|a| a.cue_points.clone())
            .unwrap_or_default()
    }

    pub fn find_cue_points_by_filename(&self, filename: &str) -> Vec<CuePoint> {
        self.analysis_by_filename(filename)
            .map(|a| a.cue_points.clone())
            .unwrap_or_default()
    }

    pub fn get_beat_grid(&self, track_path: &str) -> Option<&BeatGrid> {
        self.analysis_by_path(track_path)?.beat_grid.as_ref()
    }

    pub fn get_beat_grid_for_track(&self, id: TrackId) -> Option<&BeatGrid> {
        self.analysis_for_track(id)?.beat_grid.as_ref()
    }

    pub fn find_beat_grid_by_filename(&self, filename: &str) -> Option<&BeatGrid> {
        self.analysis_by_filename(filename)?.beat_grid.as_ref()
    }

    pub fn get_song_structure(&self, track_path: &str) -> Option<&SongStructure> {
        self.analysis_by_path(track_path)?.song_structure.as_ref()
    }

    pub fn get_song_structure_for_track(&self, id: TrackId) -> Option<&SongStructure> {
        self.analysis_for_track(id)?.song_structure.as_ref()
    }

    pub fn find_song_structure_by_filename(&self, filename: &str) -> Option<&SongStructure> {
        self.analysis_by_filename(filename)?.song_structure.as_ref()
    }

    pub fn get_waveform_preview(&self, track_path: &str) -> Option<&WaveformData> {
        self.analysis_by_path(track_path)?.waveform_preview.as_ref()
    }

    pub fn get_waveform_preview_for_track(&self, id: TrackId) -> Option<&WaveformData> {
        self.analysis_for_track(id)?.waveform_preview.as_ref()
    }

    pub fn find_waveform_preview_by_filename(&self, filename: &str) -> Option<&WaveformData> {
        self.analysis_by_filename(filename)?.waveform_preview.as_ref()
    }

    pub fn get_waveform_detail(&self, track_path: &str) -> Option<&WaveformData> {
        self.analysis_by_path(track_path)?.waveform_detail.as_ref()
    }

    pub fn get_waveform_detail_for_track(&self, id: TrackId) -> Option<&WaveformData> {
        self.analysis_for_track(id)?.waveform_detail.as_ref()
    }

    pub fn find_waveform_detail_by_filename(&self, filename: &str) -> Option<&WaveformData> {
        self.analysis_by_filename(filename)?.waveform_detail.as_ref()
    }

    pub fn get_color_preview(&self, track_path: &str) -> Option<&WaveformData> {
        self.analysis_by_path(track_path)?.color_preview.as_ref()
    }

    pub fn get_color_preview_for_track(&self, id: TrackId) -> Option<&WaveformData> {
        self.analysis_for_track(id)?.color_preview.as_ref()
    }

    pub fn find_color_preview_by_filename(&self, filename: &str) -> Option<&WaveformData> {
        self.analysis_by_filename(filename)?.color_preview.as_ref()
    }
}

// ----------------------------------------------------------------------
// Index building
// ----------------------------------------------------------------------

fn index_tracks(pdb: &PdbFile, ix: &mut Indices) {
    pdb.scan_table(PageType::Tracks as u32, |row_base| {
        let Some(row) = TrackRow::decode(pdb, row_base) else {
            warn!(row_base, "skipping malformed track row");
            return;
        };

        insert_name(&mut ix.track_title, &row.title, row.id);
        for artist in [
            row.artist_id,
            row.composer_id,
            row.original_artist_id,
            row.remixer_id,
        ] {
            if artist.0 > 0 {
                ix.track_by_artist.entry(artist).or_default().insert(row.id);
            }
        }
        if row.album_id.0 > 0 {
            ix.track_by_album.entry(row.album_id).or_default().insert(row.id);
        }
        if row.genre_id.0 > 0 {
            ix.track_by_genre.entry(row.genre_id).or_default().insert(row.id);
        }

        ix.tracks.insert(row.id, row);
    });
    info!(tracks = ix.tracks.len(), "indexed tracks");
}

fn index_artists(pdb: &PdbFile, ix: &mut Indices) {
    pdb.scan_table(PageType::Artists as u32, |row_base| {
        let Some(row) = ArtistRow::decode(pdb, row_base) else {
            warn!(row_base, "skipping malformed artist row");
            return;
        };
        insert_name(&mut ix.artist_name, &row.name, row.id);
        ix.artists.insert(row.id, row);
    });
    info!(artists = ix.artists.len(), "indexed artists");
}

fn index_albums(pdb: &PdbFile, ix: &mut Indices) {
    pdb.scan_table(PageType::Albums as u32, |row_base| {
        let Some(row) = AlbumRow::decode(pdb, row_base) else {
            warn!(row_base, "skipping malformed album row");
            return;
        };
        insert_name(&mut ix.album_name, &row.name, row.id);
        if row.artist_id.0 > 0 {
            ix.album_by_artist.entry(row.artist_id).or_default().insert(row.id);
        }
        ix.albums.insert(row.id, row);
    });
    info!(albums = ix.albums.len(), "indexed albums");
}

fn index_genres(pdb: &PdbFile, ix: &mut Indices) {
    pdb.scan_table(PageType::Genres as u32, |row_base| {
        let Some(row) = GenreRow::decode(pdb, row_base) else {
            return;
        };
        insert_name(&mut ix.genre_name, &row.name, row.id);
        ix.genres.insert(row.id, row);
    });
    info!(genres = ix.genres.len(), "indexed genres");
}

fn index_labels(pdb: &PdbFile, ix: &mut Indices) {
    pdb.scan_table(PageType::Labels as u32, |row_base| {
        let Some(row) = LabelRow::decode(pdb, row_base) else {
            return;
        };
        insert_name(&mut ix.label_name, &row.name, row.id);
        ix.labels.insert(row.id, row);
    });
    info!(labels = ix.labels.len(), "indexed labels");
}

fn index_colors(pdb: &PdbFile, ix: &mut Indices) {
    pdb.scan_table(PageType::Colors as u32, |row_base| {
        let Some(row) = ColorRow::decode(pdb, row_base) else {
            return;
        };
        insert_name(&mut ix.color_name, &row.name, row.id);
        ix.colors.insert(row.id, row);
    });
    info!(colors = ix.colors.len(), "indexed colors");
}

fn index_keys(pdb: &PdbFile, ix: &mut Indices) {
    pdb.scan_table(PageType::Keys as u32, |row_base| {
        let Some(row) = KeyRow::decode(pdb, row_base) else {
            return;
        };
        insert_name(&mut ix.key_name, &row.name, row.id);
        ix.keys.insert(row.id, row);
    });
    info!(keys = ix.keys.len(), "indexed musical keys");
}

fn index_artwork(pdb: &PdbFile, ix: &mut Indices) {
    pdb.scan_table(PageType::Artwork as u32, |row_base| {
        let Some(row) = ArtworkRow::decode(pdb, row_base) else {
            return;
        };
        ix.artworks.insert(row.id, row);
    });
    info!(artworks = ix.artworks.len(), "indexed artwork paths");
}

fn index_playlists(pdb: &PdbFile, ix: &mut Indices) {
    pdb.scan_table(PageType::PlaylistEntries as u32, |row_base| {
        let Some(row) = PlaylistEntryRow::decode(pdb, row_base) else {
            return;
        };
        let playlist = ix.playlists.entry(row.playlist_id).or_default();
        let index = row.entry_index as usize;
        if playlist.len() <= index {
            playlist.resize(index + 1, TrackId::default());
        }
        playlist[index] = row.track_id;
    });
    info!(playlists = ix.playlists.len(), "indexed playlists");
}

fn index_playlist_folders(pdb: &PdbFile, ix: &mut Indices) {
    pdb.scan_table(PageType::PlaylistTree as u32, |row_base| {
        let Some(row) = PlaylistTreeRow::decode(pdb, row_base) else {
            return;
        };
        let folder = ix.playlist_folders.entry(row.parent_id).or_default();
        let index = row.sort_order as usize;
        if folder.len() <= index {
            folder.resize(index + 1, PlaylistFolderEntry::default());
        }
        folder[index] = PlaylistFolderEntry {
            id: row.id,
            is_folder: row.is_folder,
            name: row.name,
        };
    });
    info!(folders = ix.playlist_folders.len(), "indexed playlist folders");
}

fn index_history_playlists(pdb: &PdbFile, ix: &mut Indices) {
    pdb.scan_table(PageType::HistoryPlaylists as u32, |row_base| {
        let Some(row) = HistoryPlaylistRow::decode(pdb, row_base) else {
            return;
        };
        if !row.name.is_empty() {
            ix.history_playlist_by_name
                .insert(row.name.to_lowercase(), row.id);
        }
        ix.history_playlist_names.insert(row.id, row.name);
    });
    info!(
        history_playlists = ix.history_playlist_names.len(),
        "indexed history playlists"
    );
}

fn index_history_entries(pdb: &PdbFile, ix: &mut Indices) {
    pdb.scan_table(PageType::HistoryEntries as u32, |row_base| {
        let Some(row) = HistoryEntryRow::decode(pdb, row_base) else {
            return;
        };
        let playlist = ix.history_playlists.entry(row.playlist_id).or_default();
        let index = row.entry_index as usize;
        if playlist.len() <= index {
            playlist.resize(index + 1, TrackId::default());
        }
        playlist[index] = row.track_id;
    });
    info!(
        history_lists = ix.history_playlists.len(),
        "indexed history entries"
    );
}

fn index_tags(pdb: &PdbFile, ix: &mut Indices) {
    // (position, id) pairs collected first so ordering happens once the
    // scan is complete
    let mut category_positions: Vec<(u32, TagId)> = Vec::new();
    let mut tag_positions: BTreeMap<TagId, Vec<(u32, TagId)>> = BTreeMap::new();

    pdb.scan_table(PageTypeExt::Tags as u32, |row_base| {
        let Some(row) = TagRow::decode(pdb, row_base) else {
            warn!(row_base, "skipping malformed tag row");
            return;
        };

        if row.is_category {
            category_positions.push((row.category_pos, row.id));
            ix.categories.insert(row.id, row);
        } else {
            insert_name(&mut ix.tag_name, &row.name, row.id);
            tag_positions
                .entry(row.category)
                .or_default()
                .push((row.category_pos, row.id));
            ix.tags.insert(row.id, row);
        }
    });

    category_positions.sort_unstable();
    ix.category_order = category_positions.into_iter().map(|(_, id)| id).collect();

    for (category, mut tags) in tag_positions {
        tags.sort_unstable();
        ix.category_tags
            .insert(category, tags.into_iter().map(|(_, id)| id).collect());
    }

    info!(
        tags = ix.tags.len(),
        categories = ix.categories.len(),
        "indexed tags"
    );
}

fn index_tag_tracks(pdb: &PdbFile, ix: &mut Indices) {
    pdb.scan_table(PageTypeExt::TagTracks as u32, |row_base| {
        let Some(row) = TagTrackRow::decode(pdb, row_base) else {
            return;
        };
        ix.tracks_by_tag.entry(row.tag_id).or_default().insert(row.track_id);
        ix.tags_by_track.entry(row.track_id).or_default().insert(row.tag_id);
    });
    info!(
        tagged_tracks = ix.tags_by_track.len(),
        "indexed tag-track associations"
    );
}
