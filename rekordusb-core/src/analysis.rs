//! Per-track analysis index built from ANLZ files
//!
//! A track's analysis is usually spread over several files (.DAT, .EXT,
//! .2EX) that all embed the same track path in their PPTH section. This
//! module folds them into one record per track and answers lookups by
//! exact path or filename substring.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{info, warn};
use walkdir::WalkDir;

use crate::anlz::AnlzFile;
use crate::error::Result;
use crate::track::{BeatGrid, CuePoint, SongStructure, WaveformData};

/// ANLZ file extensions, matched case-insensitively
const ANLZ_EXTENSIONS: [&str; 3] = ["dat", "ext", "2ex"];

/// Merged analysis artifacts for one track.
#[derive(Debug, Clone, Default)]
pub struct TrackAnalysis {
    /// Active cue points, sorted by time
    pub cue_points: Vec<CuePoint>,
    /// True once an extended (PCX2) cue list has been merged in
    pub cues_extended: bool,
    pub beat_grid: Option<BeatGrid>,
    pub waveform_preview: Option<WaveformData>,
    pub color_preview: Option<WaveformData>,
    pub waveform_detail: Option<WaveformData>,
    pub song_structure: Option<SongStructure>,
}

impl TrackAnalysis {
    /// Fold one parsed ANLZ file into this record.
    ///
    /// Merge rules: extended cue lists replace standard ones, otherwise the
    /// first contributor wins; beat grid, song structure, and the blue
    /// preview are first-writer-wins; detail and color waveforms upgrade to
    /// the higher-quality style and discard lower-quality contributions.
    fn merge(&mut self, anlz: AnlzFile) {
        if !anlz.cue_points.is_empty() {
            if anlz.cues_extended && !self.cues_extended {
                self.cue_points = anlz.cue_points;
                self.cues_extended = true;
            } else if self.cue_points.is_empty() {
                self.cue_points = anlz.cue_points;
                self.cues_extended = anlz.cues_extended;
            }
        }

        if self.beat_grid.is_none() {
            self.beat_grid = anlz.beat_grid;
        }
        if self.song_structure.is_none() {
            self.song_structure = anlz.song_structure;
        }
        if self.waveform_preview.is_none() {
            self.waveform_preview = anlz.waveform_preview;
        }

        if let Some(candidate) = anlz.waveform_detail {
            match &self.waveform_detail {
                Some(existing) if existing.style >= candidate.style => {}
                _ => self.waveform_detail = Some(candidate),
            }
        }
        if let Some(candidate) = anlz.color_preview {
            match &self.color_preview {
                Some(existing) if existing.style >= candidate.style => {}
                _ => self.color_preview = Some(candidate),
            }
        }
    }
}

/// Index of track analyses keyed by the path embedded in each ANLZ file
/// (or the file stem when no PPTH section is present). A `BTreeMap` keeps
/// substring lookups deterministic.
#[derive(Debug, Default)]
pub struct AnalysisIndex {
    tracks: BTreeMap<String, TrackAnalysis>,
}

impl AnalysisIndex {
    /// Parse one ANLZ file and merge it into the index.
    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        let anlz = AnlzFile::open(path)?;

        let key = match &anlz.path {
            Some(track_path) if !track_path.is_empty() => track_path.clone(),
            _ => path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };
        if key.is_empty() {
            return Ok(());
        }

        self.tracks.entry(key).or_default().merge(anlz);
        Ok(())
    }

    /// Recursively scan a directory for ANLZ files. Files that fail to
    /// parse are logged and skipped; returns how many loaded.
    pub fn scan_directory(&mut self, dir: &Path) -> usize {
        if !dir.exists() {
            warn!(dir = %dir.display(), "analysis directory does not exist");
            return 0;
        }

        let mut loaded = 0usize;
        for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let matches = entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| {
                    let ext = ext.to_ascii_lowercase();
                    ANLZ_EXTENSIONS.contains(&ext.as_str())
                })
                .unwrap_or(false);
            if !matches {
                continue;
            }

            match self.load_file(entry.path()) {
                Ok(()) => loaded += 1,
                Err(err) => {
                    warn!(
                        path = %entry.path().display(),
                        kind = err.kind.as_str(),
                        source = %err.source_location(),
                        "skipping unreadable ANLZ file: {}", err.message
                    );
                }
            }
        }

        info!(
            dir = %dir.display(),
            loaded,
            tracks = self.tracks.len(),
            "scanned analysis directory"
        );
        loaded
    }

    /// Exact-path lookup.
    pub fn get(&self, track_path: &str) -> Option<&TrackAnalysis> {
        self.tracks.get(track_path)
    }

    /// First entry whose key contains `filename`, in key order.
    pub fn find_by_filename(&self, filename: &str) -> Option<&TrackAnalysis> {
        self.tracks
            .iter()
            .find(|(path, _)| path.contains(filename))
            .map(|(_, analysis)| analysis)
    }

    /// Number of tracks with any loaded analysis.
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }
}
