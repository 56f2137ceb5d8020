//! Append-only replay log.
//!
//! Every running tick is recorded as a [`Frame`]. The log file is a single
//! JSON array of frames, which keeps it readable and diffable, and it is
//! grown without ever rewriting earlier frames: an append seeks to the
//! closing `]` and overwrites it with `,<frame>]` (or `<frame>]` for the
//! first element). Appending is O(1) in the size of the log.
//!
//! Reading is lazy. The full array is parsed only on the first scrub
//! request, so a live recording never pays for parsing.
//!
//! # Divergence
//!
//! When live simulation resumes from a scrubbed-back cursor, the recorded
//! future is no longer a valid continuation of history.
//! [`ReplayLog::truncate_from`] drops every frame at or after the cursor and
//! the next append reuses the cursor's id.
//!
//! # Example
//!
//! ```
//! use robosim_core::replay::{Direction, ReplayLog, Snapshot};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let mut log = ReplayLog::create_at(dir.path().join("demo.json")).unwrap();
//!
//! for _ in 0..5 {
//!     log.append(&Snapshot::default()).unwrap();
//! }
//!
//! log.begin_scrubbing();
//! let frame = log.step(4, Direction::Backward).unwrap().unwrap();
//! assert_eq!(frame.id, 3);
//!
//! log.truncate_from(3).unwrap();
//! assert_eq!(log.append(&Snapshot::default()).unwrap(), 3);
//! ```

mod frame;

pub use frame::{AgentRecord, Direction, Frame, Snapshot};

use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};
use tracing::{debug, info, trace, warn};

use crate::error::LogError;

/// Timestamp layout used in log file names.
pub const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S-%3f";

/// Whether the log accepts appends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogMode {
    /// Recording; appends are accepted.
    Live,
    /// Cursor navigation; appends are rejected until the log is truncated.
    Scrubbing,
}

/// A replay log file exclusively owned by one simulation.
#[derive(Debug)]
pub struct ReplayLog {
    path: PathBuf,
    file: File,
    /// Byte offset of the closing `]`, always the last byte of the file.
    close_offset: u64,
    /// Frames currently in the file.
    on_disk: u64,
    next_id: u64,
    mode: LogMode,
    /// Parsed frames, present once a scrub has loaded them.
    frames: Option<Vec<Frame>>,
}

impl ReplayLog {
    /// Creates `<dir>/<arena>_<timestamp>.json`, creating `dir` if needed.
    ///
    /// If a log with that name already exists (two sessions on one arena
    /// within the same millisecond) the name gets a `-1`, `-2`, ... suffix.
    /// Existing files are never overwritten.
    ///
    /// # Errors
    ///
    /// [`LogError::CreateDir`] if the directory cannot be created and
    /// [`LogError::Io`] if the file cannot be created.
    pub fn create<Tz>(dir: &Path, arena_name: &str, created: &DateTime<Tz>) -> Result<Self, LogError>
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        fs::create_dir_all(dir).map_err(|source| LogError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;
        let stem = format!("{arena_name}_{}", created.format(LOG_TIMESTAMP_FORMAT));
        let mut attempt = 0u32;
        loop {
            let name = match attempt {
                0 => format!("{stem}.json"),
                n => format!("{stem}-{n}.json"),
            };
            match Self::create_at(dir.join(name)) {
                Err(LogError::AlreadyExists(taken)) => {
                    debug!(path = %taken.display(), "log name taken, trying next suffix");
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    /// Creates an empty log at exactly `path`.
    ///
    /// # Errors
    ///
    /// [`LogError::AlreadyExists`] if the file exists, [`LogError::Io`] for
    /// any other failure.
    pub fn create_at(path: impl Into<PathBuf>) -> Result<Self, LogError> {
        let path = path.into();
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|source| match source.kind() {
                ErrorKind::AlreadyExists => LogError::AlreadyExists(path.clone()),
                _ => LogError::Io {
                    path: path.clone(),
                    source,
                },
            })?;
        file.write_all(b"[]").map_err(|source| LogError::Io {
            path: path.clone(),
            source,
        })?;

        info!(path = %path.display(), "replay log created");
        Ok(Self {
            path,
            file,
            close_offset: 1,
            on_disk: 0,
            next_id: 0,
            mode: LogMode::Live,
            frames: None,
        })
    }

    /// Opens an existing log for replay or continued recording.
    ///
    /// The file is parsed once; trailing whitespace after the closing `]` is
    /// trimmed so appends can resume. The append counter continues after the
    /// highest recorded id.
    ///
    /// # Errors
    ///
    /// [`LogError::Io`], [`LogError::Parse`] or [`LogError::NotAnArray`].
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LogError> {
        let path = path.into();
        let io_err = |source| LogError::Io {
            path: path.clone(),
            source,
        };
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(io_err)?;

        let mut content = String::new();
        file.read_to_string(&mut content).map_err(io_err)?;

        let trimmed = content.trim_end();
        if !trimmed.ends_with(']') {
            return Err(LogError::NotAnArray(path));
        }
        let frames: Vec<Frame> = serde_json::from_str(trimmed).map_err(|source| LogError::Parse {
            path: path.clone(),
            source,
        })?;

        let kept = trimmed.len() as u64;
        if kept != content.len() as u64 {
            file.set_len(kept).map_err(io_err)?;
        }

        let next_id = frames.iter().map(|f| f.id + 1).max().unwrap_or(0);
        debug!(path = %path.display(), frames = frames.len(), next_id, "replay log opened");
        Ok(Self {
            close_offset: kept - 1,
            on_disk: frames.len() as u64,
            next_id,
            mode: LogMode::Live,
            frames: Some(frames),
            path,
            file,
        })
    }

    /// Records `snapshot` as the next frame and returns its id.
    ///
    /// The frame is serialized before anything touches the file and written
    /// with a single `write_all`. If the write fails the closing bracket is
    /// restored, so the file never holds a partial frame.
    ///
    /// # Errors
    ///
    /// [`LogError::NotLive`] while scrubbing, [`LogError::Encode`] or
    /// [`LogError::Io`] otherwise.
    pub fn append(&mut self, snapshot: &Snapshot) -> Result<u64, LogError> {
        if self.mode != LogMode::Live {
            return Err(LogError::NotLive);
        }

        let id = self.next_id;
        let frame = Frame::new(id, snapshot);
        let body =
            serde_json::to_string_pretty(&frame).map_err(|source| LogError::Encode { id, source })?;

        let mut chunk = String::with_capacity(body.len() + 2);
        if self.on_disk > 0 {
            chunk.push(',');
        }
        chunk.push_str(&body);
        chunk.push(']');

        if let Err(source) = self.write_at_close(chunk.as_bytes()) {
            if let Err(repair) = self.restore_tail() {
                warn!(path = %self.path.display(), error = %repair, "failed to restore log tail");
            }
            return Err(self.io_error(source));
        }

        self.close_offset += chunk.len() as u64 - 1;
        self.on_disk += 1;
        self.next_id += 1;
        if let Some(frames) = &mut self.frames {
            frames.push(frame);
        }
        trace!(id, "frame appended");
        Ok(id)
    }

    fn write_at_close(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(self.close_offset))?;
        self.file.write_all(bytes)
    }

    fn restore_tail(&mut self) -> io::Result<()> {
        self.file.set_len(self.close_offset)?;
        self.write_at_close(b"]")
    }

    fn io_error(&self, source: io::Error) -> LogError {
        LogError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Switches to scrubbing; appends are rejected until
    /// [`truncate_from`](Self::truncate_from) returns the log to live mode.
    pub fn begin_scrubbing(&mut self) {
        self.mode = LogMode::Scrubbing;
    }

    /// Parses the whole file on first use and returns all frames.
    ///
    /// # Errors
    ///
    /// [`LogError::Io`] or [`LogError::Parse`].
    pub fn load_if_needed(&mut self) -> Result<&[Frame], LogError> {
        if self.frames.is_none() {
            let frames = self.read_frames()?;
            debug!(path = %self.path.display(), frames = frames.len(), "replay log loaded");
            self.frames = Some(frames);
        }
        Ok(self.frames.as_deref().unwrap_or_default())
    }

    fn read_frames(&mut self) -> Result<Vec<Frame>, LogError> {
        let mut content = String::new();
        self.file
            .seek(SeekFrom::Start(0))
            .and_then(|_| self.file.read_to_string(&mut content))
            .map_err(|source| self.io_error(source))?;
        serde_json::from_str(&content).map_err(|source| LogError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Returns the frame one step from `cursor` in `direction`.
    ///
    /// `None` means there is no such frame: the cursor is at the first or
    /// last recorded id.
    ///
    /// # Errors
    ///
    /// Propagates failures from [`load_if_needed`](Self::load_if_needed).
    pub fn step(&mut self, cursor: u64, direction: Direction) -> Result<Option<&Frame>, LogError> {
        let Some(target) = direction.from_cursor(cursor) else {
            return Ok(None);
        };
        let frames = self.load_if_needed()?;
        Ok(frames
            .binary_search_by_key(&target, |f| f.id)
            .ok()
            .map(|index| &frames[index]))
    }

    /// Discards every frame with `id >= cursor` and returns to live mode.
    ///
    /// The file is rewritten with the surviving frames. The next append gets
    /// `cursor`, or the current next id if that is smaller, so ids never
    /// skip.
    ///
    /// # Errors
    ///
    /// [`LogError::Io`], [`LogError::Parse`] or [`LogError::Encode`]. On
    /// failure the in-memory cache is dropped and reloaded on next use.
    pub fn truncate_from(&mut self, cursor: u64) -> Result<(), LogError> {
        self.load_if_needed()?;
        let mut frames = self.frames.take().unwrap_or_default();
        frames.retain(|f| f.id < cursor);

        let mut content = String::from("[");
        for (i, frame) in frames.iter().enumerate() {
            if i > 0 {
                content.push(',');
            }
            let body = serde_json::to_string_pretty(frame).map_err(|source| LogError::Encode {
                id: frame.id,
                source,
            })?;
            content.push_str(&body);
        }
        content.push(']');

        let len = content.len() as u64;
        self.file = self
            .replace_file(content.as_bytes())
            .map_err(|source| self.io_error(source))?;

        let dropped = self.on_disk - frames.len() as u64;
        self.close_offset = len - 1;
        self.on_disk = frames.len() as u64;
        self.next_id = self.next_id.min(cursor);
        self.mode = LogMode::Live;
        self.frames = Some(frames);

        info!(path = %self.path.display(), cursor, dropped, "replay log truncated");
        Ok(())
    }

    /// Writes `content` beside the log, renames it over the log and reopens
    /// it. A crash mid-rewrite leaves either the old or the new file.
    fn replace_file(&self, content: &[u8]) -> io::Result<File> {
        let mut staging = self.path.clone().into_os_string();
        staging.push(".tmp");
        let staging = PathBuf::from(staging);

        let mut tmp = File::create(&staging)?;
        tmp.write_all(content)?;
        tmp.sync_data()?;
        drop(tmp);
        fs::rename(&staging, &self.path)?;

        OpenOptions::new().read(true).write(true).open(&self.path)
    }

    /// Flushes written frames to stable storage.
    ///
    /// # Errors
    ///
    /// [`LogError::Io`].
    pub fn sync(&mut self) -> Result<(), LogError> {
        self.file.sync_data().map_err(|source| self.io_error(source))
    }

    /// Path of the log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current mode.
    #[must_use]
    pub fn mode(&self) -> LogMode {
        self.mode
    }

    /// Id the next append will receive.
    #[must_use]
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Highest recorded id, if any frame exists.
    #[must_use]
    pub fn last_id(&self) -> Option<u64> {
        self.next_id.checked_sub(1)
    }

    /// Number of frames in the file.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.on_disk
    }

    /// Returns true if no frame has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.on_disk == 0
    }

    /// Loaded frames, if a scrub has parsed the file.
    #[must_use]
    pub fn frames(&self) -> Option<&[Frame]> {
        self.frames.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Angle;
    use chrono::Local;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn snapshot(i: u64) -> Snapshot {
        #[allow(clippy::cast_precision_loss)]
        let x = i as f64 * 1.25;
        Snapshot {
            agents: vec![
                AgentRecord {
                    x,
                    y: 30.0,
                    angle: Angle::new(i as i64),
                },
                AgentRecord {
                    x: 600.0 - x,
                    y: 90.0,
                    angle: Angle::new(180),
                },
            ],
            controlled_agents: vec![AgentRecord {
                x: 300.0,
                y: 300.0 + x,
                angle: Angle::new(-(i as i64)),
            }],
        }
    }

    fn fresh_log(dir: &TempDir) -> ReplayLog {
        ReplayLog::create_at(dir.path().join("test.json")).unwrap()
    }

    fn file_frames(log: &ReplayLog) -> Vec<Frame> {
        let content = fs::read_to_string(log.path()).unwrap();
        serde_json::from_str(&content).unwrap()
    }

    #[test]
    fn create_writes_empty_array() {
        let dir = tempfile::tempdir().unwrap();
        let log = fresh_log(&dir);
        assert_eq!(fs::read_to_string(log.path()).unwrap(), "[]");
        assert!(log.is_empty());
        assert_eq!(log.next_id(), 0);
        assert_eq!(log.last_id(), None);
    }

    #[test]
    fn create_refuses_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let _log = fresh_log(&dir);
        let err = ReplayLog::create_at(dir.path().join("test.json")).unwrap_err();
        assert!(matches!(err, LogError::AlreadyExists(_)));
    }

    #[test]
    fn create_names_file_by_arena_and_time() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("data").join("logs");
        let when = Local.with_ymd_and_hms(2024, 5, 5, 13, 7, 9).single().unwrap();
        let log = ReplayLog::create(&logs, "maze", &when).unwrap();
        assert_eq!(
            log.path().file_name().unwrap().to_str().unwrap(),
            "maze_2024-05-05_13-07-09-000.json"
        );
    }

    #[test]
    fn create_suffixes_taken_names() {
        let dir = tempfile::tempdir().unwrap();
        let when = Local.with_ymd_and_hms(2024, 5, 5, 13, 7, 9).single().unwrap();
        let mut first = ReplayLog::create(dir.path(), "maze", &when).unwrap();
        first.append(&snapshot(0)).unwrap();

        let names: Vec<String> = (0..3)
            .map(|_| {
                let log = ReplayLog::create(dir.path(), "maze", &when).unwrap();
                log.path().file_name().unwrap().to_string_lossy().into_owned()
            })
            .collect();
        assert_eq!(
            names,
            [
                "maze_2024-05-05_13-07-09-000-1.json",
                "maze_2024-05-05_13-07-09-000-2.json",
                "maze_2024-05-05_13-07-09-000-3.json",
            ]
        );
        // the first session's log was left alone
        assert_eq!(file_frames(&first).len(), 1);
    }

    #[test]
    fn create_fails_when_dir_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();
        let err = ReplayLog::create(&blocker.join("logs"), "maze", &Local::now()).unwrap_err();
        assert!(matches!(err, LogError::CreateDir { .. }));
    }

    #[test]
    fn ids_are_gapless_from_zero() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = fresh_log(&dir);
        let ids: Vec<u64> = (0..25).map(|i| log.append(&snapshot(i)).unwrap()).collect();
        assert_eq!(ids, (0..25).collect::<Vec<_>>());
        assert_eq!(log.len(), 25);
    }

    #[test]
    fn appended_frames_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = fresh_log(&dir);
        for i in 0..12 {
            log.append(&snapshot(i)).unwrap();
        }

        let loaded = log.load_if_needed().unwrap().to_vec();
        assert_eq!(loaded.len(), 12);
        for (i, frame) in loaded.iter().enumerate() {
            assert_eq!(frame.id, i as u64);
            assert_eq!(frame.snapshot(), snapshot(i as u64));
        }
        assert_eq!(file_frames(&log), loaded);
    }

    #[test]
    fn append_leaves_earlier_bytes_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = fresh_log(&dir);
        log.append(&snapshot(0)).unwrap();
        log.append(&snapshot(1)).unwrap();
        let before = fs::read(log.path()).unwrap();

        log.append(&snapshot(2)).unwrap();
        let after = fs::read(log.path()).unwrap();

        // everything up to the old closing bracket is unchanged
        assert_eq!(&after[..before.len() - 1], &before[..before.len() - 1]);
        assert_eq!(after.last(), Some(&b']'));
    }

    #[test]
    fn failed_append_keeps_file_parseable() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = fresh_log(&dir);
        log.append(&snapshot(0)).unwrap();
        log.append(&snapshot(1)).unwrap();
        let before = fs::read(log.path()).unwrap();

        // a read-only handle makes every write fail
        log.file = File::open(log.path()).unwrap();
        let err = log.append(&snapshot(2)).unwrap_err();
        assert!(matches!(err, LogError::Io { .. }));

        assert_eq!(log.next_id(), 2);
        assert_eq!(log.len(), 2);
        assert_eq!(fs::read(log.path()).unwrap(), before);
        assert_eq!(file_frames(&log).len(), 2);
    }

    #[test]
    fn loading_is_lazy() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = fresh_log(&dir);
        log.append(&snapshot(0)).unwrap();
        assert!(log.frames().is_none());

        log.begin_scrubbing();
        assert!(log.step(0, Direction::Forward).unwrap().is_none());
        assert_eq!(log.frames().map(<[Frame]>::len), Some(1));
    }

    #[test]
    fn step_stops_at_both_ends() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = fresh_log(&dir);
        for i in 0..3 {
            log.append(&snapshot(i)).unwrap();
        }
        log.begin_scrubbing();

        assert_eq!(log.step(2, Direction::Backward).unwrap().map(|f| f.id), Some(1));
        assert_eq!(log.step(1, Direction::Forward).unwrap().map(|f| f.id), Some(2));
        assert!(log.step(2, Direction::Forward).unwrap().is_none());
        assert!(log.step(0, Direction::Backward).unwrap().is_none());
    }

    #[test]
    fn scrubbing_rejects_appends() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = fresh_log(&dir);
        log.append(&snapshot(0)).unwrap();
        log.begin_scrubbing();
        assert!(matches!(log.append(&snapshot(1)), Err(LogError::NotLive)));
        assert_eq!(log.mode(), LogMode::Scrubbing);
    }

    #[test]
    fn truncation_law() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = fresh_log(&dir);
        for i in 0..11 {
            log.append(&snapshot(i)).unwrap();
        }
        log.begin_scrubbing();
        log.truncate_from(7).unwrap();
        assert_eq!(log.mode(), LogMode::Live);

        let ids: Vec<u64> = file_frames(&log).iter().map(|f| f.id).collect();
        assert_eq!(ids, (0..7).collect::<Vec<_>>());

        assert_eq!(log.append(&snapshot(99)).unwrap(), 7);
        let frames = file_frames(&log);
        assert_eq!(frames.len(), 8);
        assert_eq!(frames[7].snapshot(), snapshot(99));
        assert_eq!(log.load_if_needed().unwrap(), frames.as_slice());
    }

    #[test]
    fn truncate_to_empty_then_append() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = fresh_log(&dir);
        for i in 0..3 {
            log.append(&snapshot(i)).unwrap();
        }
        log.truncate_from(0).unwrap();
        assert_eq!(fs::read_to_string(log.path()).unwrap(), "[]");
        assert!(log.is_empty());
        assert_eq!(log.append(&snapshot(5)).unwrap(), 0);
        assert_eq!(file_frames(&log).len(), 1);
    }

    #[test]
    fn truncate_past_end_keeps_ids_gapless() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = fresh_log(&dir);
        for i in 0..3 {
            log.append(&snapshot(i)).unwrap();
        }
        log.truncate_from(10).unwrap();
        assert_eq!(log.len(), 3);
        assert_eq!(log.append(&snapshot(3)).unwrap(), 3);
    }

    #[test]
    fn open_resumes_existing_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = {
            let mut log = fresh_log(&dir);
            for i in 0..4 {
                log.append(&snapshot(i)).unwrap();
            }
            log.path().to_path_buf()
        };
        // editors like to add a trailing newline
        let mut content = fs::read_to_string(&path).unwrap();
        content.push('\n');
        fs::write(&path, content).unwrap();

        let mut log = ReplayLog::open(&path).unwrap();
        assert_eq!(log.len(), 4);
        assert_eq!(log.next_id(), 4);
        assert_eq!(log.append(&snapshot(4)).unwrap(), 4);
        assert_eq!(file_frames(&log).len(), 5);
    }

    #[test]
    fn open_rejects_non_arrays() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{"id": 0}"#).unwrap();
        assert!(matches!(ReplayLog::open(&path), Err(LogError::NotAnArray(_))));

        fs::write(&path, "[{]").unwrap();
        assert!(matches!(ReplayLog::open(&path), Err(LogError::Parse { .. })));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// `truncate_from(k)` keeps exactly the ids below `k`, and the next
        /// append continues from there.
        #[test]
        fn truncate_keeps_prefix(total in 0u64..20, k in 0u64..25) {
            let dir = tempfile::tempdir().unwrap();
            let mut log = fresh_log(&dir);
            for i in 0..total {
                log.append(&snapshot(i)).unwrap();
            }
            log.truncate_from(k).unwrap();

            let expected: Vec<u64> = (0..total.min(k)).collect();
            let ids: Vec<u64> = file_frames(&log).iter().map(|f| f.id).collect();
            prop_assert_eq!(ids, expected);
            prop_assert_eq!(log.append(&snapshot(0)).unwrap(), total.min(k));
        }
    }
}
