//! Session management
//!
//! A session is one execution of an executable. It owns a timestamped directory under
//! `<sw_root>/<sessions_dir>` holding the log file and any data archived during the run, and
//! fixes the epoch that log timestamps are measured from.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use conquer_once::OnceCell;
use erased_serde::Serialize;
use log::{info, warn};
use std::ffi::OsStr;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Mutex;
use std::thread::{self, JoinHandle};
use thiserror::Error;

use crate::time;

// ---------------------------------------------------------------------------
// STATICS
// ---------------------------------------------------------------------------

static SESSION_EPOCH: OnceCell<DateTime<Utc>> = OnceCell::uninit();
static SAVE_SENDER: OnceCell<Mutex<Sender<SaveMsg>>> = OnceCell::uninit();

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// chrono format string used for session directory names and archive file names, see
/// https://docs.rs/chrono/0.4/chrono/format/strftime/index.html
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Information about the current session
pub struct Session {
    /// The root directory for this session
    pub session_root: PathBuf,

    /// The path to the session's log file
    pub log_file_path: PathBuf,

    save_sender: Sender<SaveMsg>,

    save_handle: Option<JoinHandle<()>>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors associated with the session module.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("The software root environment variable ({}) is not set", crate::host::SW_ROOT_ENV_VAR)]
    SwRootNotSet,

    #[error("Cannot create the session directory: {0}")]
    CannotCreateDir(std::io::Error),

    #[error(
        "Cannot initialise the session epoch, have you already initialised the \
         session? (conquer_once error: {0})"
    )]
    CannotInitEpoch(conquer_once::TryInitError),

    #[error("Cannot get the epoch time, did you forget to initialise the session?")]
    CannotGetEpoch,
}

/// Messages handled by the archive thread
enum SaveMsg {
    Save(PathBuf, Box<dyn Serialize + Send>),
    Stop,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Session {
    /// Start a new session, creating the directory `{sessions_dir}/{exec_name}_{timestamp}`.
    pub fn new(exec_name: &str, sessions_dir: &str) -> Result<Self, SessionError> {
        SESSION_EPOCH
            .try_init_once(Utc::now)
            .map_err(SessionError::CannotInitEpoch)?;

        let timestamp = SESSION_EPOCH
            .get()
            .ok_or(SessionError::CannotGetEpoch)?
            .format(TIMESTAMP_FORMAT);

        let mut path = crate::host::get_sw_root().map_err(|_| SessionError::SwRootNotSet)?;
        path.push(sessions_dir);
        path.push(format!("{}_{}", exec_name, timestamp));

        fs::create_dir_all(&path).map_err(SessionError::CannotCreateDir)?;

        let log_file_path = path.join(format!("{}.log", exec_name));

        // Start the archive thread, keeping a copy of the sender in the static so that data can be
        // saved from anywhere without a reference to the session
        let (tx, rx) = channel();
        SAVE_SENDER.init_once(|| Mutex::new(tx.clone()));

        let session_root = path.clone();
        let save_handle = thread::spawn(move || save_thread(session_root, rx));

        Ok(Session {
            session_root: path,
            log_file_path,
            save_sender: tx,
            save_handle: Some(save_handle),
        })
    }

    /// Exit the session, waiting for the archive thread to write any pending data.
    pub fn exit(mut self) {
        info!("Stopping save thread");

        if self.save_sender.send(SaveMsg::Stop).is_ok() {
            if let Some(handle) = self.save_handle.take() {
                handle.join().ok();
            }
        }

        info!("Save thread exited");
    }

    /// Saves the given data to the given session-relative path in a background thread.
    pub fn save<P: AsRef<Path>, T: Serialize + Send + 'static>(&self, path: P, data: T) {
        if let Err(e) = self
            .save_sender
            .send(SaveMsg::Save(path.as_ref().to_path_buf(), Box::new(data)))
        {
            warn!("Could not send data to be saved to {:?}: {}", path.as_ref(), e)
        }
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the number of seconds elapsed since the start of the session.
///
/// # Panics
/// - If no session has been created yet.
pub fn get_elapsed_seconds() -> f64 {
    time::duration_to_seconds(Utc::now() - *get_epoch()).unwrap_or(std::f64::NAN)
}

/// Return a reference to the session's epoch.
///
/// # Panics
/// - If no session has been created yet.
pub fn get_epoch() -> &'static DateTime<Utc> {
    match SESSION_EPOCH.get() {
        Some(e) => e,
        None => panic!("Cannot get the session epoch!"),
    }
}

/// Save the given data into the session-relative path
pub fn save<P: AsRef<Path>, T: Serialize + Send + 'static>(path: P, data: T) {
    let sender = match SAVE_SENDER.get() {
        Some(s) => s,
        None => {
            warn!("Cannot save data as session is not initialised yet");
            return;
        }
    };

    match sender.lock() {
        Ok(s) => {
            if let Err(e) = s.send(SaveMsg::Save(path.as_ref().to_path_buf(), Box::new(data))) {
                warn!("Couldn't send data to save thread for {:?}: {}", path.as_ref(), e)
            }
        }
        Err(_) => warn!("Couldn't get lock on save sender"),
    }
}

/// Saves the given data to the path, appending a timestamp before the path's extension
pub fn save_with_timestamp<P: AsRef<Path>, T: Serialize + Send + 'static>(path: P, data: T) {
    save(timestamped_path(path.as_ref(), &Utc::now()), data);
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Insert `_{timestamp}` between the file stem and extension of `path`.
fn timestamped_path(path: &Path, time: &DateTime<Utc>) -> PathBuf {
    let mut file_name = path.file_stem().unwrap_or_else(|| OsStr::new("")).to_os_string();
    file_name.push("_");
    file_name.push(time.format(TIMESTAMP_FORMAT).to_string());

    if let Some(ext) = path.extension() {
        file_name.push(".");
        file_name.push(ext);
    }

    path.with_file_name(file_name)
}

fn save_thread(session_root: PathBuf, receiver: Receiver<SaveMsg>) {
    while let Ok(msg) = receiver.recv() {
        let (path, data) = match msg {
            SaveMsg::Save(p, d) => (p, d),
            SaveMsg::Stop => break,
        };

        let full_path = session_root.join(path);

        if let Err(e) = write_json(&full_path, data.as_ref()) {
            warn!("Couldn't save data to {:?}: {}", full_path, e);
        }
    }
}

fn write_json(full_path: &Path, data: &(dyn Serialize + Send)) -> Result<(), String> {
    match full_path.extension().and_then(|s| s.to_str()) {
        Some("json") => (),
        ext => return Err(format!("unrecognised file extension {:?}", ext)),
    }

    if let Some(parent) = full_path.parent() {
        fs::create_dir_all(parent).map_err(|e| e.to_string())?;
    }

    let file = OpenOptions::new()
        .write(true)
        .truncate(true)
        .create(true)
        .open(full_path)
        .map_err(|e| e.to_string())?;

    serde_json::to_writer_pretty(&file, data).map_err(|e| e.to_string())
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamped_path() {
        let time = Utc.ymd(2026, 10, 16).and_hms(9, 30, 5);

        assert_eq!(
            timestamped_path(Path::new("missions/mission.json"), &time),
            PathBuf::from("missions/mission_20261016_093005.json")
        );
        assert_eq!(
            timestamped_path(Path::new("target"), &time),
            PathBuf::from("target_20261016_093005")
        );
    }
}
