//! Save slots on disk, one JSON file per slot.
use std::fs;
use std::io::{self, ErrorKind};
use std::path::PathBuf;

use teenlife_game::GameStorage;

#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Storage under the system temp directory, namespaced per run.
    pub fn in_temp_dir(namespace: &str) -> Self {
        Self::new(std::env::temp_dir().join("teenlife-tester").join(namespace))
    }

    fn slot_path(&self, save_name: &str) -> PathBuf {
        let file: String = save_name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{file}.json"))
    }
}

impl GameStorage for FileStorage {
    type Error = io::Error;

    fn save_game(&self, save_name: &str, blob: &str) -> Result<(), Self::Error> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.slot_path(save_name), blob)
    }

    fn load_game(&self, save_name: &str) -> Result<Option<String>, Self::Error> {
        match fs::read_to_string(self.slot_path(save_name)) {
            Ok(blob) => Ok(Some(blob)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn delete_save(&self, save_name: &str) -> Result<(), Self::Error> {
        match fs::remove_file(self.slot_path(save_name)) {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(err),
            _ => Ok(()),
        }
    }
}
