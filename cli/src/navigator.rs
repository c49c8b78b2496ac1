//! Navigator that remembers the current location between CLI runs.

#[cfg(test)]
#[path = "navigator_test.rs"]
mod tests;

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use storefront::Navigator;

const LOCATION_FILE_NAME: &str = "location";

/// Keeps the location in a one-line text file next to the token file.
#[derive(Debug)]
pub struct FileNavigator {
    path: PathBuf,
    location: Mutex<String>,
}

impl FileNavigator {
    /// Navigator whose state lives beside `token_file`. A missing or empty
    /// file means `/`.
    #[must_use]
    pub fn beside(token_file: &Path) -> Self {
        let path = token_file
            .parent()
            .map_or_else(|| PathBuf::from(LOCATION_FILE_NAME), |dir| dir.join(LOCATION_FILE_NAME));
        let location = std::fs::read_to_string(&path)
            .ok()
            .map(|s| s.trim().to_owned())
            .filter(|s| s.starts_with('/'))
            .unwrap_or_else(|| "/".to_owned());
        Self { path, location: Mutex::new(location) }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, location: &str) -> std::io::Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }
        std::fs::write(&self.path, format!("{location}\n"))
    }
}

impl Navigator for FileNavigator {
    fn current_location(&self) -> String {
        self.location
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn navigate(&self, location: &str) {
        location.clone_into(
            &mut self
                .location
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner),
        );
        if let Err(e) = self.persist(location) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to persist location");
        }
        eprintln!("-> {location}");
    }
}
