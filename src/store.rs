//! Seams to the systems around the engine: the page store and the redirect
//! map source. Performance measurement lives in [`crate::performance`].

use crate::error::Result;
use crate::page::Page;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Loads the corpus and persists mutated pages
pub trait PageStore {
    fn load_pages(&self) -> Result<Vec<Page>>;

    fn save_pages(&self, pages: &[Page]) -> Result<()>;
}

/// Supplies the old URL -> new URL redirect map
pub trait RedirectSource {
    fn load_redirects(&self) -> Result<HashMap<String, String>>;
}

impl RedirectSource for HashMap<String, String> {
    fn load_redirects(&self) -> Result<HashMap<String, String>> {
        Ok(self.clone())
    }
}

/// Corpus stored as a JSON array of pages
#[derive(Debug, Clone)]
pub struct JsonPageStore {
    path: PathBuf,
}

impl JsonPageStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl PageStore for JsonPageStore {
    fn load_pages(&self) -> Result<Vec<Page>> {
        let contents = fs::read_to_string(&self.path)?;
        let pages: Vec<Page> = serde_json::from_str(&contents)?;
        ::log::info!("Loaded {} pages from {}", pages.len(), self.path.display());
        Ok(pages)
    }

    fn save_pages(&self, pages: &[Page]) -> Result<()> {
        let json = serde_json::to_string_pretty(pages)?;
        fs::write(&self.path, json)?;
        ::log::info!("Saved {} pages to {}", pages.len(), self.path.display());
        Ok(())
    }
}

/// Redirect map stored as a JSON object of old URL -> new URL
#[derive(Debug, Clone)]
pub struct JsonRedirects {
    path: PathBuf,
}

impl JsonRedirects {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl RedirectSource for JsonRedirects {
    fn load_redirects(&self) -> Result<HashMap<String, String>> {
        let contents = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

/// In-memory page store
#[derive(Debug, Default)]
pub struct MemoryStore {
    pages: Mutex<Vec<Page>>,
}

impl MemoryStore {
    pub fn new(pages: Vec<Page>) -> Self {
        Self {
            pages: Mutex::new(pages),
        }
    }

    /// Copy of the stored pages
    pub fn pages(&self) -> Vec<Page> {
        self.pages
            .lock()
            .map(|pages| pages.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl PageStore for MemoryStore {
    fn load_pages(&self) -> Result<Vec<Page>> {
        Ok(self.pages())
    }

    fn save_pages(&self, pages: &[Page]) -> Result<()> {
        let mut stored = self
            .pages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *stored = pages.to_vec();
        Ok(())
    }
}
