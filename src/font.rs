//! Font lookup for the raster surface.

use std::collections::HashMap;
use std::sync::Mutex;

use ab_glyph::{FontArc, FontVec};
use fontdb::{Database, Family, ID, Query, Weight};
use log::{debug, info, warn};

use crate::config::FontSettings;
use crate::surface::FontDescriptor;

/// Generic families tried, in order, when a requested family is unavailable.
const FALLBACK_FAMILIES: [Family<'static>; 2] = [Family::SansSerif, Family::Serif];

/// Resolves font descriptors to loaded faces, caching each resolution.
pub struct FontBook {
    db: Database,
    cache: Mutex<HashMap<(String, bool), Option<FontArc>>>,
}

impl FontBook {
    /// A book with no faces; every lookup misses.
    pub fn empty() -> Self {
        Self::from_database(Database::new())
    }

    /// Build a book from the configured sources.
    pub fn load(settings: &FontSettings) -> Self {
        let mut db = Database::new();
        if settings.load_system_fonts {
            db.load_system_fonts();
        }
        for dir in &settings.font_dirs {
            db.load_fonts_dir(dir);
        }
        for file in &settings.font_files {
            if let Err(err) = db.load_font_file(file) {
                warn!(path:? = file, error:% = err; "Failed to load font file");
            }
        }
        info!(faces = db.len(); "Font book loaded");
        Self::from_database(db)
    }

    /// Add a face from raw font bytes (TTF/OTF).
    pub fn add_font_data(&mut self, data: Vec<u8>) {
        self.db.load_font_data(data);
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }

    fn from_database(db: Database) -> Self {
        Self {
            db,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn face_count(&self) -> usize {
        self.db.len()
    }

    /// Sorted, de-duplicated family names of every loaded face.
    pub fn families(&self) -> Vec<String> {
        let mut families: Vec<String> = self
            .db
            .faces()
            .flat_map(|face| face.families.iter().map(|(name, _)| name.clone()))
            .collect();
        families.sort();
        families.dedup();
        families
    }

    /// Whether `family` names a loaded face (case-insensitive).
    pub fn has_family(&self, family: &str) -> bool {
        self.db.faces().any(|face| {
            face.families
                .iter()
                .any(|(name, _)| name.eq_ignore_ascii_case(family))
        })
    }

    /// Face for `font`, falling back to generic families and then to any face.
    ///
    /// Returns `None` only when the book is empty or no face parses.
    pub fn resolve(&self, font: &FontDescriptor) -> Option<FontArc> {
        let key = (font.family.to_ascii_lowercase(), font.bold);
        if let Ok(cache) = self.cache.lock()
            && let Some(hit) = cache.get(&key)
        {
            return hit.clone();
        }

        let resolved = self.lookup(font);
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(key, resolved.clone());
        }
        resolved
    }

    fn lookup(&self, font: &FontDescriptor) -> Option<FontArc> {
        let weight = if font.bold { Weight::BOLD } else { Weight::NORMAL };
        let requested = [Family::Name(font.family.as_str())];
        if let Some(face) = self.query(&requested, weight).and_then(|id| self.load_face(id)) {
            return Some(face);
        }

        warn!(family = font.family.as_str(); "Font family not found, using fallback");
        for family in FALLBACK_FAMILIES {
            if let Some(face) = self.query(&[family], weight).and_then(|id| self.load_face(id)) {
                return Some(face);
            }
        }

        let any = self.db.faces().find_map(|face| self.load_face(face.id));
        if any.is_none() {
            warn!("No usable font faces; text will not be drawn");
        }
        any
    }

    fn query(&self, families: &[Family<'_>], weight: Weight) -> Option<ID> {
        self.db.query(&Query {
            families,
            weight,
            ..Query::default()
        })
    }

    fn load_face(&self, id: ID) -> Option<FontArc> {
        let face = self.db.with_face_data(id, |data, index| {
            FontVec::try_from_vec_and_index(data.to_vec(), index)
        })?;
        match face {
            Ok(face) => {
                debug!(id:? = id; "Loaded font face");
                Some(FontArc::new(face))
            }
            Err(err) => {
                warn!(id:? = id, error:% = err; "Failed to parse font face");
                None
            }
        }
    }
}

impl Default for FontBook {
    fn default() -> Self {
        Self::load(&FontSettings::default())
    }
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook")
            .field("faces", &self.db.len())
            .finish_non_exhaustive()
    }
}
