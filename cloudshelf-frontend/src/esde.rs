use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use cloudshelf_core::layout::GAMELIST_FILENAME;
use cloudshelf_core::{ArtifactKey, ArtifactKind, CatalogRecord};

use crate::{Frontend, FrontendError, GameListEntry};

/// ES-DE (EmulationStation Desktop Edition) frontend.
pub struct EsDeFrontend;

impl EsDeFrontend {
    pub fn new() -> Self {
        Self
    }

    /// Build the listing from the launch scripts present in `script_dir`,
    /// joined against catalog metadata by key.
    ///
    /// Scripts are listed in lexical filename order. A script with no
    /// matching record is still listed, named after its key.
    pub fn generate(
        &self,
        script_dir: &Path,
        catalog_by_key: &HashMap<ArtifactKey, CatalogRecord>,
    ) -> Result<Vec<GameListEntry>, FrontendError> {
        let mut file_names = script_file_names(script_dir)?;
        file_names.sort();

        Ok(file_names
            .into_iter()
            .map(|file_name| {
                let key = file_name
                    .strip_suffix(&format!(".{}", ArtifactKind::Script.extension()))
                    .unwrap_or(&file_name);
                match catalog_by_key.get(key) {
                    Some(record) => entry_from_record(&file_name, record),
                    None => GameListEntry {
                        path: format!("./{file_name}"),
                        name: key.to_string(),
                        ..Default::default()
                    },
                }
            })
            .collect())
    }
}

impl Default for EsDeFrontend {
    fn default() -> Self {
        Self::new()
    }
}

impl Frontend for EsDeFrontend {
    fn name(&self) -> &'static str {
        "ES-DE"
    }

    fn write_metadata(
        &self,
        games: &[GameListEntry],
        metadata_dir: &Path,
    ) -> Result<PathBuf, FrontendError> {
        fs::create_dir_all(metadata_dir).map_err(|e| FrontendError::io(metadata_dir, e))?;

        let xml = render_gamelist(games);
        let gamelist_path = metadata_dir.join(GAMELIST_FILENAME);
        let tmp = metadata_dir.join(format!(".{GAMELIST_FILENAME}.tmp"));
        fs::write(&tmp, xml.as_bytes()).map_err(|e| FrontendError::io(&tmp, e))?;
        fs::rename(&tmp, &gamelist_path).map_err(|e| FrontendError::io(&gamelist_path, e))?;

        log::debug!(
            "Wrote {} games to {}",
            games.len(),
            gamelist_path.display()
        );
        Ok(gamelist_path)
    }
}

/// Names of the `*.sh` files directly inside `dir`.
fn script_file_names(dir: &Path) -> Result<Vec<String>, FrontendError> {
    let entries = fs::read_dir(dir).map_err(|e| FrontendError::io(dir, e))?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| FrontendError::io(dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let is_script = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e == ArtifactKind::Script.extension())
            .unwrap_or(false);
        if !is_script {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            names.push(name.to_string());
        }
    }
    Ok(names)
}

fn entry_from_record(file_name: &str, record: &CatalogRecord) -> GameListEntry {
    GameListEntry {
        path: format!("./{file_name}"),
        name: record.title().to_string(),
        description: record.short_description.clone().unwrap_or_default(),
        rating: record.rating,
        release_date: record
            .original_release_date
            .as_deref()
            .and_then(format_esde_date),
        developer: non_empty(&record.developer_name),
        publisher: non_empty(&record.publisher_name),
        genre: non_empty(&record.category),
        players: non_empty(&record.players),
        play_count: record.play_count.filter(|n| *n > 0),
        last_played: non_empty(&record.last_played),
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.trim().is_empty()).cloned()
}

/// Render the full `gamelist.xml` document.
pub fn render_gamelist(games: &[GameListEntry]) -> String {
    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\"?>\n");
    xml.push_str("<gameList>\n");

    for game in games {
        xml.push_str("  <game>\n");
        write_tag(&mut xml, "path", &game.path);
        write_tag(&mut xml, "name", &game.name);
        write_tag(&mut xml, "desc", &game.description);

        if let Some(rating) = game.rating {
            write_tag(&mut xml, "rating", &format!("{:.1}", rating));
        }
        if let Some(ref date) = game.release_date {
            write_tag(&mut xml, "releasedate", date);
        }
        if let Some(ref dev) = game.developer {
            write_tag(&mut xml, "developer", dev);
        }
        if let Some(ref pub_) = game.publisher {
            write_tag(&mut xml, "publisher", pub_);
        }
        if let Some(ref genre) = game.genre {
            write_tag(&mut xml, "genre", genre);
        }
        if let Some(ref players) = game.players {
            write_tag(&mut xml, "players", players);
        }
        if let Some(count) = game.play_count {
            write_tag(&mut xml, "playcount", &count.to_string());
        }
        if let Some(ref last) = game.last_played {
            write_tag(&mut xml, "lastplayed", last);
        }

        xml.push_str("  </game>\n");
    }

    xml.push_str("</gameList>\n");
    xml
}

fn write_tag(xml: &mut String, tag: &str, value: &str) {
    xml.push_str("    <");
    xml.push_str(tag);
    xml.push('>');
    xml.push_str(&quick_xml::escape::escape(value));
    xml.push_str("</");
    xml.push_str(tag);
    xml.push_str(">\n");
}

/// Convert the catalog's partial ISO timestamp to ES-DE's `YYYYMMDDT000000`.
///
/// Only the date portion is used. Returns `None` if it does not parse.
fn format_esde_date(date: &str) -> Option<String> {
    let day = date.split('T').next().unwrap_or(date).trim();
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .ok()
        .map(|d| format!("{}T000000", d.format("%Y%m%d")))
}

#[cfg(test)]
#[path = "tests/esde_tests.rs"]
mod tests;
