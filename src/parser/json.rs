use crate::error::{Result, SchedulerError};
use crate::types::{
    AvailabilityWindow, CourseBinding, EngineConfig, Faculty, Room, ScheduleInput, Section,
    Subject,
};
use std::fs;
use std::path::Path;

/// Load all input catalogues from a directory
pub fn load_input_from_dir(dir: &Path) -> Result<ScheduleInput> {
    let sections = load_sections(&dir.join("sections.json"))?;
    let subjects = load_subjects(&dir.join("subjects.json"))?;
    let faculty = load_faculty(&dir.join("faculty.json"))?;
    let rooms = load_rooms(&dir.join("rooms.json"))?;
    let availability = load_availability(&dir.join("availability.json"))?;
    let bindings = load_bindings(&dir.join("courses.json"))?;
    let config = load_config_or_default(&dir.join("config.toml"));

    Ok(ScheduleInput {
        sections,
        subjects,
        faculty,
        rooms,
        availability,
        bindings,
        config,
    })
}

/// Load sections from JSON file
pub fn load_sections(path: &Path) -> Result<Vec<Section>> {
    load_json_file(path)
}

/// Load subjects from JSON file
pub fn load_subjects(path: &Path) -> Result<Vec<Subject>> {
    load_json_file(path)
}

/// Load faculty from JSON file
pub fn load_faculty(path: &Path) -> Result<Vec<Faculty>> {
    load_json_file(path)
}

/// Load rooms from JSON file
pub fn load_rooms(path: &Path) -> Result<Vec<Room>> {
    load_json_file(path)
}

/// Load availability windows; a missing file means everyone is
/// unrestricted
pub fn load_availability(path: &Path) -> Result<Vec<AvailabilityWindow>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    load_json_file(path)
}

/// Load section-subject-faculty bindings from JSON file
pub fn load_bindings(path: &Path) -> Result<Vec<CourseBinding>> {
    load_json_file(path)
}

/// Load config from TOML file, or use defaults
pub fn load_config_or_default(path: &Path) -> EngineConfig {
    if path.exists() {
        match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).unwrap_or_default(),
            Err(_) => EngineConfig::default(),
        }
    } else {
        EngineConfig::default()
    }
}

/// Generic JSON file loader
fn load_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let path_str = path.display().to_string();
    let content = fs::read_to_string(path).map_err(|e| SchedulerError::FileRead {
        path: path_str.clone(),
        source: e,
    })?;

    serde_json::from_str(&content).map_err(|e| {
        SchedulerError::JsonParse {
            file: path_str,
            message: e.to_string(),
        }
        .into()
    })
}
