// batchpix/src/config.rs
use crate::core::{AnchorPosition, OutputFormat, ProcessParams};
use serde_json::{json, Map, Value};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// JSON configuration store: built-in defaults, deep merge of the user
/// file, dotted-path access. The core consumes only the
/// `image_processing.*` subtree; `ui.*` belongs to the front-end.
pub struct ConfigStore {
    values: Value,
    path: PathBuf,
}

pub fn default_config() -> Value {
    json!({
        "image_processing": {
            "default_format": "JPEG",
            "default_quality": 85,
            "resize_options": {
                "default_width": 800,
                "default_height": 600,
                "default_scale": 1.0
            },
            "watermark": {
                "text": "My Watermark",
                "font_size": 20,
                "opacity": 0.5,
                "position": "bottom-right"
            },
            "rotation": {
                "default_degrees": 0
            }
        },
        "ui": {
            "theme": "light",
            "recent_folders": [],
            "window_size": [800, 600]
        }
    })
}

pub fn default_config_path() -> PathBuf {
    if cfg!(windows) {
        let base = env::var_os("APPDATA")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("batchpix").join("config.json")
    } else {
        let home = env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        home.join(".config").join("batchpix").join("config.json")
    }
}

impl ConfigStore {
    /// A missing file is normal; a malformed one is logged and ignored.
    /// Configuration problems never fail a batch.
    pub fn load(path: &Path) -> Self {
        let mut values = default_config();
        match fs::read_to_string(path) {
            Ok(text) => match serde_json::from_str::<Value>(&text) {
                Ok(user) => deep_merge(&mut values, user),
                Err(err) => log::warn!(
                    "malformed config {}: {err}; using defaults",
                    path.display()
                ),
            },
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                log::debug!("no config file at {}", path.display());
            }
            Err(err) => log::warn!(
                "cannot read config {}: {err}; using defaults",
                path.display()
            ),
        }
        Self {
            values,
            path: path.to_path_buf(),
        }
    }

    pub fn load_default() -> Self {
        Self::load(&default_config_path())
    }

    pub fn save(&self) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(&self.values)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(&self.path, text)
    }

    /// Dotted-path lookup, e.g. `image_processing.default_format`.
    pub fn get(&self, key_path: &str) -> Option<&Value> {
        key_path
            .split('.')
            .try_fold(&self.values, |node, key| node.get(key))
    }

    /// Dotted-path assignment, creating intermediate objects as needed.
    pub fn set(&mut self, key_path: &str, value: Value) {
        let mut keys: Vec<&str> = key_path.split('.').collect();
        let last = match keys.pop() {
            Some(k) => k,
            None => return,
        };

        let mut node = &mut self.values;
        for key in keys {
            if !matches!(node, Value::Object(_)) {
                *node = Value::Object(Map::new());
            }
            let Value::Object(map) = node else { return };
            node = map
                .entry(key.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
        }
        if !matches!(node, Value::Object(_)) {
            *node = Value::Object(Map::new());
        }
        let Value::Object(map) = node else { return };
        map.insert(last.to_string(), value);
    }

    /// Track a folder under `ui.recent_folders`, most recent first,
    /// deduplicated and capped.
    pub fn add_recent_folder(&mut self, folder: &Path, max_recent: usize) {
        let entry = folder.display().to_string();
        let mut recent: Vec<String> = self
            .get("ui.recent_folders")
            .and_then(Value::as_array)
            .map(|a| {
                a.iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default();

        recent.retain(|f| f != &entry);
        recent.insert(0, entry);
        recent.truncate(max_recent);
        self.set("ui.recent_folders", json!(recent));
    }

    /// Initial parameter bag projected from `image_processing.*`.
    pub fn default_params(&self) -> ProcessParams {
        let mut params = ProcessParams::default();

        if let Some(format) = self.get_str("image_processing.default_format") {
            match format.parse::<OutputFormat>() {
                Ok(f) => params.format = Some(f),
                Err(err) => log::warn!("config default_format ignored: {err}"),
            }
        }
        if let Some(quality) = self.get_u64("image_processing.default_quality") {
            params.quality = Some(quality.clamp(1, 100) as u8);
        }
        if let Some(width) = self.get_u64("image_processing.resize_options.default_width") {
            params.width = Some(width as u32);
        }
        if let Some(height) = self.get_u64("image_processing.resize_options.default_height") {
            params.height = Some(height as u32);
        }
        // an identity scale would shadow the width/height defaults
        if let Some(scale) = self.get_f64("image_processing.resize_options.default_scale") {
            if (scale - 1.0).abs() > f64::EPSILON {
                params.scale = Some(scale as f32);
            }
        }
        if let Some(text) = self.get_str("image_processing.watermark.text") {
            params.watermark.text = Some(text.to_string());
        }
        if let Some(size) = self.get_u64("image_processing.watermark.font_size") {
            params.watermark.font_size = size as u32;
        }
        if let Some(opacity) = self.get_f64("image_processing.watermark.opacity") {
            params.watermark.opacity = opacity as f32;
        }
        if let Some(position) = self.get_str("image_processing.watermark.position") {
            if let Ok(p) = position.parse::<AnchorPosition>() {
                params.watermark.position = p;
            }
        }
        if let Some(degrees) = self.get_f64("image_processing.rotation.default_degrees") {
            params.rotate.degrees = degrees as f32;
        }

        params
    }

    fn get_str(&self, key_path: &str) -> Option<&str> {
        self.get(key_path).and_then(Value::as_str)
    }

    fn get_u64(&self, key_path: &str) -> Option<u64> {
        self.get(key_path).and_then(Value::as_u64)
    }

    fn get_f64(&self, key_path: &str) -> Option<f64> {
        self.get(key_path).and_then(Value::as_f64)
    }
}

fn deep_merge(base: &mut Value, update: Value) {
    match (base, update) {
        (Value::Object(base_map), Value::Object(update_map)) => {
            for (key, value) in update_map {
                match base_map.get_mut(&key) {
                    Some(existing) if existing.is_object() && value.is_object() => {
                        deep_merge(existing, value)
                    }
                    _ => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, update) => *slot = update,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_the_builtin_table() {
        let store = ConfigStore::load(Path::new("/nonexistent/config.json"));
        assert_eq!(
            store.get("image_processing.default_format").unwrap(),
            "JPEG"
        );
        assert_eq!(
            store
                .get("image_processing.default_quality")
                .and_then(Value::as_u64),
            Some(85)
        );
        assert_eq!(store.get("ui.theme").unwrap(), "light");
    }

    #[test]
    fn user_file_deep_merges_over_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(
            &path,
            r#"{"image_processing": {"default_quality": 60}, "ui": {"theme": "dark"}}"#,
        )
        .unwrap();

        let store = ConfigStore::load(&path);
        // overridden leaves
        assert_eq!(
            store
                .get("image_processing.default_quality")
                .and_then(Value::as_u64),
            Some(60)
        );
        assert_eq!(store.get("ui.theme").unwrap(), "dark");
        // untouched siblings survive
        assert_eq!(
            store.get("image_processing.default_format").unwrap(),
            "JPEG"
        );
        assert!(store.get("ui.recent_folders").is_some());
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, "{not valid json").unwrap();

        let store = ConfigStore::load(&path);
        assert_eq!(
            store.get("image_processing.default_format").unwrap(),
            "JPEG"
        );
    }

    #[test]
    fn dotted_get_returns_none_for_missing_keys() {
        let store = ConfigStore::load(Path::new("/nonexistent/config.json"));
        assert!(store.get("image_processing.missing.key").is_none());
        assert!(store.get("nope").is_none());
    }

    #[test]
    fn dotted_set_creates_intermediate_objects() {
        let mut store = ConfigStore::load(Path::new("/nonexistent/config.json"));
        store.set("custom.nested.value", json!(42));
        assert_eq!(
            store.get("custom.nested.value").and_then(Value::as_u64),
            Some(42)
        );
    }

    #[test]
    fn recent_folders_dedupe_and_cap() {
        let mut store = ConfigStore::load(Path::new("/nonexistent/config.json"));
        for name in ["a", "b", "c", "d", "e", "f"] {
            store.add_recent_folder(Path::new(name), 5);
        }
        store.add_recent_folder(Path::new("c"), 5);

        let recent: Vec<&str> = store
            .get("ui.recent_folders")
            .and_then(Value::as_array)
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert_eq!(recent, vec!["c", "f", "e", "d", "b"]);
    }

    #[test]
    fn save_round_trips_through_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("config.json");

        let mut store = ConfigStore::load(&path);
        store.set("image_processing.default_quality", json!(42));
        store.save().unwrap();

        let reloaded = ConfigStore::load(&path);
        assert_eq!(
            reloaded
                .get("image_processing.default_quality")
                .and_then(Value::as_u64),
            Some(42)
        );
    }

    #[test]
    fn default_params_projects_the_image_processing_subtree() {
        let store = ConfigStore::load(Path::new("/nonexistent/config.json"));
        let params = store.default_params();

        assert_eq!(params.format, Some(crate::core::OutputFormat::Jpeg));
        assert_eq!(params.quality, Some(85));
        assert_eq!(params.width, Some(800));
        assert_eq!(params.height, Some(600));
        // the builtin identity scale must not shadow width/height
        assert_eq!(params.scale, None);
        assert_eq!(params.watermark.text.as_deref(), Some("My Watermark"));
        assert_eq!(params.watermark.font_size, 20);
        assert_eq!(params.rotate.degrees, 0.0);
    }
}
