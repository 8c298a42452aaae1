//! Board descriptor — dotted-key view over a PlatformIO board manifest.
//!
//! Manifests are nested JSON objects (`{"build": {"mcu": "stm32f103c8t6"}}`);
//! a dotted key such as `build.mcu` walks that nesting.

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Board manifest plus the board id it was loaded under.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardConfig {
    id: String,
    manifest: Value,
}

impl BoardConfig {
    /// Wrap an already-parsed manifest.
    pub fn new(id: impl Into<String>, manifest: Value) -> Self {
        Self {
            id: id.into(),
            manifest,
        }
    }

    /// Load a manifest file. The board id defaults to the file stem
    /// (`boards/portenta_h7_m7.json` → `portenta_h7_m7`).
    ///
    /// # Errors
    ///
    /// `Error::Io` if the file cannot be read, `Error::BoardParse` if it is
    /// not JSON.
    pub fn load(path: &Path, id: Option<&str>) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let manifest = serde_json::from_str(&text).map_err(|source| Error::BoardParse {
            path: path.to_path_buf(),
            source,
        })?;
        let id = match id {
            Some(id) => id.to_string(),
            None => path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string(),
        };
        tracing::debug!(board = %id, path = %path.display(), "loaded board manifest");
        Ok(Self { id, manifest })
    }

    /// Board id (`$BOARD`).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Look up a dotted key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        key.split('.')
            .try_fold(&self.manifest, |node, part| node.as_object()?.get(part))
    }

    /// `true` when the key is present, whatever its value.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// String value of a key. Numbers and booleans are rendered as text so
    /// that `build.f_cpu: 64000000` and `"64000000L"` both read back.
    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// String value, or `default` when absent.
    pub fn get_str_or(&self, key: &str, default: &str) -> String {
        self.get_str(key).unwrap_or_else(|| default.to_string())
    }

    /// String value that the builder cannot proceed without.
    ///
    /// # Errors
    ///
    /// `Error::MissingBoardKey` when the key is absent.
    pub fn require_str(&self, key: &str) -> Result<String> {
        self.get_str(key)
            .ok_or_else(|| Error::MissingBoardKey(key.to_string()))
    }

    /// Unsigned integer value; numeric strings are accepted too.
    pub fn get_u64(&self, key: &str) -> Option<u64> {
        match self.get(key)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Set a dotted key, creating intermediate objects as needed.
    pub fn update(&mut self, key: &str, value: impl Into<Value>) {
        let (parents, leaf) = match key.rsplit_once('.') {
            Some((parents, leaf)) => (Some(parents), leaf),
            None => (None, key),
        };
        let mut node = &mut self.manifest;
        for part in parents.into_iter().flat_map(|p| p.split('.')) {
            if !node.is_object() {
                *node = Value::Object(Map::new());
            }
            node = match node {
                Value::Object(map) => map
                    .entry(part.to_string())
                    .or_insert_with(|| Value::Object(Map::new())),
                _ => return,
            };
        }
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        if let Value::Object(map) = node {
            map.insert(leaf.to_string(), value.into());
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn board() -> BoardConfig {
        BoardConfig::new(
            "bluepill_f103c8",
            json!({
                "build": {
                    "mcu": "stm32f103c8t6",
                    "cpu": "cortex-m3",
                    "f_cpu": "72000000L",
                    "libopencm3": { "ld_device": "stm32f103x8" }
                },
                "upload": { "maximum_size": 65536, "maximum_ram_size": "20480" }
            }),
        )
    }

    #[test]
    fn dotted_lookup_walks_nested_objects() {
        let b = board();
        assert_eq!(b.get_str("build.mcu").as_deref(), Some("stm32f103c8t6"));
        assert_eq!(
            b.get_str("build.libopencm3.ld_device").as_deref(),
            Some("stm32f103x8")
        );
        assert!(b.get("build.nope").is_none());
        assert!(b.get("build.mcu.deeper").is_none());
    }

    #[test]
    fn numbers_read_as_text_and_integers() {
        let b = board();
        assert_eq!(b.get_str("upload.maximum_size").as_deref(), Some("65536"));
        assert_eq!(b.get_u64("upload.maximum_size"), Some(65536));
        assert_eq!(b.get_u64("upload.maximum_ram_size"), Some(20480));
    }

    #[test]
    fn require_str_reports_key() {
        let err = board().require_str("build.variant").unwrap_err();
        assert!(matches!(err, Error::MissingBoardKey(k) if k == "build.variant"));
    }

    #[test]
    fn update_creates_intermediate_objects() {
        let mut b = board();
        b.update("upload.offset_address", "0x08180000");
        b.update("build.arduino.flash_layout", "75_25");
        assert_eq!(
            b.get_str("upload.offset_address").as_deref(),
            Some("0x08180000")
        );
        assert_eq!(
            b.get_str("build.arduino.flash_layout").as_deref(),
            Some("75_25")
        );
        assert_eq!(b.get_u64("upload.maximum_size"), Some(65536));
    }

    #[test]
    fn load_uses_file_stem_as_id() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("nano33ble.json");
        std::fs::write(&path, r#"{"build": {"variant": "ARDUINO_NANO33BLE"}}"#).unwrap();
        let b = BoardConfig::load(&path, None).unwrap();
        assert_eq!(b.id(), "nano33ble");
        let b = BoardConfig::load(&path, Some("custom")).unwrap();
        assert_eq!(b.id(), "custom");
    }

    #[test]
    fn load_rejects_invalid_json() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("broken.json");
        std::fs::write(&path, "{ build: ").unwrap();
        assert!(matches!(
            BoardConfig::load(&path, None),
            Err(Error::BoardParse { .. })
        ));
    }
}
