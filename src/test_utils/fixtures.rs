//! Naming configurations shared by unit and integration tests.

use serde_json::{Value, json};
use std::path::{Path, PathBuf};

/// A small but complete configuration.
///
/// Every template inherits from a complete `default` (lower case, `env` = `dev`).
/// - `env`, `region`: dictionaries (`region` values are objects with `value`)
/// - `app`: lowercase free text
/// - `instance`: 1..=999 padded to three digits
/// - `unique`: 6 character hash seeded from the other placeholders
/// - templates `rg`, `st` (storage account, 3..=24 lowercase alphanumerics),
///   `vm` (optional instance group, upper case) and `kv` (key vault)
pub fn sample_config() -> Value {
    json!({
        "$id": "sample",
        "aliases": {
            "components": {"environment": "env", "location": "region"},
            "templates": {"resourceGroup": "rg", "storage": "st"}
        },
        "components": {
            "env": {"type": "dictionary", "source": {"dev": "d", "test": "t", "prod": "p"}},
            "region": {
                "type": "dictionary",
                "source": {"east us": {"value": "eus"}, "west europe": {"value": "weu"}}
            },
            "app": {"type": "freeText", "casing": "lower"},
            "instance": {"type": "instance", "minValue": 1, "maxValue": 999, "padding": {"totalLength": 3}},
            "unique": {"type": "unique", "length": 6, "seed": "true"}
        },
        "templates": {
            "default": {
                "casing": "lower",
                "template": "{app}",
                "lengthMin": 1,
                "lengthMax": 80,
                "invalidCharacters": "",
                "invalidCharactersStart": "",
                "invalidCharactersEnd": "-",
                "invalidCharactersConsecutive": "",
                "invalidText": "",
                "validText": "",
                "regex": "",
                "staticValue": "",
                "values": {"env": "dev"}
            },
            "rg": {"template": "rg-{app}-{env}-{region}", "lengthMax": 40},
            "st": {
                "name": "Storage/storageAccounts",
                "template": "st{app}{env}{unique}",
                "lengthMin": 3,
                "lengthMax": 24,
                "regex": "^[a-z0-9]{3,24}$"
            },
            "vm": {"template": "vm-{app}[-{instance}]", "casing": "upper"},
            "kv": {"name": "KeyVault/vaults", "template": "kv-{app}-{env}", "lengthMax": 24}
        }
    })
}

/// Write `config` to `name` under `dir` and return the path.
pub fn write_config(dir: &Path, name: &str, config: &Value) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let _ = std::fs::write(&path, config.to_string());
    path
}
