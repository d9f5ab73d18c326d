//! Banned-character registry for CLM field names.
//!
//! CLM metadata field names only accept `[A-Za-z0-9_-]`. Every other
//! character seen in a CA field label is recorded in a persistent registry
//! together with the replacement an operator has chosen for it. A new
//! character starts out with the replacement `"null"`, which means "not yet
//! configured" and blocks the run until someone edits the registry file.

use crate::error::{CoreError, CoreResult};
use crate::field::UnifiedField;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

/// Replacement value that marks a registry entry as unconfigured.
pub const UNCONFIGURED: &str = "null";

/// One banned character and its configured replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BannedCharacter {
    pub character: String,
    pub replacement: String,
}

impl BannedCharacter {
    fn unconfigured(c: char) -> Self {
        Self {
            character: c.to_string(),
            replacement: UNCONFIGURED.to_string(),
        }
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.replacement != UNCONFIGURED
    }
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Return one unconfigured entry per distinct disallowed character, in the
/// order the characters first appear.
#[must_use]
pub fn scan(name: &str) -> Vec<BannedCharacter> {
    let mut found: Vec<BannedCharacter> = Vec::new();
    for c in name.chars().filter(|c| !is_allowed(*c)) {
        let s = c.to_string();
        if !found.iter().any(|b| b.character == s) {
            found.push(BannedCharacter::unconfigured(c));
        }
    }
    found
}

/// Persistent, ordered list of banned characters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BannedCharacterRegistry {
    entries: Vec<BannedCharacter>,
}

impl BannedCharacterRegistry {
    #[must_use]
    pub fn new(entries: Vec<BannedCharacter>) -> Self {
        Self { entries }
    }

    /// Load the registry; a missing file is an empty registry.
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No banned character registry yet, starting empty");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|source| CoreError::RegistryIo {
            path: path.to_path_buf(),
            source,
        })?;
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(&raw).map_err(|source| CoreError::RegistryParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Rewrite the whole registry file as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> CoreResult<()> {
        let io_err = |source| CoreError::RegistryIo {
            path: path.to_path_buf(),
            source,
        };
        let json = serde_json::to_string_pretty(self).map_err(|source| CoreError::RegistryParse {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(path, json).map_err(io_err)
    }

    #[must_use]
    pub fn entries(&self) -> &[BannedCharacter] {
        &self.entries
    }

    #[must_use]
    pub fn contains(&self, character: &str) -> bool {
        self.entries.iter().any(|e| e.character == character)
    }

    /// Append every character not already present. Returns whether anything
    /// was added.
    pub fn merge(&mut self, new: Vec<BannedCharacter>) -> bool {
        let mut changed = false;
        for entry in new {
            if !self.contains(&entry.character) {
                info!(character = %entry.character, "New banned character recorded");
                self.entries.push(entry);
                changed = true;
            }
        }
        changed
    }

    /// Characters that still carry the unconfigured replacement.
    #[must_use]
    pub fn unconfigured(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| !e.is_configured())
            .map(|e| e.character.as_str())
            .collect()
    }

    /// Apply every configured replacement, in registry order.
    #[must_use]
    pub fn replace_all(&self, input: &str) -> String {
        self.entries
            .iter()
            .filter(|e| e.is_configured())
            .fold(input.to_string(), |acc, e| acc.replace(&e.character, &e.replacement))
    }
}

/// Free-function form of [`BannedCharacterRegistry::merge`].
pub fn merge_into_registry(new: Vec<BannedCharacter>, registry: &mut BannedCharacterRegistry) -> bool {
    registry.merge(new)
}

/// Free-function form of [`BannedCharacterRegistry::replace_all`].
#[must_use]
pub fn replace_all(input: &str, registry: &BannedCharacterRegistry) -> String {
    registry.replace_all(input)
}

/// Outcome of scanning a field list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BannedCharacterCheck {
    /// New characters were added to the registry.
    pub registry_changed: bool,
    /// At least one registry entry is unconfigured.
    pub restart_required: bool,
    /// One line per field name that contained banned characters.
    pub diagnostics: Vec<String>,
}

/// Scan every field's source name, merge new characters into the registry and
/// report whether the run can continue.
pub fn check_fields_for_banned_characters(
    fields: &[UnifiedField],
    registry: &mut BannedCharacterRegistry,
) -> BannedCharacterCheck {
    let mut check = BannedCharacterCheck::default();
    for field in fields {
        let found = scan(&field.source_field_name);
        if found.is_empty() {
            continue;
        }
        let chars: Vec<String> = found.iter().map(|b| format!("'{}'", b.character)).collect();
        check.diagnostics.push(format!(
            "field name '{}' contains invalid characters: {}",
            field.source_field_name,
            chars.join(", ")
        ));
        check.registry_changed |= registry.merge(found);
    }
    check.restart_required = !registry.unconfigured().is_empty();
    if check.restart_required {
        warn!(
            unconfigured = ?registry.unconfigured(),
            "Banned characters need a replacement before fields can be synced"
        );
    }
    check
}

/// Rewrite every field's CLM name with the registry's replacements.
///
/// Each field only touches its own name, so the work is spread across the
/// rayon pool.
pub fn sanitize_dest_names(fields: &mut [UnifiedField], registry: &BannedCharacterRegistry) {
    fields.par_iter_mut().for_each(|field| {
        field.dest_field_name = registry.replace_all(&field.dest_field_name);
    });
}
