//! Field preparation shared by both sync directions.

use std::path::Path;

use certmeta_core::banned::{self, BannedCharacterRegistry};
use certmeta_core::{FieldsFile, UnifiedField};
use tracing::{info, warn};

use crate::api::CaApi;
use crate::error::{SyncError, SyncResult};

use super::settings::SyncSettings;

/// Build the unified field list for a run.
///
/// Manual fields always come from the fields file. Custom fields come either
/// from the fields file or, with `import_all_custom_fields`, from the CA
/// catalogue. Custom field names then go through the banned-character gate;
/// new characters are written to the registry at `registry_path` and the run
/// stops while any of them lacks a replacement. Finally every CLM name is
/// rewritten with the registry's replacements.
pub(crate) async fn prepare_fields<C: CaApi + ?Sized>(
    ca: &C,
    settings: &SyncSettings,
    fields_file: &FieldsFile,
    registry_path: &Path,
) -> SyncResult<Vec<UnifiedField>> {
    let (manual, file_custom) = fields_file
        .clone()
        .into_unified()
        .map_err(|e| SyncError::Config(e.to_string()))?;

    let custom = if settings.import_all_custom_fields {
        let catalogue = ca.list_custom_fields(settings.import_deactivated_fields).await?;
        let imported: Vec<UnifiedField> = catalogue
            .iter()
            .filter(|f| !f.label.trim().is_empty())
            .map(|f| {
                let mut field =
                    UnifiedField::from_ca_catalogue(f.id, f.label.trim(), f.data_type.as_deref(), f.is_required);
                if let Some(description) = f.description.as_deref().filter(|d| !d.trim().is_empty()) {
                    field.description = description.to_string();
                }
                field
            })
            .collect();
        info!(count = imported.len(), "Imported custom fields from the CA catalogue");
        imported
    } else {
        file_custom
    };

    let mut registry = BannedCharacterRegistry::load(registry_path)?;
    let check = banned::check_fields_for_banned_characters(&custom, &mut registry);
    for line in &check.diagnostics {
        warn!("{line}");
    }
    if check.registry_changed {
        registry.save(registry_path)?;
        info!(path = %registry_path.display(), "Banned character registry updated");
    }
    if check.restart_required {
        let characters = registry
            .unconfigured()
            .into_iter()
            .map(|c| format!("'{c}'"))
            .collect();
        return Err(SyncError::BannedCharactersUnresolved { characters });
    }

    let mut fields = manual;
    fields.extend(custom);
    banned::sanitize_dest_names(&mut fields, &registry);
    info!(count = fields.len(), "Prepared unified fields");
    Ok(fields)
}
