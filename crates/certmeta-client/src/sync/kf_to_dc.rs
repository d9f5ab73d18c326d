//! CLM to CA: copy certificate metadata into CA order custom fields.

use std::collections::HashMap;

use certmeta_core::reconcile::{apply_source_ids, plan_source_creation};
use certmeta_core::{coerce_for_source, mapper, DestDataType, FieldKind, SourceDataType, UnifiedField};
use tracing::{debug, info, trace, warn};

use crate::api::{CaApi, ClmApi};
use crate::ca_models::{CaCustomField, CaCustomFieldCreate};
use crate::clm_models::{ClmCertificate, ClmMetadataField};
use crate::error::SyncResult;

use super::settings::SyncSettings;
use super::summary::Accounting;

pub(crate) async fn run<C, K>(
    ca: &C,
    clm: &K,
    settings: &SyncSettings,
    mut fields: Vec<UnifiedField>,
    acc: &mut Accounting,
) -> SyncResult<()>
where
    C: CaApi + ?Sized,
    K: ClmApi + ?Sized,
{
    fields.retain(|f| f.field_kind == FieldKind::Custom);
    resolve_ca_fields(ca, settings, &mut fields, acc).await?;
    fill_choice_options(clm, &mut fields).await?;

    // CLM metadata keys are CLM field names.
    let by_dest_name: HashMap<String, &UnifiedField> = fields
        .iter()
        .rev()
        .map(|f| (f.dest_field_name.trim().to_lowercase(), f))
        .collect();
    info!(
        fields = fields.len(),
        resolved = fields.iter().filter(|f| f.has_source_id()).count(),
        "Starting CLM to CA metadata sync"
    );

    let mut page = 1;
    loop {
        let certificates = clm
            .list_certificates_by_issuer(
                &settings.issuer_query_term,
                settings.include_revoked_and_expired,
                page,
                settings.page_size,
            )
            .await?;
        if certificates.is_empty() {
            break;
        }
        acc.page(certificates.len());
        for certificate in &certificates {
            sync_certificate(ca, &by_dest_name, certificate, acc).await;
        }
        debug!(page, count = certificates.len(), "Processed certificate page");
        page += 1;
    }
    Ok(())
}

/// Optionally create missing CA fields, then resolve CA ids and types.
async fn resolve_ca_fields<C: CaApi + ?Sized>(
    ca: &C,
    settings: &SyncSettings,
    fields: &mut [UnifiedField],
    acc: &mut Accounting,
) -> SyncResult<()> {
    // Inactive fields are part of the catalogue for creation planning so a
    // deactivated label is never created twice.
    let mut catalogue = ca.list_custom_fields(true).await?;

    if settings.create_missing_fields_in_ca {
        let plan = plan_source_creation(&catalogue, fields);
        let mut created = 0;
        for field in &plan.to_create {
            match ca.create_custom_field(&CaCustomFieldCreate::from_unified(field)).await {
                Ok(()) => {
                    created += 1;
                    acc.field_created();
                }
                Err(e) => warn!(
                    field = %field.source_field_name,
                    error = %e,
                    "Failed to create CA custom field, its values will be skipped"
                ),
            }
        }
        if created > 0 {
            catalogue = ca.list_custom_fields(true).await?;
        }
    }

    let usable: Vec<CaCustomField> = catalogue
        .into_iter()
        .filter(|f| settings.import_deactivated_fields || f.is_active)
        .collect();
    apply_source_ids(&usable, fields);

    for field in fields.iter_mut().filter(|f| f.has_source_id()) {
        if field.source_data_type != SourceDataType::Anything {
            continue;
        }
        if let Some(entry) = usable.iter().find(|c| c.id == field.source_field_id) {
            field.source_data_type = mapper::source_type_from_wire(entry.data_type.as_deref());
        }
    }
    Ok(())
}

/// Multiple-choice fields without configured options use the CLM's list.
async fn fill_choice_options<K: ClmApi + ?Sized>(clm: &K, fields: &mut [UnifiedField]) -> SyncResult<()> {
    let needs_options =
        |f: &UnifiedField| f.dest_data_type == DestDataType::MultipleChoice && f.options.is_empty();
    if !fields.iter().any(needs_options) {
        return Ok(());
    }
    let catalogue: Vec<ClmMetadataField> = clm.list_metadata_fields().await?;
    for field in fields.iter_mut().filter(|f| needs_options(f)) {
        let wanted = field.dest_field_name.trim().to_lowercase();
        if let Some(entry) = catalogue.iter().find(|c| c.name.trim().to_lowercase() == wanted) {
            field.options = entry.option_list();
        }
    }
    Ok(())
}

async fn sync_certificate<C: CaApi + ?Sized>(
    ca: &C,
    by_dest_name: &HashMap<String, &UnifiedField>,
    certificate: &ClmCertificate,
    acc: &mut Accounting,
) {
    if certificate.metadata.is_empty() {
        acc.skipped(format!("certificate {}: no metadata", certificate.id));
        return;
    }

    let mut mapped: Vec<(&UnifiedField, &str)> = Vec::new();
    let mut unresolved: Vec<&str> = Vec::new();
    for (name, value) in &certificate.metadata {
        match by_dest_name.get(&name.trim().to_lowercase()) {
            Some(field) if field.has_source_id() => mapped.push((*field, value.as_str())),
            Some(_) => unresolved.push(name.as_str()),
            None => trace!(certificate_id = certificate.id, key = %name, "Metadata key has no field mapping"),
        }
    }
    if !unresolved.is_empty() {
        acc.missing_fields(format!(
            "certificate {}: no CA field for {}",
            certificate.id,
            unresolved.join(", ")
        ));
    }
    if mapped.is_empty() {
        acc.skipped(format!("certificate {}: no mapped metadata", certificate.id));
        return;
    }

    let order = match ca
        .get_order_by_serial_or_thumbprint(certificate.serial_number.as_deref(), certificate.thumbprint.as_deref())
        .await
    {
        Ok(Some(order)) => order,
        Ok(None) => {
            acc.unmatched(format!("certificate {}: no CA order found", certificate.id));
            return;
        }
        Err(e) => {
            warn!(certificate_id = certificate.id, error = %e, "CA order lookup failed");
            acc.failed(format!("certificate {}: order lookup failed: {e}", certificate.id));
            return;
        }
    };

    let mut succeeded = 0;
    let mut failed = 0;
    for &(field, raw) in &mapped {
        let options = (field.dest_data_type == DestDataType::MultipleChoice).then_some(field.options.as_slice());
        let Some(value) = coerce_for_source(Some(raw), field.source_data_type, options) else {
            failed += 1;
            debug!(
                certificate_id = certificate.id,
                field = %field.source_field_name,
                data_type = %field.source_data_type,
                "Value rejected by coercion"
            );
            continue;
        };
        match ca
            .update_order_custom_field_value(order.id, field.source_field_id, &value)
            .await
        {
            Ok(()) => succeeded += 1,
            Err(e) => {
                failed += 1;
                warn!(
                    certificate_id = certificate.id,
                    order_id = order.id,
                    field = %field.source_field_name,
                    error = %e,
                    "Failed to update order custom field"
                );
            }
        }
    }

    if failed == 0 {
        acc.updated(format!(
            "certificate {} -> order {} ({succeeded} fields)",
            certificate.id, order.id
        ));
    } else {
        acc.partial(format!(
            "certificate {} -> order {} ({succeeded} updated, {failed} failed)",
            certificate.id, order.id
        ));
    }
}
