//! CA to CLM: copy order data into CLM certificate metadata.

use std::collections::HashSet;

use certmeta_core::reconcile::{apply_dest_ids, plan_dest_creation};
use certmeta_core::{DestCoercer, DestDataType, FieldKind, FieldPath, MetadataPayload, UnifiedField};
use serde_json::Value;
use tracing::{debug, info, trace, warn};

use crate::api::{CaApi, ClmApi};
use crate::ca_models::OrderDetail;
use crate::clm_models::{ClmCertificate, ClmMetadataField, ClmMetadataFieldRequest};
use crate::error::SyncResult;

use super::settings::SyncSettings;
use super::summary::Accounting;

/// A field that can receive values, with its order path pre-parsed.
struct Binding {
    field: UnifiedField,
    path: Option<FieldPath>,
}

impl Binding {
    fn source_value<'a>(&self, order: &'a OrderDetail) -> Option<&'a Value> {
        match (&self.field.field_kind, &self.path) {
            (FieldKind::Manual, Some(path)) => path.resolve(&order.raw),
            (FieldKind::Manual, None) => None,
            (FieldKind::Custom, _) => order.custom_field_value(&self.field.source_field_name),
        }
    }
}

pub(crate) async fn run<C, K>(
    ca: &C,
    clm: &K,
    settings: &SyncSettings,
    coercer: &DestCoercer,
    mut fields: Vec<UnifiedField>,
    acc: &mut Accounting,
) -> SyncResult<()>
where
    C: CaApi + ?Sized,
    K: ClmApi + ?Sized,
{
    ensure_clm_fields(clm, &mut fields, acc).await?;

    let bindings: Vec<Binding> = fields
        .into_iter()
        .filter(UnifiedField::has_dest_id)
        .map(|field| {
            let path = match field.field_kind {
                FieldKind::Manual => FieldPath::parse(&field.source_field_name).ok(),
                FieldKind::Custom => None,
            };
            Binding { field, path }
        })
        .collect();
    let known_labels: HashSet<String> = bindings
        .iter()
        .filter(|b| b.field.field_kind == FieldKind::Custom)
        .map(|b| b.field.source_field_name.trim().to_lowercase())
        .collect();
    info!(fields = bindings.len(), "Starting CA to CLM metadata sync");

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
            sync_certificate(ca, clm, coercer, &bindings, &known_labels, certificate, acc).await;
        }
        debug!(page, count = certificates.len(), "Processed certificate page");
        page += 1;
    }
    Ok(())
}

/// Create missing CLM fields, re-read the catalogue and resolve CLM ids.
async fn ensure_clm_fields<K: ClmApi + ?Sized>(
    clm: &K,
    fields: &mut [UnifiedField],
    acc: &mut Accounting,
) -> SyncResult<()> {
    let mut catalogue = clm.list_metadata_fields().await?;
    let plan = plan_dest_creation(&catalogue, fields);

    let mut created = 0;
    for field in &plan.to_create {
        match clm.create_metadata_field(&ClmMetadataFieldRequest::from_unified(field)).await {
            Ok(()) => {
                created += 1;
                acc.field_created();
            }
            Err(e) => warn!(
                field = %field.dest_field_name,
                error = %e,
                "Failed to create CLM metadata field, its values will be skipped"
            ),
        }
    }
    if created > 0 {
        catalogue = clm.list_metadata_fields().await?;
    }

    apply_dest_ids(&catalogue, fields);
    fill_choice_options(&catalogue, fields);
    Ok(())
}

/// Multiple-choice fields without configured options use the CLM's list.
fn fill_choice_options(catalogue: &[ClmMetadataField], fields: &mut [UnifiedField]) {
    for field in fields
        .iter_mut()
        .filter(|f| f.dest_data_type == DestDataType::MultipleChoice && f.options.is_empty() && f.has_dest_id())
    {
        if let Some(entry) = catalogue.iter().find(|c| c.id == field.dest_field_id) {
            field.options = entry.option_list();
        }
    }
}

async fn sync_certificate<C, K>(
    ca: &C,
    clm: &K,
    coercer: &DestCoercer,
    bindings: &[Binding],
    known_labels: &HashSet<String>,
    certificate: &ClmCertificate,
    acc: &mut Accounting,
) where
    C: CaApi + ?Sized,
    K: ClmApi + ?Sized,
{
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

    let unknown: Vec<&str> = order
        .custom_fields
        .iter()
        .filter(|f| !f.value.is_null() && !known_labels.contains(&f.label.trim().to_lowercase()))
        .map(|f| f.label.as_str())
        .collect();
    if !unknown.is_empty() {
        acc.missing_fields(format!(
            "certificate {} / order {}: no field for {}",
            certificate.id,
            order.id,
            unknown.join(", ")
        ));
    }

    let mut payload = MetadataPayload::new();
    let mut rejected = 0;
    for binding in bindings {
        let Some(raw) = binding.source_value(&order) else {
            continue;
        };
        let field = &binding.field;
        let options = (field.dest_data_type == DestDataType::MultipleChoice).then_some(field.options.as_slice());
        match coercer.coerce(raw, field.dest_data_type, options) {
            Some(value) => payload.insert(field, value),
            None => {
                rejected += 1;
                trace!(
                    certificate_id = certificate.id,
                    field = %field.dest_field_name,
                    data_type = %field.dest_data_type,
                    value = %raw,
                    "Value rejected by coercion"
                );
            }
        }
    }

    if payload.is_empty() {
        acc.skipped(format!("certificate {}: nothing to write", certificate.id));
        return;
    }

    match clm.update_certificate_metadata(certificate.id, &payload).await {
        Ok(()) if rejected == 0 => acc.updated(format!(
            "certificate {} <- order {} ({} fields)",
            certificate.id,
            order.id,
            payload.len()
        )),
        Ok(()) => acc.partial(format!(
            "certificate {} <- order {} ({} fields, {rejected} rejected)",
            certificate.id,
            order.id,
            payload.len()
        )),
        Err(e) => {
            warn!(certificate_id = certificate.id, error = %e, "Failed to update certificate metadata");
            acc.failed(format!("certificate {}: metadata update failed: {e}", certificate.id));
        }
    }
}
