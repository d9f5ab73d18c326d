//! Field reconciliation between the unified field list and a platform's
//! field catalogue.
//!
//! Works the same way for both platforms: index the catalogue by label
//! (case-insensitive), decide which unified fields are missing, and after the
//! caller has created them, re-read the catalogue and copy ids back onto the
//! unified fields. Ids from creation responses are never trusted.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::field::UnifiedField;
use crate::types::{DestDataType, FieldKind};

/// One entry of a platform's field catalogue.
pub trait CatalogField {
    fn id(&self) -> i64;
    fn label(&self) -> &str;

    /// CLM data type of the entry, when the catalogue reports one.
    fn dest_data_type(&self) -> Option<DestDataType> {
        None
    }
}

fn label_key(label: &str) -> String {
    label.trim().to_lowercase()
}

/// Case-insensitive label to id index over a catalogue.
///
/// When two catalogue entries share a label the first one wins and the
/// collision is logged.
#[derive(Debug, Clone, Default)]
pub struct LabelIndex {
    ids: HashMap<String, i64>,
    types: HashMap<String, DestDataType>,
}

impl LabelIndex {
    pub fn build<F: CatalogField>(catalogue: &[F]) -> Self {
        let mut index = Self::default();
        for entry in catalogue {
            let key = label_key(entry.label());
            if key.is_empty() {
                continue;
            }
            if let Some(existing) = index.ids.get(&key) {
                warn!(
                    label = entry.label(),
                    kept_id = existing,
                    ignored_id = entry.id(),
                    "Duplicate field label in catalogue, keeping the first"
                );
                continue;
            }
            index.ids.insert(key.clone(), entry.id());
            if let Some(t) = entry.dest_data_type() {
                index.types.insert(key, t);
            }
        }
        index
    }

    #[must_use]
    pub fn get(&self, label: &str) -> Option<i64> {
        self.ids.get(&label_key(label)).copied()
    }

    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.ids.contains_key(&label_key(label))
    }

    #[must_use]
    pub fn data_type(&self, label: &str) -> Option<DestDataType> {
        self.types.get(&label_key(label)).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// What has to be created on one platform.
#[derive(Debug, Clone, Default)]
pub struct ReconcilePlan {
    /// Fields missing from the catalogue, first occurrence of each label only.
    pub to_create: Vec<UnifiedField>,
    /// Label (as written on the unified field) to existing catalogue id.
    pub matched: HashMap<String, i64>,
    /// Existing fields whose catalogue type differs from the configured type.
    pub type_mismatches: Vec<String>,
}

fn plan<'a, F, I>(catalogue: &[F], fields: I, label_of: fn(&UnifiedField) -> &str) -> ReconcilePlan
where
    F: CatalogField,
    I: IntoIterator<Item = &'a UnifiedField>,
{
    let index = LabelIndex::build(catalogue);
    let mut plan = ReconcilePlan::default();
    let mut queued = HashSet::new();

    for field in fields {
        let label = label_of(field);
        if let Some(id) = index.get(label) {
            plan.matched.insert(label.to_string(), id);
            if let Some(existing) = index.data_type(label) {
                if existing != field.dest_data_type {
                    plan.type_mismatches.push(label.to_string());
                }
            }
            continue;
        }
        if queued.insert(label_key(label)) {
            plan.to_create.push(field.clone());
        } else {
            warn!(label, "Two fields share a label, only the first will be created");
        }
    }
    plan
}

/// Custom fields whose CA label is absent from the CA catalogue.
///
/// Manual fields read from order data and never need a CA field.
pub fn plan_source_creation<F: CatalogField>(ca_catalogue: &[F], fields: &[UnifiedField]) -> ReconcilePlan {
    let custom = fields.iter().filter(|f| f.field_kind == FieldKind::Custom);
    let plan = plan(ca_catalogue, custom, |f| f.source_field_name.as_str());
    debug!(
        matched = plan.matched.len(),
        to_create = plan.to_create.len(),
        "Planned CA field creation"
    );
    plan
}

/// Fields (manual and custom) whose CLM name is absent from the CLM catalogue.
pub fn plan_dest_creation<F: CatalogField>(clm_catalogue: &[F], fields: &[UnifiedField]) -> ReconcilePlan {
    let plan = plan(clm_catalogue, fields, |f| f.dest_field_name.as_str());
    for name in &plan.type_mismatches {
        warn!(field = %name, "CLM field exists with a different data type, keeping the existing field");
    }
    debug!(
        matched = plan.matched.len(),
        to_create = plan.to_create.len(),
        "Planned CLM field creation"
    );
    plan
}

fn apply_ids<'a, F, I>(
    catalogue: &[F],
    fields: I,
    label_of: fn(&UnifiedField) -> &str,
    set_id: fn(&mut UnifiedField, i64),
    platform: &str,
) -> usize
where
    F: CatalogField,
    I: IntoIterator<Item = &'a mut UnifiedField>,
{
    let index = LabelIndex::build(catalogue);
    let mut assigned = HashSet::new();
    let mut unresolved = 0;

    for field in fields {
        let label = label_of(field).to_string();
        match index.get(&label) {
            Some(id) if assigned.insert(label_key(&label)) => set_id(field, id),
            Some(_) => {
                warn!(
                    label = %label,
                    platform,
                    "Field label already matched by an earlier field, leaving this one unresolved"
                );
                set_id(field, 0);
                unresolved += 1;
            }
            None => {
                warn!(label = %label, platform, "Field not found in catalogue, its values will be skipped");
                set_id(field, 0);
                unresolved += 1;
            }
        }
    }
    unresolved
}

/// Copy CA ids onto custom fields by label. Returns how many stayed unresolved.
pub fn apply_source_ids<F: CatalogField>(ca_catalogue: &[F], fields: &mut [UnifiedField]) -> usize {
    let custom = fields.iter_mut().filter(|f| f.field_kind == FieldKind::Custom);
    apply_ids(
        ca_catalogue,
        custom,
        |f| f.source_field_name.as_str(),
        |f, id| f.source_field_id = id,
        "ca",
    )
}

/// Copy CLM ids onto every field by CLM name. Returns how many stayed unresolved.
pub fn apply_dest_ids<F: CatalogField>(clm_catalogue: &[F], fields: &mut [UnifiedField]) -> usize {
    apply_ids(
        clm_catalogue,
        fields.iter_mut(),
        |f| f.dest_field_name.as_str(),
        |f, id| f.dest_field_id = id,
        "clm",
    )
}
