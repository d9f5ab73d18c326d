//! Sync orchestration between the CA and the CLM.
//!
//! A run prepares the unified field list (fields file or CA catalogue, then
//! the banned-character gate), makes sure the receiving platform has the
//! fields, and pages through the CLM certificate inventory one certificate at
//! a time:
//!
//! - [`SyncMode::DcToKf`] reads each certificate's CA order and writes one
//!   metadata update to the CLM.
//! - [`SyncMode::KfToDc`] reads each certificate's CLM metadata and writes one
//!   custom-field update per mapped field to the CA order.
//!
//! Per-certificate failures are counted in the [`SyncSummary`] and never stop
//! the run; configuration problems and failures of the catalogue or listing
//! calls do.

mod dc_to_kf;
mod fields;
mod kf_to_dc;
mod settings;
mod summary;

use std::path::PathBuf;

use certmeta_core::{DestCoercer, FieldsFile};
use tracing::info;

use crate::api::{CaApi, ClmApi};
use crate::error::{SyncError, SyncResult};

pub use settings::{ParseSyncModeError, SyncMode, SyncSettings};
pub use summary::SyncSummary;

use summary::Accounting;

/// Runs syncs between one CA account and one CLM instance.
pub struct SyncEngine<C, K> {
    ca: C,
    clm: K,
    settings: SyncSettings,
    fields_file: FieldsFile,
    registry_path: PathBuf,
}

impl<C: CaApi, K: ClmApi> SyncEngine<C, K> {
    pub fn new(
        ca: C,
        clm: K,
        settings: SyncSettings,
        fields_file: FieldsFile,
        registry_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            ca,
            clm,
            settings,
            fields_file,
            registry_path: registry_path.into(),
        }
    }

    /// Execute one run in the given direction.
    pub async fn run(&self, mode: SyncMode) -> SyncResult<SyncSummary> {
        self.settings.validate()?;
        let coercer = DestCoercer::new(&self.settings.date_format).map_err(|e| SyncError::Config(e.to_string()))?;

        info!(
            mode = %mode,
            issuer_query_term = %self.settings.issuer_query_term,
            page_size = self.settings.page_size,
            "Starting metadata sync"
        );

        let fields =
            fields::prepare_fields(&self.ca, &self.settings, &self.fields_file, &self.registry_path).await?;

        let mut acc = Accounting::new(mode);
        match mode {
            SyncMode::DcToKf => {
                dc_to_kf::run(&self.ca, &self.clm, &self.settings, &coercer, fields, &mut acc).await?;
            }
            SyncMode::KfToDc => {
                kf_to_dc::run(&self.ca, &self.clm, &self.settings, fields, &mut acc).await?;
            }
        }
        let summary = acc.finish();

        info!(
            mode = %mode,
            pages = summary.pages,
            certificates = summary.certificates,
            updated = summary.updated,
            partial = summary.partial,
            unmatched = summary.unmatched,
            skipped = summary.skipped,
            failed = summary.failed,
            missing_custom_fields = summary.missing_custom_fields,
            fields_created = summary.fields_created,
            "Metadata sync completed"
        );
        Ok(summary)
    }
}
