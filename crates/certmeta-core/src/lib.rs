//! Certificate metadata pipeline.
//!
//! Pure building blocks shared by both sync directions:
//!
//! - [`banned`] keeps CLM field names inside the CLM's identifier alphabet
//! - [`mapper`] translates data types between the CA and the CLM
//! - [`coerce`] shapes raw values into what the receiving field accepts
//! - [`reconcile`] works out which fields are missing on either platform
//! - [`path`] reads manual field values out of CA order records
//!
//! Nothing in this crate performs network I/O.

pub mod banned;
pub mod coerce;
pub mod error;
pub mod field;
pub mod flush;
pub mod mapper;
pub mod path;
pub mod payload;
pub mod reconcile;
pub mod sanitize;
pub mod types;

pub use banned::{BannedCharacter, BannedCharacterCheck, BannedCharacterRegistry};
pub use coerce::{coerce_for_source, CoercedValue, DestCoercer};
pub use error::{CoreError, CoreResult};
pub use field::{FieldDefinition, FieldsFile, UnifiedField};
pub use flush::FlushBuffer;
pub use path::FieldPath;
pub use payload::MetadataPayload;
pub use reconcile::{CatalogField, LabelIndex, ReconcilePlan};
pub use types::{DestDataType, EnrollmentPolicy, FieldKind, SourceDataType};
