//! Infrastructure: persistence gateway, collaborator boundaries, and the two
//! orchestrated boundary operations (order lookup, return submission).

pub mod catalog;
pub mod gateway;
pub mod lookup;
pub mod storage;
pub mod submission;

pub use catalog::{CatalogError, OrderCatalog, OrderLineItem, OrderSnapshot, StaticOrderCatalog};
pub use gateway::{GatewayError, InMemoryReturnStore, PostgresReturnStore, RequestFilter, ReturnStore};
pub use lookup::{LookupError, LookupOrderService, OrderLookup, StorefrontConfig};
pub use storage::{upload_evidence_batch, EvidenceImage, EvidenceStore, InMemoryEvidenceStore, StorageError};
pub use submission::{
    SubmissionReceipt, SubmitItem, SubmitReturn, SubmitReturnService, SubmitError, ValidationError,
};
