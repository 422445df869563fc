pub mod connector;
pub mod error;

pub use connector::{Knowledge, KnowledgeConnector, DUMMY_SUMMARY_PREFIX};
pub use error::ServiceError;
