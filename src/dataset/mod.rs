//! @ai:module:intent Test case dataset definitions and registry
//! @ai:module:layer domain
//! @ai:module:public_api TestCase, Complexity, RecordedSession, SessionTimeline, DatasetRegistry

pub mod registry;
pub mod session;
pub mod test_case;

pub use registry::{DatasetEntry, DatasetRegistry, DatasetRegistryTrait, DatasetSummary};
pub use session::{EventType, RecordedAction, RecordedSession, SessionEvent, SessionTimeline};
pub use test_case::{Complexity, TestCase};
