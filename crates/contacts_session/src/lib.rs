#![forbid(unsafe_code)]

pub mod change_cache;
pub mod filter;
pub mod session;
pub mod sync;
pub mod table;

pub use change_cache::{CacheState, ChangeCache};
pub use filter::{FilterEngine, FilterOutcome};
pub use session::ContactSession;
pub use sync::{SaveError, SavePhase, SaveReport, SyncCoordinator};
pub use table::{ContactTable, DisplayRow, TableError};
