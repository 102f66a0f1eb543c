//! Agreement records: normalization, reconciliation, views and Excel I/O

pub mod excel;
pub mod normalize;
pub mod reconcile;
pub mod record;
pub mod view;

pub use reconcile::{ChangeSet, new_rows, reconcile};
pub use record::{Record, RecordUpdate};
pub use view::{ViewFilter, due_on, filter_options};
