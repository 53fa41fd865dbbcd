//! Jobs: the record model, role/status gate, saved set and payment quoting.

pub mod gate;
pub mod model;
pub mod payment;
pub mod saved;

pub use gate::{JobAction, Viewer, actions_for, is_permitted, visible_actions};
pub use model::{Job, JobFilter, JobId, JobStatus, StatusFilter};
pub use payment::{PaymentProvider, PaymentQuote};
pub use saved::SavedJobIds;
