mod commands;
mod queries;
mod types;

pub(crate) use commands::{create, update_status};
pub(crate) use queries::{count, find_by_id, list, stats};
pub(crate) use types::{ComplaintFilter, ComplaintStats, CreateComplaint};
