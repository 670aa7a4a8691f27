pub(crate) mod assembly;
pub(crate) mod classification;
pub(crate) mod complaint_intake;
pub(crate) mod debounce;
pub(crate) mod drafts;
pub(crate) mod photos;
pub(crate) mod status_transitions;
pub(crate) mod urgency;
