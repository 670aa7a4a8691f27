pub(crate) mod drafts_sweeper;
