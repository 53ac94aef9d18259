#[path = "integration/common/mod.rs"]
mod common;

#[path = "integration/session_merge.rs"]
mod session_merge;

#[path = "integration/makers.rs"]
mod makers;

#[path = "integration/delivery.rs"]
mod delivery;
