pub mod access_log;
pub mod journal;
pub mod mood;
pub mod private_note;
pub mod profile;
pub mod reflection;
