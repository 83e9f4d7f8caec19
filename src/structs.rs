pub mod flags;
pub mod package;
pub mod packageupdate;
pub mod raw;
