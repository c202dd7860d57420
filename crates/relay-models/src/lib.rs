//! Data models for the Basecamp relay.
//!
//! Remote records (`Project`, `TaskList`, `Task`, `Comment`) deserialize
//! straight from the Basecamp 3 JSON shape and are recreated on every poll.
//! `TaskKey` and `Mention` are the local identities the relay keeps.

pub mod mention;
pub mod remote;

pub use mention::{InvalidMention, Mention};
pub use remote::{Comment, Person, Project, Task, TaskKey, TaskList, UNSPECIFIED_DUE};
