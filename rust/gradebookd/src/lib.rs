//! Grade-screenshot summarizer core: merges grade records extracted from
//! several screenshots of one course and projects the score needed on a
//! remaining component. Served over a JSON-lines stdio protocol by the
//! `gradebookd` binary.

pub mod calc;
pub mod config;
pub mod extract;
pub mod ipc;
pub mod merge;
pub mod model;
