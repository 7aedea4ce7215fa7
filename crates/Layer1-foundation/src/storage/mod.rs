//! Storage module for bgproc
//!
//! - `json`: JSON - 설정 파일 로드

mod json;

pub use json::JsonStore;
pub(crate) use json::load_file;
