//! Config - 설정 관리
//!
//! - `supervisor.rs` - SupervisorConfig (프로세스 감독자 설정)

mod supervisor;

pub use supervisor::{SupervisorConfig, SupervisorConfigLayer, SUPERVISOR_CONFIG_FILE};
