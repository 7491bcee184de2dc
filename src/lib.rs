//! Codeshare 실시간 동기화 서버 라이브러리
//!
//! 방 단위 코드 공유: 참여 시 저장된 코드를 불러오고, 편집은 나머지 참여자에게
//! 중계하며 비동기로 저장한다. 오래되었거나 빈 방은 주기적으로 정리한다.

pub mod config;
pub mod error;
pub mod handlers;
pub mod hub;
pub mod protocol;
pub mod scheduler;
pub mod server;
pub mod state;
pub mod store;
pub mod sweeper;
pub mod sync;
