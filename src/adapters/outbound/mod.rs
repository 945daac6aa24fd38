pub mod scratch;
pub mod storage;
