pub mod converter;
pub mod storage;
