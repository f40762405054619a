pub mod response;
pub mod upload;
