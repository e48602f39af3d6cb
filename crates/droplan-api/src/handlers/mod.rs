//! HTTP handlers, one module per operation.

pub mod file_delete;
pub mod file_download;
pub mod file_upload;
pub mod files_list;
pub mod server_info;
