pub mod gallery_service;
pub mod storage;
pub mod thumbnail_service;
