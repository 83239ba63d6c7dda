pub mod health;
pub mod storage_files;
pub mod transfers;
pub mod verify;
