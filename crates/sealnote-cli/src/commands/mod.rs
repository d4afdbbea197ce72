pub mod device;
pub mod init;
pub mod keys;
pub mod misc;
pub mod note;
pub mod passphrase;
pub mod sync;
