pub mod init;
pub mod literal;
