pub mod cipher;
pub mod key;

pub use cipher::{SxCipher, SxDecryptStream, SxEncryptStream};
pub use key::SxKey;
