use crate::error::Result;

pub mod dbf;
pub mod error;
pub mod sx;

pub use dbf::pipeline::{transform, TransformMode, TransformOutcome};
pub use sx::{SxCipher, SxKey};

pub trait DeSerialise<'a> {
    type Item;

    fn deserialize(buffer: &'a [u8]) -> Result<Self::Item>;
}
