//! Digest-preserving transforms and conventions layered on the node model.

pub mod attachment;
pub mod compress;
pub mod encrypt;
pub mod recipient;
pub mod salt;
pub mod signature;

pub use attachment::Attachments;
pub use compress::Compressed;
pub use salt::MIN_SALT_LEN;
