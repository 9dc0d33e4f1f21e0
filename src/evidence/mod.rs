pub mod blockchain;
pub mod hash;
pub mod metadata;

pub use hash::{Digest, DIGEST_HEX_LEN};
pub use metadata::{Metadata, MetadataBuilder};
