pub mod client;
pub mod digest;

pub use client::{DigestPolicy, Downloader, Fetch, FetchOutcome, FetchRequest, FileKind};
pub use digest::{check_digest, digest_bytes, digest_file, is_sha1_hex, DigestAlgorithm};
