pub mod cloud;

#[cfg(feature = "io-jsonl")]
pub mod jsonl;
