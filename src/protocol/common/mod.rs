mod hex;

pub use hex::*;
