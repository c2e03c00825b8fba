//! Keygen command implementation.

use litekv_core::EncryptionConfig;

/// Prints a random secret and IV in the form the global options accept.
pub fn run() {
    let secret = EncryptionConfig::generate_secret();
    let iv = hex::encode(EncryptionConfig::generate_iv());
    println!("--secret {secret} --iv {iv}");
}
