pub mod keyring;

pub use keyring::KeyringStorage;
