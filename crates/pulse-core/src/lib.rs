pub mod identity;
pub mod init_data;

pub use identity::{UserIdentity, UserView};
pub use init_data::{sign, VerifiedFields, Verifier, VerifyError};
