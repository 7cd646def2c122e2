pub mod account;
pub mod activation;
pub mod user;

pub use account::{Account, LoginInput, NewAccount, RegisterInput, Registration, DEFAULT_ROLE};
pub use activation::{Activation, ActivationInput, NewActivation, TIPOS};
pub use user::{Metrics, NewUser, User, UserChanges, UserInput, GENDERS};
