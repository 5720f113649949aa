pub mod login;
pub mod oauth_login;
pub mod register;
pub mod reset;
pub mod token;
pub mod verify_email;
