
mod login_test;
mod oauth_test;
mod register_test;
mod reset_test;
mod verify_test;
