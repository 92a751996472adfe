//! User-facing messages shared by several crates.

pub const NOT_LOGGED_IN: &str = "You are not logged in! Please log in to get access.";
pub const INVALID_TOKEN: &str = "Invalid token. Please log in again!";
pub const EXPIRED_TOKEN: &str = "Your token has expired! Please log in again.";
pub const USER_GONE: &str = "The user belonging to this token does no longer exist.";
pub const PASSWORD_CHANGED: &str = "User recently changed password! Please log in again.";
pub const NO_PERMISSION: &str = "You do not have permission to perform this action";
pub const TOO_MANY_REQUESTS: &str =
    "Too many requests from this IP, please try again in an hour!";
pub const GENERIC_SERVER_ERROR: &str = "Something went very wrong!";
