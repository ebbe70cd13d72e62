pub const INVALID_UID_ERROR: &str = "Invalid user id or user doesn't exist.";
pub const INVALID_TOKEN_ERROR: &str = "Invalid token for given user.";
pub const STALE_TOKEN_ERROR: &str = "Stale token for given user.";
pub const BLANK_FIELD_ERROR: &str = "This field may not be blank.";
pub const EMAIL_NOT_FOUND: &str =
    "User with this email was not found. This happens if you have already activated this user.";
pub const EMAIL_ALREADY_REGISTERED: &str = "A user with this email already exists.";
