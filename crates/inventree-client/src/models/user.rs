//! Server user accounts

use super::model;

model! {
    /// User account
    User(UserModel) => "user"
}

impl User {
    pub fn username(&self) -> Option<&str> {
        self.str_field("username")
    }

    pub fn email(&self) -> Option<&str> {
        self.str_field("email")
    }

    /// "first last", skipping empty parts
    pub fn full_name(&self) -> String {
        [self.str_field("first_name"), self.str_field("last_name")]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
