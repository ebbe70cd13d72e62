use chrono::{DateTime, FixedOffset, Utc};
use entities::user;
use sea_orm::{ActiveValue::NotSet, Set};

pub fn user() -> user::ActiveModel {
    let now = Utc::now();
    user::ActiveModel {
        id: NotSet,
        email: Set(format!("{}@test.com", uuid::Uuid::now_v7())),
        password: Set("password".to_string()),
        first_name: Set("Lynx".to_string()),
        last_name: Set("Levin".to_string()),
        is_active: Set(true),
        last_login: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
}

pub trait UserFactory {
    fn is_active(self, is_active: bool) -> user::ActiveModel;
    fn last_login(self, last_login: Option<DateTime<FixedOffset>>) -> user::ActiveModel;
}

impl UserFactory for user::ActiveModel {
    fn is_active(mut self, is_active: bool) -> user::ActiveModel {
        self.is_active = Set(is_active);
        self
    }

    fn last_login(mut self, last_login: Option<DateTime<FixedOffset>>) -> user::ActiveModel {
        self.last_login = Set(last_login);
        self
    }
}
