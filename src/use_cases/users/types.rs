use entities::user;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserVisible {
    pub id: i32,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
}

impl From<user::Model> for UserVisible {
    fn from(value: user::Model) -> Self {
        Self {
            id: value.id,
            email: value.email,
            first_name: value.first_name,
            last_name: value.last_name,
            is_active: value.is_active,
        }
    }
}

#[derive(Deserialize, Debug, Serialize, Clone, PartialEq)]
pub struct ActivationData {
    pub uid: String,
    pub token: String,
}

/// Raw activation request: the `uid`/`token` pair out of an activation link.
#[derive(Deserialize, Debug, Serialize, Clone, PartialEq)]
pub struct ActivationRequest {
    pub request_id: uuid::Uuid,
    pub data: ActivationData,
}

impl ActivationRequest {
    pub fn new(uid: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            request_id: uuid::Uuid::now_v7(),
            data: ActivationData {
                uid: uid.into(),
                token: token.into(),
            },
        }
    }
}

/// Output of request validation: the user the request was proven to be for.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedActivation {
    pub user: user::Model,
}

#[derive(Deserialize, Debug, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}
