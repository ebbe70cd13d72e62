use crate::user;

pub trait UserMailboxTrait {
    fn full_name(&self) -> String;
    fn mailbox(&self) -> String;
}

impl UserMailboxTrait for user::Model {
    fn full_name(&self) -> String {
        [self.first_name.as_str(), self.last_name.as_str()]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn mailbox(&self) -> String {
        match self.full_name() {
            name if name.is_empty() => self.email.clone(),
            name => format!("{} <{}>", name, self.email),
        }
    }
}
