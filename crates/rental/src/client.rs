use serde::{Deserialize, Serialize};

use rentpoint_core::{ClientId, Entity};

/// A registered client.
///
/// Clients are created by the registration service; the rental workflow only
/// reads them (existence checks and notification contact details).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    pub phone: String,
    pub email: String,
}

impl Client {
    /// Best contact for a cancellation notice: phone, falling back to email.
    pub fn contact(&self) -> Option<&str> {
        [self.phone.as_str(), self.email.as_str()]
            .into_iter()
            .find(|c| !c.trim().is_empty())
    }
}

impl Entity for Client {
    type Id = ClientId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(phone: &str, email: &str) -> Client {
        Client {
            id: ClientId::new(1).unwrap(),
            name: "Ivan".to_string(),
            phone: phone.to_string(),
            email: email.to_string(),
        }
    }

    #[test]
    fn contact_prefers_phone() {
        assert_eq!(client("+79161234567", "ivan@mail.ru").contact(), Some("+79161234567"));
    }

    #[test]
    fn contact_falls_back_to_email() {
        assert_eq!(client("  ", "ivan@mail.ru").contact(), Some("ivan@mail.ru"));
        assert_eq!(client("", "").contact(), None);
    }
}
