//! Credentials and SASL mechanisms for SMTP authentication.

use std::fmt::{self, Display, Formatter};

/// Contains user credentials
#[derive(PartialEq, Eq, Clone, Debug, Default)]
pub struct Credentials {
    username: String,
    secret: String,
}

impl Credentials {
    /// Creates credentials from a username and a password or access token
    pub fn new(username: String, secret: String) -> Credentials {
        Credentials { username, secret }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }
}

/// The closed set of supported authentication mechanisms. Anything else is
/// unrepresentable, so an unsupported method can never reach the wire.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum Mechanism {
    /// `AUTH LOGIN`, challenge/response with base64 username and secret
    Login,
    /// `AUTH XOAUTH2`, single base64 SASL blob carrying a bearer token
    Xoauth2,
}

impl Display for Mechanism {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(match self {
            Mechanism::Login => "LOGIN",
            Mechanism::Xoauth2 => "XOAUTH2",
        })
    }
}

impl Mechanism {
    /// The argument sent along with the `AUTH` command itself. LOGIN sends
    /// nothing up front and answers the server's challenges instead.
    pub fn initial_response(self, credentials: &Credentials) -> Option<String> {
        match self {
            Mechanism::Login => None,
            Mechanism::Xoauth2 => Some(base64::encode(format!(
                "user={}\x01auth=Bearer {}\x01\x01",
                credentials.username, credentials.secret
            ))),
        }
    }
}

/// Base64 of the username, the reply to the first LOGIN challenge
pub fn login_username(credentials: &Credentials) -> String {
    base64::encode(&credentials.username)
}

/// Base64 of the secret, the reply to the second LOGIN challenge
pub fn login_secret(credentials: &Credentials) -> String {
    base64::encode(&credentials.secret)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_login_challenges() {
        let credentials = Credentials::new("alice".to_string(), "wonderland".to_string());
        assert_eq!(Mechanism::Login.initial_response(&credentials), None);
        assert_eq!(login_username(&credentials), base64::encode("alice"));
        assert_eq!(login_secret(&credentials), base64::encode("wonderland"));
    }

    #[test]
    fn test_xoauth2_blob() {
        let credentials = Credentials::new("user@example.org".to_string(), "token".to_string());
        let blob = Mechanism::Xoauth2.initial_response(&credentials).unwrap();
        let decoded = base64::decode(&blob).unwrap();
        assert_eq!(
            decoded,
            b"user=user@example.org\x01auth=Bearer token\x01\x01"
        );
    }
}
