use base64::Engine;
use lib_retriever::UsernamePassword;
use reqwest::header::{HeaderValue, InvalidHeaderValue};

/// `Authorization` header value for Basic authentication with `credential`.
pub fn basic_auth_header(credential: &UsernamePassword) -> Result<HeaderValue, InvalidHeaderValue> {
    let token = base64::engine::general_purpose::STANDARD
        .encode(format!("{}:{}", credential.username, credential.secret));
    let mut value = HeaderValue::try_from(format!("Basic {token}"))?;
    value.set_sensitive(true);
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_username_and_secret() {
        let value = basic_auth_header(&UsernamePassword::new("user", "password")).unwrap();
        assert_eq!(value.to_str().unwrap(), "Basic dXNlcjpwYXNzd29yZA==");
        assert!(value.is_sensitive());
    }

    #[test]
    fn empty_secret_keeps_separator() {
        let value = basic_auth_header(&UsernamePassword::new("USER", "")).unwrap();
        assert_eq!(value.to_str().unwrap(), "Basic VVNFUjo=");
    }
}
