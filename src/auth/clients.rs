use oauth2::{basic::BasicClient, AuthUrl, Client, ClientId, ClientSecret, RedirectUrl, TokenUrl};

use crate::config::GoogleConfig;

pub(crate) const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

type HappyClient = Client<oauth2::StandardErrorResponse<oauth2::basic::BasicErrorResponseType>, oauth2::StandardTokenResponse<oauth2::EmptyExtraTokenFields, oauth2::basic::BasicTokenType>, oauth2::StandardTokenIntrospectionResponse<oauth2::EmptyExtraTokenFields, oauth2::basic::BasicTokenType>, oauth2::StandardRevocableToken, oauth2::StandardErrorResponse<oauth2::RevocationErrorResponseType>, oauth2::EndpointSet, oauth2::EndpointNotSet, oauth2::EndpointNotSet, oauth2::EndpointNotSet, oauth2::EndpointSet>;

/// OAuth clients for the identity providers that have keys configured.
#[derive(Clone, Default)]
pub struct Clients {
    google_client: Option<HappyClient>,
}

impl Clients {
    pub fn from_config(google: Option<&GoogleConfig>) -> anyhow::Result<Clients> {
        let google_client = match google {
            Some(google) => {
                let client_id = ClientId::new(google.client_id.clone());
                let client_secret = ClientSecret::new(google.client_secret.clone());

                let auth_url = AuthUrl::new("https://accounts.google.com/o/oauth2/auth".to_string())?;
                let token_url = TokenUrl::new("https://oauth2.googleapis.com/token".to_string())?;
                let redirect_url = RedirectUrl::new(google.redirect_url.clone())?;

                Some(
                    BasicClient::new(client_id)
                    .set_client_secret(client_secret)
                    .set_auth_uri(auth_url)
                    .set_token_uri(token_url)
                    .set_redirect_uri(redirect_url)
                )
            }
            None => None,
        };

        Ok(Clients { google_client })
    }

    pub fn google(&self) -> Option<&HappyClient> {
        self.google_client.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn google_is_optional() {
        assert!(Clients::from_config(None).unwrap().google().is_none());

        let google = GoogleConfig {
            client_id: "id".into(),
            client_secret: "secret".into(),
            redirect_url: "http://localhost:3000/users/auth/google/callback".into(),
        };
        assert!(Clients::from_config(Some(&google)).unwrap().google().is_some());

        let broken = GoogleConfig { redirect_url: "not a url".into(), ..google };
        assert!(Clients::from_config(Some(&broken)).is_err());
    }
}
