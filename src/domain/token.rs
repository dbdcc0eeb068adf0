use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;

use crate::domain::entities::DecodedIdentity;
use crate::domain::errors::TokenDecodeError;

// Claims carried in the token payload segment. Only structural facts are
// read; the signature segment is never verified client-side.
#[derive(Debug, Deserialize)]
struct RawClaims {
    sub: String,
    #[serde(default)]
    roles: Vec<String>,
    exp: Option<u64>,
}

// Decodes a bearer token into identity facts. Pure; no network or storage
// access. Fails when the string is not structurally a token or lacks the
// mandatory expiry claim.
pub fn decode(raw: &str) -> Result<DecodedIdentity, TokenDecodeError> {
    let mut segments = raw.split('.');
    let (Some(_header), Some(claims), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(TokenDecodeError::NotAToken);
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(claims)
        .map_err(|_| TokenDecodeError::InvalidEncoding)?;
    let claims: RawClaims =
        serde_json::from_slice(&bytes).map_err(|_| TokenDecodeError::InvalidClaims)?;
    let expires_at = claims.exp.ok_or(TokenDecodeError::MissingExpiry)?;

    Ok(DecodedIdentity {
        subject: claims.sub,
        roles: claims.roles,
        expires_at,
    })
}

// Builds a structurally valid token around the given JSON claims. The
// header and signature segments are placeholders; decode() never reads them.
#[cfg(test)]
pub(crate) fn token_with_claims(claims: &serde_json::Value) -> String {
    format!("header.{}.signature", URL_SAFE_NO_PAD.encode(claims.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::UserRole;
    use serde_json::json;

    #[test]
    fn when_token_is_well_formed_then_decode_returns_identity_facts() {
        let token = token_with_claims(&json!({
            "sub": "alice",
            "roles": ["ADMIN"],
            "exp": 1_700_000_000u64,
        }));

        let identity = decode(&token).expect("expected decode to succeed");

        assert_eq!(identity.subject, "alice");
        assert_eq!(identity.roles, vec!["ADMIN".to_string()]);
        assert_eq!(identity.expires_at, 1_700_000_000);
        assert_eq!(identity.role(), UserRole::Admin);
    }

    #[test]
    fn when_token_has_no_roles_claim_then_decode_yields_empty_roles() {
        let token = token_with_claims(&json!({
            "sub": "alice",
            "exp": 1_700_000_000u64,
        }));

        let identity = decode(&token).expect("expected decode to succeed");

        assert!(identity.roles.is_empty());
        assert_eq!(identity.role(), UserRole::User);
    }

    #[test]
    fn when_token_has_two_segments_then_decode_rejects_it() {
        let result = decode("header.payload");

        assert!(matches!(result, Err(TokenDecodeError::NotAToken)));
    }

    #[test]
    fn when_token_has_four_segments_then_decode_rejects_it() {
        let result = decode("a.b.c.d");

        assert!(matches!(result, Err(TokenDecodeError::NotAToken)));
    }

    #[test]
    fn when_claims_segment_is_not_base64_then_decode_reports_encoding_error() {
        let result = decode("header.%%%.signature");

        assert!(matches!(result, Err(TokenDecodeError::InvalidEncoding)));
    }

    #[test]
    fn when_claims_segment_is_not_a_claims_object_then_decode_reports_claims_error() {
        let token = format!(
            "header.{}.signature",
            URL_SAFE_NO_PAD.encode("just some text")
        );

        let result = decode(&token);

        assert!(matches!(result, Err(TokenDecodeError::InvalidClaims)));
    }

    #[test]
    fn when_claims_lack_a_subject_then_decode_reports_claims_error() {
        let token = token_with_claims(&json!({ "exp": 1_700_000_000u64 }));

        let result = decode(&token);

        assert!(matches!(result, Err(TokenDecodeError::InvalidClaims)));
    }

    #[test]
    fn when_claims_lack_an_expiry_then_decode_reports_missing_expiry() {
        let token = token_with_claims(&json!({ "sub": "alice" }));

        let result = decode(&token);

        assert!(matches!(result, Err(TokenDecodeError::MissingExpiry)));
    }
}
