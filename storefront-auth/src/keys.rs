//! ES256 key material for the identity provider.
//!
//! The demo provider signs with a P-256 key pair and publishes the public
//! half as a JWKS so verifiers never see the private key.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use jsonwebtoken::jwk::AlgorithmParameters;
use jsonwebtoken::jwk::CommonParameters;
use jsonwebtoken::jwk::EllipticCurve;
use jsonwebtoken::jwk::EllipticCurveKeyParameters;
use jsonwebtoken::jwk::EllipticCurveKeyType;
use jsonwebtoken::jwk::Jwk;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::jwk::KeyAlgorithm;
use jsonwebtoken::jwk::KeyOperations;
use jsonwebtoken::jwk::PublicKeyUse;
use jsonwebtoken::EncodingKey;
use p256::ecdsa::SigningKey;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::pkcs8::DecodePrivateKey;
use p256::pkcs8::EncodePrivateKey;
use rand_core::OsRng;
use uuid::Uuid;

use crate::error::AuthenticationError;

/// An ES256 signing key plus the derived public JWK.
pub struct KeyMaterial {
    signing_key: SigningKey,
    kid: String,
}

impl KeyMaterial {
    /// Generate a fresh ephemeral key pair. Tokens signed with it become
    /// unverifiable on restart, which is fine for the demo trust model.
    pub fn ephemeral() -> Self {
        Self {
            signing_key: SigningKey::random(&mut OsRng),
            kid: Uuid::new_v4().simple().to_string(),
        }
    }

    /// Load a PKCS#8 PEM private key, e.g. the `keys/private_key.pem` shipped
    /// with a deployment.
    pub fn from_pkcs8_pem(pem: &str, kid: impl Into<String>) -> Result<Self, AuthenticationError> {
        let signing_key = SigningKey::from_pkcs8_pem(pem)
            .map_err(|e| AuthenticationError::BadKeyMaterial(e.to_string()))?;
        Ok(Self {
            signing_key,
            kid: kid.into(),
        })
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    pub(crate) fn encoding_key(&self) -> Result<EncodingKey, AuthenticationError> {
        let der = self
            .signing_key
            .to_pkcs8_der()
            .map_err(|e| AuthenticationError::BadKeyMaterial(e.to_string()))?;
        Ok(EncodingKey::from_ec_der(&der.to_bytes()))
    }

    /// The public verification key as a JWK.
    pub fn jwk(&self) -> Jwk {
        let point = self.signing_key.verifying_key().to_encoded_point(false);
        Jwk {
            common: CommonParameters {
                public_key_use: Some(PublicKeyUse::Signature),
                key_operations: Some(vec![KeyOperations::Verify]),
                key_algorithm: Some(KeyAlgorithm::ES256),
                key_id: Some(self.kid.clone()),
                ..Default::default()
            },
            algorithm: AlgorithmParameters::EllipticCurve(EllipticCurveKeyParameters {
                key_type: EllipticCurveKeyType::EC,
                curve: EllipticCurve::P256,
                x: URL_SAFE_NO_PAD.encode(point.x().expect("uncompressed point has x")),
                y: URL_SAFE_NO_PAD.encode(point.y().expect("uncompressed point has y")),
            }),
        }
    }

    /// The keyset to publish at the well-known endpoint.
    pub fn jwks(&self) -> JwkSet {
        JwkSet {
            keys: vec![self.jwk()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jwk_carries_kid_and_es256() {
        let keys = KeyMaterial::ephemeral();
        let jwk = keys.jwk();
        assert_eq!(jwk.common.key_id.as_deref(), Some(keys.kid()));
        assert_eq!(jwk.common.key_algorithm, Some(KeyAlgorithm::ES256));
        match jwk.algorithm {
            AlgorithmParameters::EllipticCurve(params) => {
                assert_eq!(params.curve, EllipticCurve::P256);
            }
            other => panic!("unexpected key parameters: {other:?}"),
        }
    }

    #[test]
    fn keyset_round_trips_through_json() {
        let keys = KeyMaterial::ephemeral();
        let serialized = serde_json::to_string(&keys.jwks()).unwrap();
        let parsed: JwkSet = serde_json::from_str(&serialized).unwrap();
        assert_eq!(parsed.keys.len(), 1);
        assert!(parsed.find(keys.kid()).is_some());
    }
}
