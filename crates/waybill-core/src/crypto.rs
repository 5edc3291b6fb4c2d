//! Signing primitives: the algorithm/key registry and the bundled Ed25519
//! handler.
//!
//! The core never touches key material directly. `Add` and `Verify` resolve
//! a handler by algorithm name and key blobs by issuer through a
//! [`SigningRegistry`], then hand both to the handler. The signed message is
//! the bare hex encoding of the entry digest, so signatures stay portable
//! across serializations.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use ed25519_dalek::{Signature as DalekSignature, Signer as _, SigningKey, Verifier as _, VerifyingKey};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SlipError};
use crate::identity::Issuer;

/// Name of the bundled signature algorithm.
pub const ED25519_ALGORITHM: &str = "ed25519";

/// Media type recorded for bundled Ed25519 signatures.
pub const ED25519_MEDIA_TYPE: &str = "application/vnd.waybill.signature.ed25519";

/// A signature as persisted on a leaf entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureSpec {
    /// Algorithm name, resolvable through the registry.
    pub algorithm: String,

    /// Hex-encoded signature bytes.
    pub value: String,

    /// Media type describing the signature encoding.
    #[serde(rename = "mediaType")]
    pub media_type: String,

    /// Normalized identity of the signer.
    pub issuer: String,
}

/// Key material and identity handed to a signing handler.
pub struct SigningContext<'a> {
    /// Private key blob, when signing (or verifying with only a private key).
    pub private_key: Option<&'a [u8]>,

    /// Public key blob, when available.
    pub public_key: Option<&'a [u8]>,

    /// The issuer the operation runs for.
    pub issuer: &'a Issuer,
}

/// Produces signatures over digest bytes.
pub trait Signer: Send + Sync {
    fn sign(&self, digest_hex: &str, ctx: &SigningContext<'_>) -> Result<SignatureSpec>;
}

/// Checks signatures over digest bytes.
pub trait Verifier: Send + Sync {
    fn verify(
        &self,
        digest_hex: &str,
        signature: &SignatureSpec,
        ctx: &SigningContext<'_>,
    ) -> Result<()>;
}

/// Registry of signing handlers and issuer key material.
///
/// Handlers are keyed by algorithm name; key blobs by normalized issuer.
/// The blobs are opaque to the registry, interpreted only by the handler
/// for the algorithm in use.
pub struct SigningRegistry {
    signers: HashMap<String, Arc<dyn Signer>>,
    verifiers: HashMap<String, Arc<dyn Verifier>>,
    private_keys: HashMap<String, Vec<u8>>,
    public_keys: HashMap<String, Vec<u8>>,
}

impl SigningRegistry {
    /// A registry with the bundled Ed25519 handler registered.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        let handler = Arc::new(Ed25519Handler);
        registry.register_signer(ED25519_ALGORITHM, handler.clone());
        registry.register_verifier(ED25519_ALGORITHM, handler);
        registry
    }

    /// A registry with no handlers and no keys.
    pub fn empty() -> Self {
        Self {
            signers: HashMap::new(),
            verifiers: HashMap::new(),
            private_keys: HashMap::new(),
            public_keys: HashMap::new(),
        }
    }

    /// Register a signing handler for an algorithm.
    pub fn register_signer(&mut self, algorithm: &str, signer: Arc<dyn Signer>) {
        self.signers.insert(algorithm.to_string(), signer);
    }

    /// Register a verification handler for an algorithm.
    pub fn register_verifier(&mut self, algorithm: &str, verifier: Arc<dyn Verifier>) {
        self.verifiers.insert(algorithm.to_string(), verifier);
    }

    /// Look up the signer for an algorithm.
    pub fn signer(&self, algorithm: &str) -> Option<Arc<dyn Signer>> {
        self.signers.get(algorithm).cloned()
    }

    /// Look up the verifier for an algorithm.
    pub fn verifier(&self, algorithm: &str) -> Option<Arc<dyn Verifier>> {
        self.verifiers.get(algorithm).cloned()
    }

    /// Store a private key blob for an issuer.
    pub fn add_private_key(&mut self, issuer: &Issuer, key: Vec<u8>) {
        self.private_keys.insert(issuer.normalized(), key);
    }

    /// Store a public key blob for an issuer.
    pub fn add_public_key(&mut self, issuer: &Issuer, key: Vec<u8>) {
        self.public_keys.insert(issuer.normalized(), key);
    }

    /// Register both halves of an Ed25519 keypair for an issuer.
    pub fn add_ed25519_keypair(&mut self, issuer: &Issuer, keypair: &Ed25519KeyPair) {
        self.add_private_key(issuer, keypair.seed().to_vec());
        self.add_public_key(issuer, keypair.public_key().to_vec());
    }

    /// Resolve the private key blob for an issuer.
    pub fn resolve_private_key(&self, issuer: &Issuer) -> Option<&[u8]> {
        self.private_keys
            .get(&issuer.normalized())
            .map(Vec::as_slice)
    }

    /// Resolve the public key blob for an issuer.
    pub fn public_key(&self, issuer: &Issuer) -> Option<&[u8]> {
        self.public_keys
            .get(&issuer.normalized())
            .map(Vec::as_slice)
    }
}

impl Default for SigningRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SigningRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningRegistry")
            .field("signers", &self.signers.keys())
            .field("verifiers", &self.verifiers.keys())
            .field("issuers", &self.public_keys.keys())
            .finish()
    }
}

/// An Ed25519 keypair; the private blob is the 32-byte seed.
#[derive(Clone)]
pub struct Ed25519KeyPair {
    signing_key: SigningKey,
}

impl Ed25519KeyPair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        Self {
            signing_key: SigningKey::generate(&mut rng),
        }
    }

    /// Create from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// The seed bytes (private key material).
    pub fn seed(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    /// The public key bytes.
    pub fn public_key(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }
}

impl fmt::Debug for Ed25519KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ed25519KeyPair({})", hex::encode(self.public_key()))
    }
}

/// The bundled Ed25519 signing handler.
pub struct Ed25519Handler;

impl Signer for Ed25519Handler {
    fn sign(&self, digest_hex: &str, ctx: &SigningContext<'_>) -> Result<SignatureSpec> {
        let issuer = ctx.issuer.normalized();
        let seed = ctx
            .private_key
            .ok_or_else(|| SlipError::NoPrivateKey(issuer.clone()))?;
        let seed: [u8; 32] = seed.try_into().map_err(|_| SlipError::SigningFailed {
            issuer: issuer.clone(),
            reason: "private key must be a 32-byte seed".to_string(),
        })?;
        let key = SigningKey::from_bytes(&seed);
        let signature = key.sign(digest_hex.as_bytes());
        Ok(SignatureSpec {
            algorithm: ED25519_ALGORITHM.to_string(),
            value: hex::encode(signature.to_bytes()),
            media_type: ED25519_MEDIA_TYPE.to_string(),
            issuer,
        })
    }
}

impl Verifier for Ed25519Handler {
    fn verify(
        &self,
        digest_hex: &str,
        signature: &SignatureSpec,
        ctx: &SigningContext<'_>,
    ) -> Result<()> {
        let invalid = |reason: &str| SlipError::SignatureInvalid {
            digest: digest_hex.to_string(),
            reason: reason.to_string(),
        };

        let public: [u8; 32] = match (ctx.public_key, ctx.private_key) {
            (Some(bytes), _) => bytes
                .try_into()
                .map_err(|_| invalid("public key must be 32 bytes"))?,
            (None, Some(seed)) => {
                let seed: [u8; 32] = seed
                    .try_into()
                    .map_err(|_| invalid("private key must be a 32-byte seed"))?;
                SigningKey::from_bytes(&seed).verifying_key().to_bytes()
            }
            (None, None) => return Err(SlipError::NoKey(ctx.issuer.normalized())),
        };

        let verifying_key =
            VerifyingKey::from_bytes(&public).map_err(|_| invalid("malformed public key"))?;
        let raw = hex::decode(&signature.value).map_err(|_| invalid("malformed signature hex"))?;
        let raw: [u8; 64] = raw
            .try_into()
            .map_err(|_| invalid("signature must be 64 bytes"))?;
        verifying_key
            .verify(digest_hex.as_bytes(), &DalekSignature::from_bytes(&raw))
            .map_err(|_| invalid("signature verification failed"))
    }
}
