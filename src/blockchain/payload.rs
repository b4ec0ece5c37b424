//! Move call payloads and the transaction envelope.
//!
//! # Layout
//! ```text
//! RawTransaction
//!     sender | sequence_number | payload | max_gas_amount
//!     | gas_unit_price | expiration_timestamp_secs | chain_id
//! SignedTransaction
//!     RawTransaction | Ed25519 authenticator (public key, signature)
//! ```
//!
//! Wire bytes come from `bcs::to_bytes` over the serde derives below, so
//! field and variant order is part of the format.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use sha3::{Digest, Sha3_256};

use crate::blockchain::types::{Address, BlockchainError, BlockchainResult};

/// Domain separator hashed in front of every signed raw transaction.
const RAW_TRANSACTION_SALT: &[u8] = b"APTOS::RawTransaction";

/// Move type tag. Variant order fixes the wire tag (bool = 0 .. struct = 7).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TypeTag {
    Bool,
    U8,
    U64,
    U128,
    Address,
    Signer,
    Vector(Box<TypeTag>),
    Struct(Box<StructTag>),
}

/// Fully qualified Move struct type, e.g. `0x1::aptos_coin::AptosCoin`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructTag {
    pub address: Address,
    pub module: String,
    pub name: String,
    pub type_args: Vec<TypeTag>,
}

impl FromStr for TypeTag {
    type Err = BlockchainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = TypeTagParser { input: s, pos: 0 };
        let tag = parser.type_tag()?;
        parser.skip_ws();
        if parser.pos != s.len() {
            return Err(BlockchainError::InvalidTypeTag(s.to_string()));
        }
        Ok(tag)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Bool => f.write_str("bool"),
            TypeTag::U8 => f.write_str("u8"),
            TypeTag::U64 => f.write_str("u64"),
            TypeTag::U128 => f.write_str("u128"),
            TypeTag::Address => f.write_str("address"),
            TypeTag::Signer => f.write_str("signer"),
            TypeTag::Vector(inner) => write!(f, "vector<{}>", inner),
            TypeTag::Struct(tag) => {
                write!(f, "{}::{}::{}", tag.address, tag.module, tag.name)?;
                if !tag.type_args.is_empty() {
                    f.write_str("<")?;
                    for (i, arg) in tag.type_args.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{}", arg)?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
        }
    }
}

/// Recursive-descent parser over a type tag string.
struct TypeTagParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> TypeTagParser<'a> {
    fn error(&self) -> BlockchainError {
        BlockchainError::InvalidTypeTag(self.input.to_string())
    }

    fn skip_ws(&mut self) {
        while self.rest().starts_with(' ') {
            self.pos += 1;
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn eat(&mut self, token: &str) -> bool {
        self.skip_ws();
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn ident(&mut self) -> BlockchainResult<&'a str> {
        self.skip_ws();
        let rest = self.rest();
        let len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        if len == 0 {
            return Err(self.error());
        }
        self.pos += len;
        Ok(&rest[..len])
    }

    fn type_tag(&mut self) -> BlockchainResult<TypeTag> {
        let head = self.ident()?;
        let tag = match head {
            "bool" => TypeTag::Bool,
            "u8" => TypeTag::U8,
            "u64" => TypeTag::U64,
            "u128" => TypeTag::U128,
            "address" => TypeTag::Address,
            "signer" => TypeTag::Signer,
            "vector" => {
                if !self.eat("<") {
                    return Err(self.error());
                }
                let inner = self.type_tag()?;
                if !self.eat(">") {
                    return Err(self.error());
                }
                TypeTag::Vector(Box::new(inner))
            }
            addr => {
                let address: Address = addr.parse().map_err(|_| self.error())?;
                if !self.eat("::") {
                    return Err(self.error());
                }
                let module = self.ident()?.to_string();
                if !self.eat("::") {
                    return Err(self.error());
                }
                let name = self.ident()?.to_string();
                let mut type_args = Vec::new();
                if self.eat("<") {
                    loop {
                        type_args.push(self.type_tag()?);
                        if self.eat(",") {
                            continue;
                        }
                        if self.eat(">") {
                            break;
                        }
                        return Err(self.error());
                    }
                }
                TypeTag::Struct(Box::new(StructTag {
                    address,
                    module,
                    name,
                    type_args,
                }))
            }
        };
        Ok(tag)
    }
}

/// `address::module` pair naming a published Move module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleId {
    pub address: Address,
    pub name: String,
}

impl FromStr for ModuleId {
    type Err = BlockchainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (address, name) = s
            .split_once("::")
            .ok_or_else(|| BlockchainError::InvalidTypeTag(s.to_string()))?;
        if name.is_empty() || name.contains("::") {
            return Err(BlockchainError::InvalidTypeTag(s.to_string()));
        }
        Ok(Self {
            address: address.parse()?,
            name: name.to_string(),
        })
    }
}

/// A call to a public entry function.
///
/// Arguments are carried pre-serialized, one BCS blob per parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryFunction {
    pub module: ModuleId,
    pub function: String,
    pub type_args: Vec<TypeTag>,
    pub args: Vec<Vec<u8>>,
}

impl EntryFunction {
    /// Build a call from `0xADDR::module`, a function name, type args and args.
    pub fn natural(
        module: &str,
        function: &str,
        type_args: Vec<TypeTag>,
        args: Vec<Vec<u8>>,
    ) -> BlockchainResult<Self> {
        Ok(Self {
            module: module.parse()?,
            function: function.to_string(),
            type_args,
            args,
        })
    }

    /// `module::function` label for logs.
    pub fn label(&self) -> String {
        format!("{}::{}", self.module.name, self.function)
    }
}

/// Transaction payload. Only entry-function calls are ever sent; the
/// leading variants hold their wire indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TransactionPayload {
    #[serde(skip_serializing)]
    Script,
    #[serde(skip_serializing)]
    ModuleBundle,
    EntryFunction(EntryFunction),
}

impl TransactionPayload {
    pub fn label(&self) -> String {
        match self {
            TransactionPayload::EntryFunction(call) => call.label(),
            TransactionPayload::Script => "script".to_string(),
            TransactionPayload::ModuleBundle => "module_bundle".to_string(),
        }
    }
}

impl From<EntryFunction> for TransactionPayload {
    fn from(call: EntryFunction) -> Self {
        TransactionPayload::EntryFunction(call)
    }
}

/// An unsigned transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawTransaction {
    pub sender: Address,
    pub sequence_number: u64,
    pub payload: TransactionPayload,
    pub max_gas_amount: u64,
    pub gas_unit_price: u64,
    pub expiration_timestamp_secs: u64,
    pub chain_id: u8,
}

impl RawTransaction {
    /// Bytes covered by the sender's signature.
    pub fn signing_message(&self) -> BlockchainResult<Vec<u8>> {
        let mut message = Sha3_256::digest(RAW_TRANSACTION_SALT).to_vec();
        message.extend_from_slice(&bcs::to_bytes(self)?);
        Ok(message)
    }
}

/// Length-prefixed byte string, as keys and signatures travel on the wire.
fn as_byte_string<T, S>(bytes: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: AsRef<[u8]>,
    S: Serializer,
{
    serializer.serialize_bytes(bytes.as_ref())
}

/// Signature scheme wrapper; variant 0 is single-signer Ed25519.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TransactionAuthenticator {
    Ed25519 {
        #[serde(serialize_with = "as_byte_string")]
        public_key: [u8; 32],
        #[serde(serialize_with = "as_byte_string")]
        signature: [u8; 64],
    },
}

/// A raw transaction plus its authenticator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedTransaction {
    pub raw: RawTransaction,
    pub authenticator: TransactionAuthenticator,
}

impl SignedTransaction {
    /// Submission body.
    pub fn to_bytes(&self) -> BlockchainResult<Vec<u8>> {
        Ok(bcs::to_bytes(self)?)
    }
}
