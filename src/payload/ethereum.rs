//! Legacy Ethereum transaction summary.
//!
//! Only what is needed to show the user what they sign: a legacy
//! (pre-EIP-2718) transaction list of 6 or 9 items. Parsing goes through
//! the `rlp` crate, which rejects non-canonical integers and lengths.

use rlp::{Decodable, DecoderError, Rlp};
use serde::Serialize;

use crate::error::{Result, ScanError};

fn invalid(msg: impl Into<String>) -> ScanError {
    ScanError::InvalidTransaction(msg.into())
}

fn field<T: Decodable>(list: &Rlp<'_>, index: usize, name: &str) -> Result<T> {
    list.at(index)
        .and_then(|item| item.as_val::<T>())
        .map_err(|e| invalid(format!("{}: {}", name, e)))
}

fn bytes_field(list: &Rlp<'_>, index: usize, name: &str) -> Result<Vec<u8>> {
    field::<Vec<u8>>(list, index, name)
}

fn decoder_error(e: DecoderError) -> ScanError {
    invalid(e.to_string())
}

/// Summary of a legacy Ethereum transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EthereumTransaction {
    /// Sender nonce.
    pub nonce: u64,
    /// Gas price in wei.
    pub gas_price: u128,
    /// Gas limit.
    pub gas: u64,
    /// Recipient as 40 lowercase hex digits; `None` for contract creation.
    pub to: Option<String>,
    /// Value in wei.
    pub value: u128,
    /// Call data, hex-encoded.
    pub data: String,
    /// EIP-155 chain id, when present.
    pub chain_id: Option<u64>,
}

impl EthereumTransaction {
    /// Parse an RLP-encoded legacy transaction.
    ///
    /// # Example
    ///
    /// ```
    /// use uos_scanner::payload::EthereumTransaction;
    ///
    /// // [nonce=9, gasPrice=20 gwei, gas=21000, to, value=1 ether, data="", chainId=1, 0, 0]
    /// let rlp = hex::decode(
    ///     "ec098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a764000080018080",
    /// ).unwrap();
    /// let tx = EthereumTransaction::from_rlp(&rlp).unwrap();
    /// assert_eq!(tx.nonce, 9);
    /// assert_eq!(tx.chain_id, Some(1));
    /// ```
    pub fn from_rlp(bytes: &[u8]) -> Result<Self> {
        match bytes.first() {
            None => return Err(invalid("empty input")),
            Some(&first) if first <= 0x7f => {
                return Err(invalid("typed transactions are not supported"))
            }
            Some(_) => {}
        }

        let list = Rlp::new(bytes);
        if !list.is_list() {
            return Err(invalid("transaction is not a list"));
        }
        let info = list.payload_info().map_err(decoder_error)?;
        let encoded_len = info.header_len + info.value_len;
        if encoded_len != bytes.len() {
            return Err(invalid(format!(
                "list spans {} bytes, input has {}",
                encoded_len,
                bytes.len()
            )));
        }

        let count = list.item_count().map_err(decoder_error)?;
        if count != 6 && count != 9 {
            return Err(invalid(format!("expected 6 or 9 fields, got {}", count)));
        }

        let to = bytes_field(&list, 3, "to")?;
        let to = match to.len() {
            0 => None,
            20 => Some(hex::encode(to)),
            n => return Err(invalid(format!("recipient is {} bytes", n))),
        };

        let chain_id = if count == 9 {
            Some(field::<u64>(&list, 6, "chainId")?)
        } else {
            None
        };

        Ok(Self {
            nonce: field(&list, 0, "nonce")?,
            gas_price: field(&list, 1, "gasPrice")?,
            gas: field(&list, 2, "gas")?,
            to,
            value: field(&list, 4, "value")?,
            data: hex::encode(bytes_field(&list, 5, "data")?),
            chain_id,
        })
    }
}
