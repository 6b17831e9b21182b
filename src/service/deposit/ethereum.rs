//! EVM 充值：原生 ETH 转账或 ERC-20 transfer 调用

use std::str::FromStr;

use async_trait::async_trait;
use ethers::{
    abi::{self, Token as AbiToken},
    middleware::SignerMiddleware,
    providers::{Http, Middleware, Provider},
    signers::{LocalWallet, Signer},
    types::{Address, Bytes, TransactionRequest, U256},
};

use super::{ChainTransfer, DepositTransfer};
use crate::{
    domain::{ChainTxReceipt, ChainType},
    error::{EverpayError, Result},
};

/// `transfer(address,uint256)` 函数选择器
const ERC20_TRANSFER_SELECTOR: [u8; 4] = [0xa9, 0x05, 0x9c, 0xbb];

pub struct EthereumTransfer {
    wallet: LocalWallet,
    rpc_url: String,
}

impl EthereumTransfer {
    pub fn new(wallet: LocalWallet, rpc_url: String) -> Self {
        Self { wallet, rpc_url }
    }

    fn build_request(request: &DepositTransfer) -> Result<TransactionRequest> {
        let to = parse_address(&request.to)?;
        if request.symbol.eq_ignore_ascii_case("ETH") {
            return Ok(TransactionRequest::new().to(to).value(request.value));
        }

        let token_address = request
            .token
            .address_on(ChainType::Ethereum)
            .ok_or_else(|| {
                EverpayError::chain_not_supported(format!(
                    "{} has no ethereum address",
                    request.token.symbol
                ))
            })?;
        let contract = parse_address(token_address)?;
        Ok(TransactionRequest::new()
            .to(contract)
            .data(erc20_transfer_calldata(to, request.value)))
    }
}

fn parse_address(address: &str) -> Result<Address> {
    Address::from_str(address)
        .map_err(|e| EverpayError::invalid_account_type(format!("invalid address {}: {}", address, e)))
}

pub fn erc20_transfer_calldata(to: Address, value: U256) -> Bytes {
    let mut data = ERC20_TRANSFER_SELECTOR.to_vec();
    data.extend(abi::encode(&[AbiToken::Address(to), AbiToken::Uint(value)]));
    data.into()
}

#[async_trait]
impl ChainTransfer for EthereumTransfer {
    fn chain_type(&self) -> ChainType {
        ChainType::Ethereum
    }

    async fn transfer(&self, request: &DepositTransfer) -> Result<ChainTxReceipt> {
        let chain_id: u64 = request.chain_id.parse().map_err(|_| {
            EverpayError::chain_not_supported(format!("invalid ethereum chain id: {}", request.chain_id))
        })?;
        let tx = Self::build_request(request)?;

        let provider = Provider::<Http>::try_from(self.rpc_url.as_str())
            .map_err(|e| EverpayError::invalid_config_params(format!("invalid rpc url: {}", e)))?;
        let client = SignerMiddleware::new(provider, self.wallet.clone().with_chain_id(chain_id));

        let pending = client
            .send_transaction(tx, None)
            .await
            .map_err(|e| EverpayError::upstream(None, format!("ethereum transfer failed: {}", e)))?;
        let tx_hash = format!("{:?}", pending.tx_hash());

        tracing::info!(
            symbol = %request.symbol,
            from = %request.from,
            to = %request.to,
            tx_hash = %tx_hash,
            "ethereum deposit sent"
        );
        Ok(ChainTxReceipt {
            chain_type: ChainType::Ethereum,
            tx_hash,
        })
    }
}
