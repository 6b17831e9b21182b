pub mod deposit;
pub mod everpay;
pub mod signer;
pub mod transaction_builder;

pub use deposit::{resolve_transfer, ArweaveTransfer, ChainTransfer, DepositTransfer, EthereumTransfer};
pub use everpay::Everpay;
pub use signer::{
    resolve_signer, verify_signature, ArweaveJwk, ArweaveSigner, ArweaveWalletExtension, ChainSigner,
    EvmSigner, SignedMessage,
};
pub use transaction_builder::{
    BalanceParams, DepositParams, EverpayTxParams, TransactionBuilder, TransferParams, WithdrawParams,
};
