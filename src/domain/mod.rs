//! 领域模型：链/账户类型、网络信息、交易记录

pub mod account;
pub mod network;
pub mod transaction;

pub use account::{classify_account, AccountKind, ChainType};
pub use network::{
    BalanceItem, BalanceResponse, BalancesResponse, NetworkInfo, RawBalance, Token,
};
pub use transaction::{
    ever_hash_of, ChainTxReceipt, EverpayAction, EverpayTransaction, EverpayTx,
    EverpayTxWithoutSig, PostTxResult, TransferOrWithdrawResult, TxsResult,
};
