//! everpay 结算服务 HTTP 客户端
//! 超时固定（默认 5s），不做本地重试；非 2xx 原样映射为 UpstreamError

use std::time::Instant;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::{
    config::ApiSettings,
    domain::{
        BalanceResponse, BalancesResponse, EverpayTransaction, EverpayTx, NetworkInfo,
        PostTxResult, TxsResult,
    },
    error::{EverpayError, Result},
};

#[async_trait]
pub trait EverpayApi: Send + Sync {
    async fn get_info(&self) -> Result<NetworkInfo>;

    async fn get_balance(
        &self,
        token_id: &str,
        chain_type: &str,
        account: &str,
    ) -> Result<BalanceResponse>;

    async fn get_balances(&self, account: &str) -> Result<BalancesResponse>;

    async fn get_transactions(&self, page: u32) -> Result<TxsResult>;

    async fn get_transactions_by_account(&self, account: &str, page: u32) -> Result<TxsResult>;

    async fn get_transaction(&self, ever_hash: &str) -> Result<EverpayTransaction>;

    async fn submit_transaction(&self, tx: &EverpayTx) -> Result<PostTxResult>;
}

#[derive(Clone)]
pub struct HttpEverpayApi {
    host: String,
    client: reqwest::Client,
}

impl HttpEverpayApi {
    pub fn new(host: impl Into<String>, settings: &ApiSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| EverpayError::invalid_config_params(format!("http client: {}", e)))?;
        Ok(Self {
            host: host.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.host, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let start = Instant::now();
        let resp = self.client.get(self.url(path)).send().await.map_err(|e| {
            tracing::warn!(path, error = %e, "everpay api request failed");
            EverpayError::from(e)
        })?;
        let value = Self::decode(resp).await?;
        tracing::debug!(path, elapsed_ms = start.elapsed().as_millis() as u64, "everpay api GET");
        Ok(value)
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(EverpayError::upstream(Some(status.as_u16()), body));
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl EverpayApi for HttpEverpayApi {
    async fn get_info(&self) -> Result<NetworkInfo> {
        self.get_json("/info").await
    }

    async fn get_balance(
        &self,
        token_id: &str,
        chain_type: &str,
        account: &str,
    ) -> Result<BalanceResponse> {
        self.get_json(&format!("/token/{}-{}/{}", token_id, chain_type, account))
            .await
    }

    async fn get_balances(&self, account: &str) -> Result<BalancesResponse> {
        self.get_json(&format!("/balance/{}", account)).await
    }

    async fn get_transactions(&self, page: u32) -> Result<TxsResult> {
        self.get_json(&format!("/txs?page={}", page)).await
    }

    async fn get_transactions_by_account(&self, account: &str, page: u32) -> Result<TxsResult> {
        self.get_json(&format!("/txs/{}?page={}", account, page))
            .await
    }

    async fn get_transaction(&self, ever_hash: &str) -> Result<EverpayTransaction> {
        #[derive(serde::Deserialize)]
        struct TxResponse {
            tx: EverpayTransaction,
        }
        let resp: TxResponse = self.get_json(&format!("/tx/{}", ever_hash)).await?;
        Ok(resp.tx)
    }

    async fn submit_transaction(&self, tx: &EverpayTx) -> Result<PostTxResult> {
        let start = Instant::now();
        let resp = self.client.post(self.url("/tx")).json(tx).send().await?;
        let result: PostTxResult = Self::decode(resp).await?;
        tracing::debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            status = %result.status,
            "everpay api POST /tx"
        );
        if result.status != "ok" {
            return Err(EverpayError::upstream(
                None,
                format!("transaction rejected: {}", serde_json::to_string(&result)?),
            ));
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::{TcpListener, TcpStream},
        task::JoinHandle,
    };

    use super::*;
    use crate::{
        domain::{ChainType, EverpayAction, EverpayTxWithoutSig},
        error::ErrorCode,
    };

    fn settings(timeout_ms: u64) -> ApiSettings {
        ApiSettings {
            api_host: None,
            timeout_ms,
            info_ttl_secs: 180,
            eth_rpc_url: "http://localhost:8545".into(),
            arweave_gateway_url: "http://localhost:1984".into(),
        }
    }

    /// 读取完整请求（头 + content-length 指定的请求体）
    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf);
            if let Some(end) = text.find("\r\n\r\n") {
                let body_len = text[..end]
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, v)| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + body_len {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// 单连接 HTTP 桩：延迟 `delay` 后返回固定响应，任务结果为收到的原始请求
    async fn serve_once(
        status: u16,
        body: &'static str,
        delay: Duration,
    ) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let host = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            tokio::time::sleep(delay).await;
            let response = format!(
                "HTTP/1.1 {} STUB\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
            request
        });
        (host, handle)
    }

    fn signed_tx() -> EverpayTx {
        EverpayTxWithoutSig {
            token_symbol: "USDT".into(),
            action: EverpayAction::Transfer,
            from: "0x26361130d5d6e798e9319114643af8c868412859".into(),
            to: "0x6451eb7f668de69fb4c943db72bcf2a73deec6b1".into(),
            amount: "5100000".into(),
            fee: "0".into(),
            fee_recipient: "0x6451eb7f668de69fb4c943db72bcf2a73deec6b1".into(),
            nonce: "1626083291203".into(),
            token_id: "0xd85476c906b5301e8e9eb58d174a6f96b9dfc5ee".into(),
            chain_type: ChainType::Ethereum,
            chain_id: "42".into(),
            data: String::new(),
            version: "v1".into(),
        }
        .with_sig("0x00")
    }

    #[test]
    fn test_urls() {
        let api = HttpEverpayApi::new("https://api-dev.everpay.io/", &settings(5_000)).unwrap();
        assert_eq!(api.host(), "https://api-dev.everpay.io");
        assert_eq!(api.url("/info"), "https://api-dev.everpay.io/info");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_upstream_error() {
        // 端口 9 (discard) 通常无监听，连接被拒绝
        let api = HttpEverpayApi::new("http://127.0.0.1:9", &settings(5_000)).unwrap();
        let err = api.get_info().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::UpstreamError);
    }

    #[tokio::test]
    async fn test_non_success_status_keeps_status_and_body() {
        let (host, server) = serve_once(500, r#"{"error":"boom"}"#, Duration::ZERO).await;
        let api = HttpEverpayApi::new(host, &settings(5_000)).unwrap();

        let err = api.get_info().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::UpstreamError);
        assert_eq!(err.status, Some(500));
        assert!(err.message.contains("boom"));
        assert!(server.await.unwrap().starts_with("GET /info "));
    }

    #[tokio::test]
    async fn test_rejected_post_is_upstream_error() {
        let (host, server) = serve_once(200, r#"{"status":"err","error":"nonce"}"#, Duration::ZERO).await;
        let api = HttpEverpayApi::new(host, &settings(5_000)).unwrap();

        let err = api.submit_transaction(&signed_tx()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::UpstreamError);
        assert!(err.message.contains("nonce"));

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /tx "));
        assert!(request.contains(r#""sig":"0x00""#));
    }

    #[tokio::test]
    async fn test_accepted_post() {
        let (host, _server) = serve_once(200, r#"{"status":"ok"}"#, Duration::ZERO).await;
        let api = HttpEverpayApi::new(host, &settings(5_000)).unwrap();
        let result = api.submit_transaction(&signed_tx()).await.unwrap();
        assert_eq!(result.status, "ok");
    }

    #[tokio::test]
    async fn test_slow_upstream_is_request_timeout() {
        let (host, _server) = serve_once(200, "{}", Duration::from_millis(500)).await;
        let api = HttpEverpayApi::new(host, &settings(50)).unwrap();

        let err = api.get_info().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::RequestTimeout);
    }

    #[tokio::test]
    async fn test_balance_path_uses_chain_list() {
        let body = r#"{"accid":"acc","balance":{"tag":"t","amount":"1","decimals":12}}"#;
        let (host, server) = serve_once(200, body, Duration::ZERO).await;
        let api = HttpEverpayApi::new(host, &settings(5_000)).unwrap();

        let resp = api
            .get_balance("AR,0xcc9141efa8c20c7df0778748255b1487957811be", "arweave,ethereum", "acc")
            .await
            .unwrap();
        assert_eq!(resp.balance.amount, "1");
        assert!(server.await.unwrap().starts_with(
            "GET /token/AR,0xcc9141efa8c20c7df0778748255b1487957811be-arweave,ethereum/acc "
        ));
    }
}
