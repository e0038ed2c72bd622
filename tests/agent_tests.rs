//! End-to-end behavior of the balance, transfer, quote and swap operations
//! against an in-memory chain.

mod common;

use std::sync::Arc;

use ethers::types::{Address, H256, U256};

use common::*;
use fair_agent_mcp::blockchain::{
    encryption::EncryptionMode,
    models::{BalanceRequest, SwapRequest, SwapRoute, TransferRequest},
    AgentError,
};

fn transfer_req(token: Option<&str>, amount: Option<&str>, to: Option<&str>) -> TransferRequest {
    TransferRequest {
        chain: CHAIN.to_string(),
        token: token.map(str::to_string),
        amount: amount.map(str::to_string),
        recipient: to.map(str::to_string),
        ..Default::default()
    }
}

fn swap_req(input: &str, output: &str, amount: &str) -> SwapRequest {
    SwapRequest {
        chain: CHAIN.to_string(),
        input_token: Some(input.to_string()),
        output_token: Some(output.to_string()),
        amount: Some(amount.to_string()),
        ..Default::default()
    }
}

fn recipient_hex() -> String {
    format!("{:?}", recipient())
}

#[tokio::test]
async fn scenario_a_plain_native_transfer() {
    let gateway = Arc::new(MockGateway::new());
    let encryptor = Arc::new(MockEncryptor::new());
    let client = client(&gateway, &encryptor);

    let req = transfer_req(Some("FAIR"), Some("1.0"), Some(&recipient_hex()));
    let result = client.transfer(&req, EncryptionMode::Manual).await.unwrap();

    assert!(!result.encrypted);
    assert_eq!(result.amount, "1.0");
    assert_eq!(gateway.sent()[0].value, Some(U256::exp10(18)));
    assert_eq!(encryptor.calls(), 0);
}

#[tokio::test]
async fn scenario_b_usdc_transfer_encodes_six_decimals() {
    let usdc = token("USDC");
    let gateway = Arc::new(MockGateway::new().with_decimals(usdc, 6));
    let encryptor = Arc::new(MockEncryptor::new());
    let client = client(&gateway, &encryptor);

    let req = transfer_req(Some("USDC"), Some("100.0"), Some(&recipient_hex()));
    let result = client.transfer(&req, EncryptionMode::Manual).await.unwrap();

    let data = gateway.sent()[0].data.clone().unwrap();
    assert_eq!(U256::from_big_endian(&data[36..68]), U256::from(100_000_000u64));
    assert_eq!(result.amount, "100.0");
}

#[tokio::test]
async fn scenario_c_swap_formats_output_by_output_decimals() {
    // output token reports 18 decimals
    let gateway = Arc::new(MockGateway::new().with_amount_out(Some(U256::from(500_000_000_000_000_000u64))));
    let encryptor = Arc::new(MockEncryptor::new());
    let client = client(&gateway, &encryptor);

    let result = client
        .swap(&swap_req("FAIR", "USDC", " 1.0 "), EncryptionMode::Manual)
        .await
        .unwrap();
    assert_eq!(result.amount_in, "1.0");
    assert_eq!(result.amount_out, "0.5");
}

#[tokio::test]
async fn scenario_d_same_token_swap_fails_before_network() {
    let gateway = Arc::new(MockGateway::new());
    let encryptor = Arc::new(MockEncryptor::new());
    let client = client(&gateway, &encryptor);

    let err = client
        .swap(&swap_req("USDC", "USDC", "1"), EncryptionMode::Manual)
        .await
        .unwrap_err();
    assert!(matches!(err, AgentError::SameTokenSwap));
    assert_eq!(gateway.call_count(), 0);
}

#[tokio::test]
async fn scenario_e_excessive_slippage_fails_before_quote() {
    let gateway = Arc::new(MockGateway::new());
    let encryptor = Arc::new(MockEncryptor::new());
    let client = client(&gateway, &encryptor);

    let req = SwapRequest {
        slippage: Some(60.0),
        ..swap_req("FAIR", "USDC", "1")
    };
    let err = client.swap(&req, EncryptionMode::Manual).await.unwrap_err();
    assert!(matches!(err, AgentError::InvalidSlippage(_)));
    assert_eq!(gateway.calls_with("getAmountsOut(uint256,address[])"), 0);
}

#[tokio::test]
async fn scenario_f_zero_hash_skips_receipt_wait() {
    let gateway = Arc::new(MockGateway::new().with_reply(SendReply::ZeroHash));
    let encryptor = Arc::new(MockEncryptor::new());
    let client = client(&gateway, &encryptor);

    let req = transfer_req(Some("FAIR"), Some("1.0"), Some(&recipient_hex()));
    let err = client.transfer(&req, EncryptionMode::Manual).await.unwrap_err();
    assert!(matches!(err, AgentError::TransactionNotSubmitted));
    assert!(gateway.receipts().is_empty());
}

#[tokio::test]
async fn native_transfer_sends_value_and_waits_for_receipt() {
    let gateway = Arc::new(MockGateway::new());
    let encryptor = Arc::new(MockEncryptor::new());
    let client = client(&gateway, &encryptor);

    let req = transfer_req(Some("FAIR"), Some(" 1.5 "), Some(&recipient_hex()));
    let result = client.transfer(&req, EncryptionMode::Manual).await.unwrap();

    let sent = gateway.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(to_address(&sent[0]), Some(recipient()));
    assert_eq!(sent[0].value, Some(U256::from(15u64) * U256::exp10(17)));
    assert!(sent[0].data.is_none());
    assert_eq!(gateway.receipts(), vec![H256::from_low_u64_be(1)]);
    assert_eq!(gateway.call_count(), 0);

    assert_eq!(result.tx_hash, format!("{:?}", H256::from_low_u64_be(1)));
    assert_eq!(result.amount, "1.5");
    assert_eq!(result.token, "FAIR");
    assert_eq!(result.token_address, None);
    assert!(!result.encrypted);
    assert!(result.explorer_url.unwrap().ends_with(&format!("/tx/{}", result.tx_hash)));
}

#[tokio::test]
async fn blank_token_defaults_to_native() {
    let gateway = Arc::new(MockGateway::new());
    let encryptor = Arc::new(MockEncryptor::new());
    let client = client(&gateway, &encryptor);

    let req = transfer_req(Some("null"), Some("2"), Some(&recipient_hex()));
    let result = client.transfer(&req, EncryptionMode::Manual).await.unwrap();

    assert_eq!(result.token, "FAIR");
    assert_eq!(gateway.sent()[0].value, Some(U256::from(2u64) * U256::exp10(18)));
}

#[tokio::test]
async fn erc20_transfer_scales_by_token_decimals() {
    let usdc = token("USDC");
    let gateway = Arc::new(MockGateway::new().with_decimals(usdc, 6));
    let encryptor = Arc::new(MockEncryptor::new());
    let client = client(&gateway, &encryptor);

    let req = transfer_req(Some("USDC"), Some("10"), Some(&recipient_hex()));
    let result = client.transfer(&req, EncryptionMode::Manual).await.unwrap();

    let sent = gateway.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(to_address(&sent[0]), Some(usdc));
    assert_eq!(sent[0].value, None);
    assert_eq!(tx_selector(&sent[0]), Some(selector("transfer(address,uint256)")));
    let data = sent[0].data.as_ref().unwrap();
    assert_eq!(&data[16..36], recipient().as_bytes());
    assert_eq!(U256::from_big_endian(&data[36..68]), U256::from(10_000_000u64));
    assert_eq!(gateway.receipts().len(), 1);
    assert_eq!(result.token_address, Some(usdc));
}

#[tokio::test]
async fn transfer_validation_happens_before_any_network_call() {
    let gateway = Arc::new(MockGateway::new());
    let encryptor = Arc::new(MockEncryptor::new());
    let client = client(&gateway, &encryptor);
    let to = recipient_hex();

    let cases: Vec<(TransferRequest, &str)> = vec![
        (transfer_req(None, Some("1"), None), "MissingRecipient"),
        (transfer_req(None, Some("1"), Some("undefined")), "MissingRecipient"),
        (transfer_req(None, Some("0"), Some(&to)), "ZeroAmount"),
        (transfer_req(None, Some("-3"), Some(&to)), "NegativeAmount"),
        (transfer_req(None, Some("1e18"), Some(&to)), "InvalidAmount"),
        (transfer_req(None, None, Some(&to)), "MissingAmount"),
        (transfer_req(Some("DOGE"), Some("1"), Some(&to)), "UnsupportedToken"),
        (
            TransferRequest {
                chain: "mainnet".into(),
                ..transfer_req(None, Some("1"), Some(&to))
            },
            "UnsupportedChain",
        ),
    ];

    for (req, kind) in cases {
        let err = client.transfer(&req, EncryptionMode::Manual).await.unwrap_err();
        assert_eq!(err.kind(), kind, "{:?}", req);
        assert!(err.is_validation());
    }
    assert_eq!(gateway.call_count(), 0);
    assert!(gateway.sent().is_empty());
}

#[tokio::test]
async fn missing_or_zero_hash_is_not_submitted() {
    for reply in [SendReply::NoHash, SendReply::ZeroHash] {
        let gateway = Arc::new(MockGateway::new().with_reply(reply));
        let encryptor = Arc::new(MockEncryptor::new());
        let client = client(&gateway, &encryptor);

        let req = transfer_req(None, Some("1"), Some(&recipient_hex()));
        let err = client.transfer(&req, EncryptionMode::Manual).await.unwrap_err();
        assert!(matches!(err, AgentError::TransactionNotSubmitted), "{:?}", reply);
        assert!(gateway.receipts().is_empty());
    }
}

#[tokio::test]
async fn send_failure_surfaces_as_rpc_error() {
    let gateway = Arc::new(MockGateway::new().with_reply(SendReply::Fail));
    let encryptor = Arc::new(MockEncryptor::new());
    let client = client(&gateway, &encryptor);

    let req = transfer_req(None, Some("1"), Some(&recipient_hex()));
    let err = client.transfer(&req, EncryptionMode::Manual).await.unwrap_err();
    assert_eq!(err.kind(), "Rpc");
    assert!(!err.is_validation());
}

#[tokio::test]
async fn encryption_follows_mode_and_request_flag() {
    // (mode, requested, expect encrypted)
    let cases = [
        (EncryptionMode::Manual, false, false),
        (EncryptionMode::Manual, true, true),
        (EncryptionMode::Automatic, false, true),
        (EncryptionMode::Automatic, true, true),
    ];

    for (mode, requested, expected) in cases {
        let gateway = Arc::new(MockGateway::new());
        let encryptor = Arc::new(MockEncryptor::new());
        let client = client(&gateway, &encryptor);

        let req = TransferRequest {
            encrypt: requested,
            ..transfer_req(None, Some("1"), Some(&recipient_hex()))
        };
        let result = client.transfer(&req, mode).await.unwrap();

        assert_eq!(result.encrypted, expected, "{:?} requested={}", mode, requested);
        assert_eq!(encryptor.calls(), usize::from(expected));
        let dest = to_address(&gateway.sent()[0]);
        if expected {
            assert_eq!(dest, Some(encrypted_destination()));
        } else {
            assert_eq!(dest, Some(recipient()));
        }
    }
}

#[tokio::test]
async fn encryption_failure_sends_nothing() {
    let gateway = Arc::new(MockGateway::new());
    let encryptor = Arc::new(MockEncryptor::failing());
    let client = client(&gateway, &encryptor);

    let req = TransferRequest {
        encrypt: true,
        ..transfer_req(None, Some("1"), Some(&recipient_hex()))
    };
    let err = client.transfer(&req, EncryptionMode::Manual).await.unwrap_err();

    assert!(matches!(err, AgentError::EncryptionFailed(_)));
    assert!(gateway.sent().is_empty());
}

#[tokio::test]
async fn native_balance_of_own_account() {
    let gateway = Arc::new(MockGateway::new().with_native_balance(U256::from(15u64) * U256::exp10(17)));
    let encryptor = Arc::new(MockEncryptor::new());
    let client = client(&gateway, &encryptor);

    let req = BalanceRequest {
        chain: CHAIN.into(),
        address: None,
        token: None,
    };
    let balance = client.get_balance(&req).await.unwrap();

    assert_eq!(balance.amount, "1.5");
    assert_eq!(balance.token, "FAIR");
    assert_eq!(balance.address, format!("{:?}", own_account()));
}

#[tokio::test]
async fn token_balance_uses_token_decimals() {
    let usdc = token("USDC");
    let gateway = Arc::new(
        MockGateway::new()
            .with_decimals(usdc, 6)
            .with_token_balance(usdc, U256::from(1_234_500u64)),
    );
    let encryptor = Arc::new(MockEncryptor::new());
    let client = client(&gateway, &encryptor);

    let req = BalanceRequest {
        chain: CHAIN.into(),
        address: Some(recipient_hex()),
        token: Some("USDC".into()),
    };
    let balance = client.get_balance(&req).await.unwrap();

    assert_eq!(balance.amount, "1.2345");
    assert_eq!(balance.address, recipient_hex());
    assert_eq!(gateway.calls_with("balanceOf(address)"), 1);
}

#[tokio::test]
async fn token_with_unusable_decimals_is_rejected() {
    let odd = Address::repeat_byte(0x77);
    let gateway = Arc::new(
        MockGateway::new()
            .with_decimals(odd, 80)
            .with_token_balance(odd, U256::from(5u64)),
    );
    let encryptor = Arc::new(MockEncryptor::new());
    let client = client(&gateway, &encryptor);
    let odd_hex = format!("{:?}", odd);

    let req = BalanceRequest {
        chain: CHAIN.into(),
        address: None,
        token: Some(odd_hex.clone()),
    };
    let err = client.get_balance(&req).await.unwrap_err();
    assert_eq!(err.kind(), "Rpc");

    let req = transfer_req(Some(&odd_hex), Some("1"), Some(&recipient_hex()));
    let err = client.transfer(&req, EncryptionMode::Manual).await.unwrap_err();
    assert_eq!(err.kind(), "Rpc");
    assert!(gateway.sent().is_empty());
}

#[tokio::test]
async fn symbol_in_address_slot_reads_own_wallet() {
    let gateway = Arc::new(MockGateway::new());
    let encryptor = Arc::new(MockEncryptor::new());
    let client = client(&gateway, &encryptor);

    let req = BalanceRequest {
        chain: CHAIN.into(),
        address: Some("usdc".into()),
        token: None,
    };
    let balance = client.get_balance(&req).await.unwrap();
    assert_eq!(balance.address, format!("{:?}", own_account()));
    assert_eq!(balance.amount, "0.0");
}

#[tokio::test]
async fn native_input_swap_sends_value_without_approval() {
    let usdc = token("USDC");
    let gateway = Arc::new(MockGateway::new().with_decimals(usdc, 6));
    let encryptor = Arc::new(MockEncryptor::new());
    let client = client(&gateway, &encryptor);

    let result = client
        .swap(&swap_req("FAIR", "USDC", "1"), EncryptionMode::Manual)
        .await
        .unwrap();

    assert_eq!(result.route, SwapRoute::ExactNativeForTokens);
    assert_eq!(result.amount_out, "1.0");
    assert_eq!(result.amount_out_min, "0.995");
    assert!(result.approval_tx_hash.is_none());
    assert_eq!(gateway.calls_with("allowance(address,address)"), 0);

    let sent = gateway.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(to_address(&sent[0]), Some(router()));
    assert_eq!(sent[0].value, Some(U256::exp10(18)));
    assert_eq!(
        tx_selector(&sent[0]),
        Some(selector("swapExactETHForTokens(uint256,address[],address,uint256)"))
    );
    assert_eq!(gateway.receipts().len(), 1);
}

#[tokio::test]
async fn token_input_swap_approves_once() {
    let usdc = token("USDC");
    let gateway = Arc::new(
        MockGateway::new()
            .with_decimals(usdc, 6)
            .with_amount_out(Some(U256::from(2u64) * U256::exp10(18))),
    );
    let encryptor = Arc::new(MockEncryptor::new());
    let client = client(&gateway, &encryptor);
    let req = swap_req("USDC", "FAIR", "5");

    let first = client.swap(&req, EncryptionMode::Manual).await.unwrap();
    assert_eq!(first.route, SwapRoute::ExactTokensForNative);
    assert_eq!(first.amount_out, "2.0");
    assert_eq!(first.amount_out_min, "1.99");

    let sent = gateway.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(to_address(&sent[0]), Some(usdc));
    assert_eq!(tx_selector(&sent[0]), Some(selector("approve(address,uint256)")));
    let approve = sent[0].data.as_ref().unwrap();
    assert_eq!(&approve[16..36], router().as_bytes());
    assert_eq!(U256::from_big_endian(&approve[36..68]), U256::from(5_000_000u64));
    assert_eq!(first.approval_tx_hash, Some(format!("{:?}", H256::from_low_u64_be(1))));

    assert_eq!(to_address(&sent[1]), Some(router()));
    assert_eq!(sent[1].value, None);
    assert_eq!(
        tx_selector(&sent[1]),
        Some(selector("swapExactTokensForETH(uint256,uint256,address[],address,uint256)"))
    );
    // approval and swap both confirmed
    assert_eq!(gateway.receipts().len(), 2);

    // allowance now covers the amount: no second approve
    let second = client.swap(&req, EncryptionMode::Manual).await.unwrap();
    assert!(second.approval_tx_hash.is_none());
    assert_eq!(gateway.sent().len(), 3);
}

#[tokio::test]
async fn token_to_token_swap_with_existing_allowance() {
    let usdc = token("USDC");
    let usdt = token("USDT");
    let gateway = Arc::new(
        MockGateway::new()
            .with_decimals(usdc, 6)
            .with_decimals(usdt, 6)
            .with_allowance(usdc, U256::MAX),
    );
    let encryptor = Arc::new(MockEncryptor::new());
    let client = client(&gateway, &encryptor);

    let req = SwapRequest {
        slippage: Some(1.0),
        ..swap_req("USDC", "USDT", "1")
    };
    let result = client.swap(&req, EncryptionMode::Manual).await.unwrap();

    assert_eq!(result.route, SwapRoute::ExactTokensForTokens);
    assert_eq!(result.amount_out_min, "0.99");
    let sent = gateway.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(
        tx_selector(&sent[0]),
        Some(selector("swapExactTokensForTokens(uint256,uint256,address[],address,uint256)"))
    );
}

#[tokio::test]
async fn encrypted_swap_encrypts_approval_and_swap() {
    let usdc = token("USDC");
    let gateway = Arc::new(MockGateway::new().with_decimals(usdc, 6));
    let encryptor = Arc::new(MockEncryptor::new());
    let client = client(&gateway, &encryptor);

    let result = client
        .swap(&swap_req("USDC", "FAIR", "5"), EncryptionMode::Automatic)
        .await
        .unwrap();

    assert!(result.encrypted);
    assert_eq!(encryptor.calls(), 2);
    for tx in gateway.sent() {
        assert_eq!(to_address(&tx), Some(encrypted_destination()));
    }
}

#[tokio::test]
async fn quote_matches_swap_pricing_without_sending() {
    let usdc = token("USDC");
    let gateway = Arc::new(MockGateway::new().with_decimals(usdc, 6));
    let encryptor = Arc::new(MockEncryptor::new());
    let client = client(&gateway, &encryptor);

    let quote = client.quote(&swap_req("FAIR", "USDC", "1")).await.unwrap();

    assert_eq!(quote.route, SwapRoute::ExactNativeForTokens);
    assert_eq!(quote.amount_in, "1");
    assert_eq!(quote.amount_out, "1.0");
    assert_eq!(quote.amount_out_min, "0.995");
    assert_eq!(quote.slippage, 0.5);
    assert!(!quote.approval_required);
    assert!(gateway.sent().is_empty());
}

#[tokio::test]
async fn quote_reports_pending_approval_for_token_input() {
    let usdc = token("USDC");
    let gateway = Arc::new(MockGateway::new().with_decimals(usdc, 6));
    let encryptor = Arc::new(MockEncryptor::new());
    let client = client(&gateway, &encryptor);
    let req = swap_req("USDC", "FAIR", "5");

    assert!(client.quote(&req).await.unwrap().approval_required);

    client.swap(&req, EncryptionMode::Manual).await.unwrap();
    assert!(!client.quote(&req).await.unwrap().approval_required);
}

#[tokio::test]
async fn swap_validation_happens_before_any_network_call() {
    let gateway = Arc::new(MockGateway::new());
    let encryptor = Arc::new(MockEncryptor::new());
    let client = client(&gateway, &encryptor);

    let cases: Vec<(SwapRequest, &str)> = vec![
        (SwapRequest { input_token: None, ..swap_req("", "USDC", "1") }, "MissingToken"),
        (swap_req("USDC", "null", "1"), "MissingToken"),
        (swap_req("USDC", "usdc", "1"), "SameTokenSwap"),
        (swap_req("FAIR", "WFAIR", "1"), "SameTokenSwap"),
        (swap_req("FAIR", "native", "1"), "NativeToNativeSwap"),
        (swap_req("FAIR", "USDC", "0"), "ZeroAmount"),
        (SwapRequest { amount: None, ..swap_req("FAIR", "USDC", "1") }, "MissingAmount"),
        (SwapRequest { slippage: Some(60.0), ..swap_req("FAIR", "USDC", "1") }, "InvalidSlippage"),
        (swap_req("FAIR", "DOGE", "1"), "UnsupportedToken"),
    ];

    for (req, kind) in cases {
        let err = client.quote(&req).await.unwrap_err();
        assert_eq!(err.kind(), kind, "{:?}", req);
        let err = client.swap(&req, EncryptionMode::Manual).await.unwrap_err();
        assert_eq!(err.kind(), kind, "{:?}", req);
    }
    assert_eq!(gateway.call_count(), 0);
    assert!(gateway.sent().is_empty());
}

#[tokio::test]
async fn reverted_quote_is_quote_unavailable() {
    let usdc = token("USDC");
    let gateway = Arc::new(MockGateway::new().with_decimals(usdc, 6).with_amount_out(None));
    let encryptor = Arc::new(MockEncryptor::new());
    let client = client(&gateway, &encryptor);

    let err = client
        .swap(&swap_req("FAIR", "USDC", "1"), EncryptionMode::Manual)
        .await
        .unwrap_err();

    match err {
        AgentError::QuoteUnavailable { reason, .. } => assert_eq!(reason, "no liquidity for this token pair"),
        other => panic!("expected QuoteUnavailable, got {:?}", other),
    }
    assert!(gateway.sent().is_empty());
}

#[tokio::test]
async fn swap_without_hash_is_swap_not_submitted() {
    let usdc = token("USDC");
    let gateway = Arc::new(MockGateway::new().with_decimals(usdc, 6).with_reply(SendReply::NoHash));
    let encryptor = Arc::new(MockEncryptor::new());
    let client = client(&gateway, &encryptor);

    let err = client
        .swap(&swap_req("FAIR", "USDC", "1"), EncryptionMode::Manual)
        .await
        .unwrap_err();
    assert!(matches!(err, AgentError::SwapNotSubmitted));
    assert!(gateway.receipts().is_empty());
}
