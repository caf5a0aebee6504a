//! End-to-end gateway verification tests
//!
//! Exercise the public API the way an embedding application would: build
//! the redirect fields for a request, then feed a gateway-shaped
//! notification back through the same provider. The PayPal round-trip is
//! stubbed so no test touches the network.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use pasarela_backend::payments::crypto;
use pasarela_backend::payments::providers::paypal::{PaypalConfig, PaypalProvider};
use pasarela_backend::payments::providers::redsys::{
    RedsysConfig, RedsysProvider, SIGNATURE_VERSION,
};
use pasarela_backend::payments::providers::redsys_sha1::{RedsysSha1Config, RedsysSha1Provider};
use pasarela_backend::payments::transport::{IpnTransport, PostResponse};
use pasarela_backend::payments::{
    FeePolicy, NotificationPayload, PaymentError, PaymentGateway, PaymentOutcome, PaymentRequest,
    PaymentResult, TransactionStore,
};

struct StubTransport {
    body: &'static str,
    calls: Mutex<usize>,
}

impl StubTransport {
    fn returning(body: &'static str) -> Arc<Self> {
        Arc::new(Self {
            body,
            calls: Mutex::new(0),
        })
    }

    fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl IpnTransport for StubTransport {
    async fn post(&self, _url: &str, _fields: &[(String, String)]) -> PaymentResult<PostResponse> {
        *self.calls.lock().unwrap() += 1;
        Ok(PostResponse {
            status: 200,
            body: self.body.to_string(),
        })
    }
}

struct MemoryStore {
    seen: Mutex<HashSet<String>>,
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn exists(&self, txn_id: &str) -> bool {
        self.seen.lock().unwrap().contains(txn_id)
    }

    async fn store(&self, txn_id: &str) {
        self.seen.lock().unwrap().insert(txn_id.to_string());
    }
}

fn request() -> PaymentRequest {
    PaymentRequest {
        description: Some("Annual subscription".to_string()),
        success_url: "https://shop.example/ok".to_string(),
        error_url: "https://shop.example/ko".to_string(),
        notify_url: "https://shop.example/notify".to_string(),
        ..PaymentRequest::new(25.50, "EUR", "981")
    }
}

fn redsys_secret() -> String {
    BASE64.encode(b"0123456789abcdef01234567")
}

#[tokio::test]
async fn paypal_full_cycle_with_duplicate_guard() {
    let transport = StubTransport::returning("VERIFIED");
    let store = Arc::new(MemoryStore {
        seen: Mutex::new(HashSet::new()),
    });
    let provider = PaypalProvider::new(PaypalConfig {
        business: "merchant@shop.example".to_string(),
        ..PaypalConfig::default()
    })
    .unwrap()
    .with_transport(transport.clone())
    .with_transaction_store(store);

    let request = request();
    let fields = provider.build_fields(&request).unwrap();
    assert!(fields.contains(&("amount".to_string(), "25.50".to_string())));
    assert!(fields.contains(&("custom".to_string(), "981".to_string())));

    let payload = NotificationPayload::from_pairs([
        ("receiver_email", "merchant@shop.example"),
        ("payment_status", "Completed"),
        ("mc_gross", "25.50"),
        ("mc_currency", "EUR"),
        ("mc_fee", "1.19"),
        ("txn_id", "8XY12345AB678901C"),
    ]);

    let outcome = provider
        .verify_notification(&request, &payload)
        .await
        .unwrap();
    assert_eq!(outcome, PaymentOutcome::Confirmed { fee: 1.19 });
    assert_eq!(transport.calls(), 1);

    // Redelivery of the same notification is caught by the store
    let err = provider
        .verify_notification(&request, &payload)
        .await
        .unwrap_err();
    assert!(matches!(err, PaymentError::DuplicateTransaction { .. }));
}

#[tokio::test]
async fn paypal_invalid_echo_is_rejected() {
    let transport = StubTransport::returning("INVALID");
    let provider = PaypalProvider::new(PaypalConfig {
        business: "merchant@shop.example".to_string(),
        ..PaypalConfig::default()
    })
    .unwrap()
    .with_transport(transport);

    let request = request();
    let payload = NotificationPayload::from_pairs([
        ("receiver_email", "merchant@shop.example"),
        ("payment_status", "Completed"),
        ("mc_gross", "25.50"),
        ("mc_currency", "EUR"),
    ]);

    let err = provider
        .verify_notification(&request, &payload)
        .await
        .unwrap_err();
    assert!(matches!(err, PaymentError::GatewayRejected { .. }));
}

#[tokio::test]
async fn redsys_fields_round_trip_through_verification() {
    let provider = RedsysProvider::new(RedsysConfig {
        merchant_code: "999008881".to_string(),
        secret_key: redsys_secret(),
        fee: Some(FeePolicy::FlatPercentage(0.019)),
        ..RedsysConfig::default()
    });

    let request = request();
    let fields = provider.build_fields(&request).unwrap();
    let field = |name: &str| {
        fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
            .unwrap()
    };
    assert_eq!(field("Ds_SignatureVersion"), SIGNATURE_VERSION);

    // Shape the notification the way the virtual POS answers: same envelope,
    // amount in minor units, authorised response code.
    let notification_json = r#"{"Ds_Amount":"2550","Ds_Order":"0981","Ds_Currency":"978","Ds_Response":"0000","Ds_TransactionType":"0"}"#;
    let params = BASE64.encode(notification_json);
    let signature = crypto::redsys_signature(&redsys_secret(), "0981", &params).unwrap();
    let payload = NotificationPayload::from_pairs([
        ("Ds_MerchantParameters", params),
        ("Ds_Signature", signature),
    ]);

    let outcome = provider
        .verify_notification(&request, &payload)
        .await
        .unwrap();
    // 25.50 * 0.019 = 0.4845, ceiling-rounded to cents
    assert_eq!(outcome, PaymentOutcome::Confirmed { fee: 0.49 });
}

#[tokio::test]
async fn redsys_legacy_round_trip() {
    let provider = RedsysSha1Provider::new(RedsysSha1Config {
        merchant_code: "999008881".to_string(),
        secret_key: "qwertyasdf0123456789".to_string(),
        ..RedsysSha1Config::default()
    });

    let request = request();
    let fields = provider.build_fields(&request).unwrap();
    assert!(fields.contains(&("Ds_Merchant_Amount".to_string(), "2550".to_string())));

    // Legacy notification signature: amount+order+merchant+currency+response+secret
    let expected = crypto::sha1_hex_upper(&format!(
        "{}{}{}{}{}{}",
        "2550", "0981", "999008881", "978", "900", "qwertyasdf0123456789"
    ));
    let payload = NotificationPayload::from_pairs([
        ("Ds_Amount", "2550".to_string()),
        ("Ds_Order", "0981".to_string()),
        ("Ds_Currency", "978".to_string()),
        ("Ds_Response", "900".to_string()),
        ("Ds_Signature", expected),
    ]);

    let outcome = provider
        .verify_notification(&request, &payload)
        .await
        .unwrap();
    assert_eq!(outcome, PaymentOutcome::Confirmed { fee: 0.0 });
}
