//! Redsys response code descriptions
//!
//! Pure lookup data: the descriptions annotate `GatewayDenied` errors for
//! operators and never influence control flow. Codes 0-99 and 900 are
//! authorised and therefore never looked up here.

const RESPONSE_DESCRIPTIONS: &[(i64, &str)] = &[
    (101, "Card expired"),
    (102, "Card blocked temporarily or under suspicion of fraud"),
    (104, "Operation not allowed for this card or terminal"),
    (106, "PIN attempts exceeded"),
    (107, "Contact the card issuer"),
    (109, "Invalid merchant or terminal identification"),
    (110, "Invalid amount"),
    (114, "Operation not allowed for this card type"),
    (116, "Insufficient funds"),
    (118, "Card not registered"),
    (125, "Invalid card"),
    (129, "Wrong CVV2/CVC2 code"),
    (167, "Contact the card issuer: suspected fraud"),
    (180, "Card out of service"),
    (184, "Error authenticating the cardholder"),
    (190, "Denied with no specific reason"),
    (191, "Wrong expiry date"),
    (202, "Card blocked under suspicion of fraud, withdrawal requested"),
    (904, "Merchant not registered with the FUC"),
    (909, "System error"),
    (912, "Issuer not available"),
    (913, "Duplicated order"),
    (944, "Wrong session"),
    (950, "Refund not allowed"),
    (9064, "Wrong number of card digits"),
    (9078, "Operation type not allowed for this card"),
    (9093, "Card does not exist"),
    (9094, "Rejected by the international servers"),
    (9104, "Merchant with secure cardholder and cardholder without secure purchase key"),
    (9253, "Card fails the check-digit validation"),
    (9261, "Operation exceeds the card limit"),
    (9915, "Payment cancelled by the user"),
    (9929, "Preauthorization annulled by the merchant"),
    (9997, "Another transaction is being processed with the same card"),
    (9998, "Card in process"),
    (9999, "Card redirected to authentication"),
];

/// Human-readable description for a denied response code.
pub fn describe_response(code: i64) -> &'static str {
    RESPONSE_DESCRIPTIONS
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, description)| *description)
        .unwrap_or("unknown")
}
