// ABOUTME: Integration tests for certificate numbering, recognition awards and public validation
// ABOUTME: Validation must answer unknown, malformed and cross-site numbers identically
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::collections::HashSet;

use common::{
    create_global_signatory, create_learner, create_site_signatory, create_test_database, MAIN,
    NORTH,
};
use lms_server::errors::ErrorCode;
use lms_server::learning::CertificateIssuer;
use lms_server::models::CertificateKind;
use regex::Regex;
use uuid::Uuid;

#[tokio::test]
async fn test_recognition_numbers_follow_site_prefix_and_are_unique() {
    let database = create_test_database().await;
    let issuer = CertificateIssuer::new(database.clone());
    let signatory = create_global_signatory(&database, "Grace").await;
    let pattern = Regex::new(r"^MAIN-\d{8}-\d{3,4}$").unwrap();

    let mut numbers = HashSet::new();
    for i in 0..5 {
        let learner = create_learner(&database, MAIN, &format!("learner{i}")).await;
        let issued = issuer
            .issue_recognition(MAIN, learner.id, "Safety champion", &[signatory.id])
            .await
            .unwrap();
        assert!(issued.newly_issued);
        assert!(
            pattern.is_match(&issued.certificate_number),
            "unexpected number {}",
            issued.certificate_number
        );
        numbers.insert(issued.certificate_number);
    }
    assert_eq!(numbers.len(), 5);
    assert!(numbers.iter().any(|n| n.ends_with("-001")));
    assert!(numbers.iter().any(|n| n.ends_with("-005")));
}

#[tokio::test]
async fn test_serials_are_counted_per_prefix() {
    let database = create_test_database().await;
    let issuer = CertificateIssuer::new(database.clone());
    let signatory = create_global_signatory(&database, "Grace").await;
    let main_learner = create_learner(&database, MAIN, "ada").await;
    let north_learner = create_learner(&database, NORTH, "alan").await;

    issuer
        .issue_recognition(MAIN, main_learner.id, "Mentor", &[signatory.id])
        .await
        .unwrap();
    let north = issuer
        .issue_recognition(NORTH, north_learner.id, "Mentor", &[signatory.id])
        .await
        .unwrap();
    assert!(north.certificate_number.starts_with("NORTH-"));
    assert!(north.certificate_number.ends_with("-001"));
}

#[tokio::test]
async fn test_recognition_input_is_validated() {
    let database = create_test_database().await;
    let issuer = CertificateIssuer::new(database.clone());
    let learner = create_learner(&database, MAIN, "edsger").await;
    let global = create_global_signatory(&database, "Grace").await;
    let foreign = create_site_signatory(&database, NORTH, "Barbara").await;

    let err = issuer
        .issue_recognition(MAIN, learner.id, "   ", &[global.id])
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::MissingRequiredField);

    let err = issuer
        .issue_recognition(MAIN, learner.id, "Mentor", &[])
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);

    let err = issuer
        .issue_recognition(MAIN, learner.id, "Mentor", &[global.id, foreign.id])
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);

    let err = issuer
        .issue_recognition(MAIN, learner.id, "Mentor", &[global.id, global.id])
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);

    let err = issuer
        .issue_recognition(MAIN, Uuid::new_v4(), "Mentor", &[global.id])
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);

    // Nothing was issued by the rejected calls
    let listed = issuer.list_user_certificates(MAIN, learner.id).await.unwrap();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn test_validate_returns_signatory_snapshot() {
    let database = create_test_database().await;
    let issuer = CertificateIssuer::new(database.clone());
    let learner = create_learner(&database, MAIN, "donald").await;
    let first = create_global_signatory(&database, "Grace").await;
    let second = create_site_signatory(&database, MAIN, "Margaret").await;

    let issued = issuer
        .issue_recognition(MAIN, learner.id, "  Ten years of service  ", &[second.id, first.id])
        .await
        .unwrap();

    let details = issuer
        .validate(&format!(" {} ", issued.certificate_number), MAIN)
        .await
        .unwrap();
    assert_eq!(details.id, issued.id);
    assert_eq!(details.certificate_type, CertificateKind::Recognition);
    assert_eq!(details.reason.as_deref(), Some("Ten years of service"));
    assert_eq!(details.recipient_name, learner.display_name);
    assert!(details.course_id.is_none());
    let signers: Vec<_> = details.signatories.iter().map(|s| s.signatory_id).collect();
    assert_eq!(signers, vec![second.id, first.id]);
    assert_eq!(details.signatories[1].name, "Grace");
    assert_eq!(details.signatories[1].position, "Director");
}

#[tokio::test]
async fn test_validate_failures_are_indistinguishable() {
    let database = create_test_database().await;
    let issuer = CertificateIssuer::new(database.clone());
    let learner = create_learner(&database, MAIN, "ken").await;
    let signatory = create_global_signatory(&database, "Grace").await;
    let issued = issuer
        .issue_recognition(MAIN, learner.id, "Mentor", &[signatory.id])
        .await
        .unwrap();

    let unknown_serial = issued.certificate_number.replace("-001", "-999");
    let north_prefix = issued.certificate_number.replacen("MAIN", "NORTH", 1);
    let cases = [
        ("garbage", MAIN),
        ("", MAIN),
        (unknown_serial.as_str(), MAIN),
        (north_prefix.as_str(), MAIN),
        // Right number, asked for by another site
        (issued.certificate_number.as_str(), NORTH),
    ];

    let mut messages = HashSet::new();
    for (number, site) in cases {
        let err = issuer.validate(number, site).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ResourceNotFound, "case {number}");
        messages.insert(err.message);
    }
    assert_eq!(messages.len(), 1);

    let err = issuer
        .validate(&issued.certificate_number, lms_server::models::TenantId::new())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
}

#[tokio::test]
async fn test_list_user_certificates_is_site_scoped() {
    let database = create_test_database().await;
    let issuer = CertificateIssuer::new(database.clone());
    let learner = create_learner(&database, MAIN, "john").await;
    let signatory = create_global_signatory(&database, "Grace").await;
    issuer
        .issue_recognition(MAIN, learner.id, "Mentor", &[signatory.id])
        .await
        .unwrap();
    issuer
        .issue_recognition(MAIN, learner.id, "Trainer", &[signatory.id])
        .await
        .unwrap();

    let listed = issuer.list_user_certificates(MAIN, learner.id).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().all(|c| c.user_id == learner.id));

    let elsewhere = issuer.list_user_certificates(NORTH, learner.id).await.unwrap();
    assert!(elsewhere.is_empty());
}
