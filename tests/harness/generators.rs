// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test data generators for abuse simulation.

use serde_json::{json, Value};
use std::net::{IpAddr, Ipv4Addr};

/// Generate a pool of client addresses for testing.
pub fn generate_ips(count: usize) -> Vec<IpAddr> {
    (0..count)
        .map(|i| {
            // Use 10.x.x.x private range
            let a = ((i >> 16) & 0xFF) as u8;
            let b = ((i >> 8) & 0xFF) as u8;
            let c = (i & 0xFF) as u8;
            IpAddr::V4(Ipv4Addr::new(10, a, b, c))
        })
        .collect()
}

/// A well-formed submission from an allow-listed provider.
pub fn valid_submission(i: usize) -> Value {
    json!({
        "name": format!("Visitor {i}"),
        "email": format!("visitor{i}@gmail.com"),
        "subject": "Quote request",
        "message": format!("Hello, I would like a quote for job #{i}."),
    })
}

/// The same submission with `email` replaced.
pub fn submission_with_email(email: &str) -> Value {
    json!({
        "name": "Visitor",
        "email": email,
        "subject": "Quote request",
        "message": "Hello",
    })
}

/// Addresses on disposable or test domains.
pub fn generate_disposable_emails(count: usize) -> Vec<String> {
    const DOMAINS: &[&str] = &[
        "test.com",
        "example.com",
        "mailinator.com",
        "yopmail.com",
        "inbox.mailinator.com",
        "TEST.COM",
    ];
    (0..count)
        .map(|i| format!("spam{}@{}", i, DOMAINS[i % DOMAINS.len()]))
        .collect()
}

/// Address values that try to smuggle extra headers or recipients.
pub fn generate_header_injection_emails() -> Vec<&'static str> {
    vec![
        "victim@gmail.com\r\nBcc: everyone@gmail.com",
        "victim@gmail.com\nCc: everyone@gmail.com",
        "victim@gmail.com%0ABcc:everyone@gmail.com",
        "victim@gmail.com,everyone@gmail.com",
        "victim@gmail.com;everyone@gmail.com",
        "Victim <victim@gmail.com>",
        "victim@gmail.com\0",
        "victim@gmail.com@evil.net",
        "\"victim\"@gmail.com",
    ]
}

/// Addresses that fail the grammar outright.
pub fn generate_malformed_emails() -> Vec<&'static str> {
    vec![
        "plainaddress",
        "@gmail.com",
        "jane@",
        "jane@gmail",
        "jane@gmail.c",
        "jane@gmail.abcdefgh",
        "jane..doe@gmail.com",
        "jane@-gmail.com",
        "jane @gmail.com",
    ]
}

/// Markup payloads that must reach the operator only as text.
pub fn generate_xss_payloads() -> Vec<&'static str> {
    vec![
        "<script>alert('x')</script>",
        "<img src=x onerror=alert(1)>",
        "\"><svg onload=alert(1)>",
        "<a href=\"javascript:alert(1)\">click</a>",
        "<iframe src=\"https://evil.net\"></iframe>",
    ]
}

/// Bodies missing at least one field.
pub fn generate_incomplete_submissions() -> Vec<Value> {
    vec![
        json!({}),
        json!({"email": "jane@gmail.com", "subject": "Quote", "message": "Hi"}),
        json!({"name": "Jane", "subject": "Quote", "message": "Hi"}),
        json!({"name": "Jane", "email": "jane@gmail.com", "message": "Hi"}),
        json!({"name": "Jane", "email": "jane@gmail.com", "subject": "Quote"}),
        json!({"name": "  ", "email": "jane@gmail.com", "subject": "Quote", "message": "Hi"}),
        json!({"name": "Jane", "email": "", "subject": "Quote", "message": "Hi"}),
        json!({"name": "Jane", "email": "jane@gmail.com", "subject": "Quote", "message": "\n\t"}),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_ips() {
        let ips = generate_ips(256);
        assert_eq!(ips.len(), 256);
        // All should be unique
        let unique: std::collections::HashSet<_> = ips.iter().collect();
        assert_eq!(unique.len(), 256);
    }

    #[test]
    fn test_disposable_emails_cycle_domains() {
        let emails = generate_disposable_emails(12);
        assert_eq!(emails.len(), 12);
        assert!(emails[0].ends_with("@test.com"));
        assert!(emails[6].ends_with("@test.com"));
    }
}
