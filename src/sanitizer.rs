// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTML escaping for user text embedded in mail bodies.

use crate::validator::Submission;
use std::borrow::Cow;

/// Escape markup-significant characters. Text is never dropped.
pub fn escape_html(input: &str) -> Cow<'_, str> {
    if !input.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(input);
    }

    let mut escaped = String::with_capacity(input.len() + 16);
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            other => escaped.push(other),
        }
    }
    Cow::Owned(escaped)
}

/// Escape multi-line text and keep its line breaks visible.
pub fn escape_multiline(input: &str) -> String {
    escape_html(input)
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\n', "<br>\n")
}

/// Submission fields ready for interpolation into HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedSubmission {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl SanitizedSubmission {
    pub fn new(submission: &Submission) -> Self {
        Self {
            name: escape_html(&submission.name).into_owned(),
            email: escape_html(&submission.email).into_owned(),
            subject: escape_html(&submission.subject).into_owned(),
            message: escape_multiline(&submission.message),
        }
    }
}
