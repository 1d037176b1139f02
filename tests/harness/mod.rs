// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test harness for the contact gatekeeper.
//!
//! Provides in-memory collaborators, request builders and an abuse
//! simulation toolkit for exercising the pipeline end to end.

#![allow(dead_code)]

pub mod attacks;
pub mod doubles;
pub mod generators;
