// Copyright 2026 The Prompt Relay Project
// SPDX-License-Identifier: Apache-2.0

pub mod chunker;
pub mod config;
pub mod gate;
pub mod relay;
pub mod request;
pub mod server;
pub mod sse;
pub(crate) mod stream;
pub mod upstream;
