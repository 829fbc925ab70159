// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Adapters for the collaborators a run talks to: the remote data service
//! over HTTP and the task registry.

pub mod http;
pub mod registry;

pub use http::{HttpAdapter, HttpError, HttpResponse, ReqwestHttpAdapter};
pub use registry::{
    parse_catalog, FileTaskRegistry, InMemoryTaskRegistry, RegistryError, TaskRegistry,
};

#[cfg(any(test, feature = "test-support"))]
pub use http::{FakeHttpAdapter, FakeReply, HttpCall, HttpMethod};
