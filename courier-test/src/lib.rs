/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */
#![forbid(unsafe_code)]

//! Testing utilities for Courier actors.
//!
//! [`courier_test`] turns an `async fn` into a test that runs on a fresh
//! multi-threaded Tokio runtime inside a `courier_test` tracing span. Panics
//! anywhere in the process during the test are logged through `tracing` and fail
//! the test, including panics inside actor tasks that the runtime would otherwise
//! contain. Tests that provoke panics on purpose should use `#[tokio::test]`.
//!
//! ```ignore
//! use courier_test::courier_test;
//!
//! #[courier_test]
//! async fn counter_counts() -> anyhow::Result<()> {
//!     let system = ActorSystem::launch().await;
//!     // ...
//!     system.shutdown().await
//! }
//! ```

pub use courier_test_macro::courier_test;

#[doc(hidden)]
pub mod __private {
    pub use parking_lot;
    pub use tokio;
    pub use tracing;
}
