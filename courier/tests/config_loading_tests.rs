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
use std::fs;
use std::time::Instant;

use courier::prelude::*;
use courier_test::courier_test;
use tempfile::TempDir;

use crate::setup::actors::{Echo, EchoMessage};
use crate::setup::initialize_tracing;

mod setup;

/// The only test in this binary that touches `XDG_CONFIG_HOME`.
#[test]
fn test_load_reads_the_xdg_config_file() {
    initialize_tracing();
    let temp_dir = TempDir::new().unwrap();
    std::env::set_var("XDG_CONFIG_HOME", temp_dir.path());

    // No file yet
    assert_eq!(CourierConfig::load(), CourierConfig::default());

    let config_dir = temp_dir.path().join("courier");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(
        config_dir.join("config.toml"),
        r"
        [timeouts]
        actor_shutdown_timeout_ms = 7500

        [behavior]
        dead_letter_listener = false
        ",
    )
    .unwrap();

    let loaded = CourierConfig::load();
    assert_eq!(loaded.timeouts.actor_shutdown_timeout_ms, 7_500);
    assert_eq!(loaded.timeouts.system_shutdown_timeout_ms, 5_000);
    assert!(!loaded.behavior.dead_letter_listener);

    fs::write(config_dir.join("config.toml"), "[limits\nmailbox_capacity = 3").unwrap();
    assert_eq!(CourierConfig::load(), CourierConfig::default(), "malformed files fall back");

    temp_dir.close().unwrap();
}

#[test]
fn test_from_file_reports_missing_and_malformed_files() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("courier.toml");

    assert!(CourierConfig::from_file(&path).is_err());

    fs::write(&path, "limits = 12").unwrap();
    assert!(CourierConfig::from_file(&path).is_err());

    fs::write(&path, "[limits]\nmailbox_capacity = 12\n").unwrap();
    assert_eq!(CourierConfig::from_file(&path).unwrap().limits.mailbox_capacity, 12);
}

#[courier_test]
async fn test_configured_mailbox_capacity_is_the_default() -> anyhow::Result<()> {
    initialize_tracing();
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("courier.toml");
    fs::write(&path, "[limits]\nmailbox_capacity = 1\n")?;
    let system = ActorSystem::launch_with_config(CourierConfig::from_file(&path)?).await;

    let echo = system.create_actor("echo", Props::<Echo>::default())?;
    echo.send(EchoMessage::SayLater {
        delay_ms: 300,
        text: "busy".into(),
    })?;
    tokio::time::sleep(Duration::from_millis(50)).await;

    echo.send(EchoMessage::Ignore)?;
    assert_eq!(
        echo.send(EchoMessage::Ignore),
        Err(SendError::MailboxFull(ActorId::from("echo")))
    );

    let roomy = system.create_actor("roomy", Props::<Echo>::default().with_mailbox_capacity(4))?;
    for _ in 0..4 {
        roomy.send(EchoMessage::Ignore)?;
    }
    system.shutdown().await
}

#[courier_test]
async fn test_actor_shutdown_timeout_aborts_slow_handlers() -> anyhow::Result<()> {
    initialize_tracing();
    let config = CourierConfig::from_toml_str("[timeouts]\nactor_shutdown_timeout_ms = 100\n")?;
    let system = ActorSystem::launch_with_config(config).await;

    let echo = system.create_actor("echo", Props::<Echo>::default())?;
    echo.send(EchoMessage::SayLater {
        delay_ms: 5_000,
        text: "never".into(),
    })?;
    tokio::time::sleep(Duration::from_millis(50)).await;

    let started = Instant::now();
    assert!(system.stop_actor(&echo).await);
    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(!echo.is_alive());
    system.shutdown().await
}
